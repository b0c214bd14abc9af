//! Saved player session
//!
//! Everything needed to put the player back where it was between runs:
//! queue orders and indices, the play-next list, ordering settings, volume
//! and the last track. Stored as JSON by the front-end.

use crate::error::{PlayerError, Result};
use crate::queue::QueueEngine;
use cadence_core::TrackMetadata;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub queue: QueueEngine,
    pub volume: f32,
    pub current_track: Option<TrackMetadata>,
    pub progress_secs: f64,
}

impl SavedSession {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| PlayerError::invalid_argument(format!("cannot serialize session: {e}")))
    }

    /// Parse a session, repairing a queue whose orders no longer agree
    pub fn from_json(json: &str) -> Result<Self> {
        let mut session: Self = serde_json::from_str(json)
            .map_err(|e| PlayerError::invalid_argument(format!("invalid session: {e}")))?;
        session.queue.repair();
        if !session.volume.is_finite() {
            session.volume = 1.0;
        }
        session.volume = session.volume.clamp(0.0, 1.0);
        Ok(session)
    }
}
