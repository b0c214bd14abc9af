//! Player events and snapshots
//!
//! Observers get two views of the player:
//! - [`PlayerSnapshot`]: the full derived state, republished after every
//!   command, device event and completed operation
//! - [`PlayerEvent`]: discrete notifications for things that happened
//!   (track switched, queue ran out, device went away)

use crate::radio::RadioState;
use crate::types::{PlayerState, TransportState};
use cadence_core::{PlaybackContext, TrackId, TrackMetadata};
use serde::{Deserialize, Serialize};

/// Events emitted by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Facade state changed
    StateChanged {
        /// The new state
        state: PlayerState,
    },

    /// The current track changed
    ///
    /// Emitted when a switch resolves its metadata, and when the device
    /// reports a different sounding track.
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// The device reached the end of a track
    TrackEnded {
        track_id: TrackId,
    },

    /// Nothing left to play in the current direction
    EndOfQueue,

    /// A fallback pass found no playable track
    QueueExhausted,

    DeviceReady {
        device_id: String,
    },

    DeviceOffline {
        device_id: String,
    },

    /// A failure the user was notified about
    Error {
        /// Error message
        message: String,
    },
}

/// Derived, read-only player state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub state: PlayerState,
    pub transport: TransportState,
    pub current_track: Option<TrackMetadata>,
    pub device_id: Option<String>,

    /// Active play order
    pub queue: Vec<TrackId>,

    /// Index into `queue`, `None` while it is empty
    pub current_index: Option<usize>,

    /// Pending play-next tracks, next first
    pub play_next: Vec<TrackId>,

    /// What `next_track` would play
    pub up_next: Option<TrackId>,

    pub context: PlaybackContext,
    pub radio: RadioState,

    /// Fetches, loads and device commands still in flight
    pub pending_operations: usize,
}

impl PlayerSnapshot {
    /// Id of the current track, if any
    pub fn current_track_id(&self) -> Option<&TrackId> {
        self.current_track.as_ref().map(|track| &track.id)
    }

    /// Whether the player has nothing left to settle
    pub fn is_idle(&self) -> bool {
        self.pending_operations == 0 && self.state != PlayerState::Loading
    }
}
