//! Personal radio
//!
//! While active, recommendations from a [`RadioSource`](cadence_core::RadioSource)
//! decide what plays and the queue engine's ordering is bypassed.

use cadence_core::TrackId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Radio is refilled once this many tracks or fewer are left
const REFILL_THRESHOLD: usize = 1;

/// Observable radio state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioState {
    pub active: bool,
    pub current: Option<TrackId>,
    pub next: Option<TrackId>,
}

/// Recommendation buffer for radio mode
#[derive(Debug, Default)]
pub struct PersonalRadio {
    active: bool,
    current: Option<TrackId>,
    upcoming: VecDeque<TrackId>,
    refill_in_flight: bool,
}

impl PersonalRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enter radio mode with an empty buffer
    pub fn activate(&mut self) {
        self.active = true;
        self.current = None;
        self.upcoming.clear();
    }

    /// Leave radio mode
    pub fn deactivate(&mut self) {
        self.active = false;
        self.current = None;
        self.upcoming.clear();
        self.refill_in_flight = false;
    }

    /// Add a batch of recommendations, skipping ones already buffered
    pub fn absorb(&mut self, batch: Vec<TrackId>) {
        self.refill_in_flight = false;
        for id in batch {
            if self.current.as_ref() != Some(&id) && !self.upcoming.contains(&id) {
                self.upcoming.push_back(id);
            }
        }
    }

    /// Move to the next recommendation
    pub fn advance(&mut self) -> Option<TrackId> {
        let next = self.upcoming.pop_front()?;
        self.current = Some(next.clone());
        Some(next)
    }

    /// Whether a refill should be requested now
    pub fn needs_refill(&self) -> bool {
        self.active && !self.refill_in_flight && self.upcoming.len() <= REFILL_THRESHOLD
    }

    pub fn mark_refilling(&mut self) {
        self.refill_in_flight = true;
    }

    /// A refill failed; allow another attempt later
    pub fn refill_failed(&mut self) {
        self.refill_in_flight = false;
    }

    pub fn state(&self) -> RadioState {
        RadioState {
            active: self.active,
            current: self.current.clone(),
            next: self.upcoming.front().cloned(),
        }
    }
}
