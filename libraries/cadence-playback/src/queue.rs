//! Queue engine
//!
//! Owns the play order:
//! - Linear list: tracks in the order the context supplied them
//! - Shuffled list: a permutation of the linear list, used while shuffle is on
//! - Play-next list: user interrupts consumed before either list resumes
//!
//! ```text
//! Play next:   [B, C]            consumed first, FIFO
//! ─────────────────────────────
//! Active list: [D, E, *F*, G]    linear or shuffled, `*` = current index
//! ```
//!
//! Both lists always hold the same multiset of ids. Callers only ever see the
//! active order; the inactive index is kept pointing at the same track so a
//! shuffle toggle never loses the current position.

use crate::error::{PlayerError, Result};
use crate::shuffle::shuffled_with_first;
use crate::types::RepeatMode;
use cadence_core::{PlaybackContext, TrackId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Where a resolved track comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueuePosition {
    /// Taken from the play-next list; the list index does not move
    PlayNext,

    /// Index into the active list
    Index(usize),
}

/// A track chosen by the queue engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: TrackId,
    pub position: QueuePosition,
}

impl QueueEntry {
    fn at(id: TrackId, index: usize) -> Self {
        Self {
            id,
            position: QueuePosition::Index(index),
        }
    }
}

/// Play order bookkeeping for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueEngine {
    linear: Vec<TrackId>,
    shuffled: Vec<TrackId>,
    linear_index: usize,
    shuffled_index: usize,
    play_next: VecDeque<TrackId>,
    context: PlaybackContext,
    shuffle: bool,
    reversed: bool,
    repeat: RepeatMode,
}

impl QueueEngine {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue with initial ordering settings
    pub fn with_settings(shuffle: bool, reversed: bool, repeat: RepeatMode) -> Self {
        Self {
            shuffle,
            reversed,
            repeat,
            ..Self::default()
        }
    }

    // ===== List replacement =====

    /// Replace the list with a new context
    ///
    /// `start` selects the track to begin with. Without one, the first track
    /// of the active order is current (index 0 when shuffle is off, a random
    /// track when it is on). The play-next list is cleared.
    pub fn set_list(
        &mut self,
        ids: Vec<TrackId>,
        context: PlaybackContext,
        start: Option<&TrackId>,
    ) -> Result<()> {
        if ids.is_empty() {
            return Err(PlayerError::invalid_argument("track list is empty"));
        }
        if let Some(start) = start {
            if !ids.contains(start) {
                return Err(PlayerError::invalid_argument(format!(
                    "start track {start} is not in the list"
                )));
            }
        }

        self.shuffled = shuffled_with_first(&ids, start);
        self.linear = ids;
        self.play_next.clear();
        self.context = context;

        if self.shuffle {
            self.shuffled_index = 0;
        } else {
            self.linear_index = start
                .and_then(|id| self.linear.iter().position(|t| t == id))
                .unwrap_or(0);
        }
        self.sync_inactive_index();
        Ok(())
    }

    /// Add a track to the list itself (not the play-next list)
    ///
    /// With `after_current` the track goes directly after the current one,
    /// otherwise to the end. The same insertion is mirrored into the inactive
    /// order. Tracks already in the list are ignored; returns whether the
    /// track was added.
    pub fn append(&mut self, id: TrackId, after_current: bool) -> bool {
        if self.linear.contains(&id) {
            return false;
        }

        if after_current && !self.linear.is_empty() {
            let linear_at = (self.linear_index + 1).min(self.linear.len());
            let shuffled_at = (self.shuffled_index + 1).min(self.shuffled.len());
            self.linear.insert(linear_at, id.clone());
            self.shuffled.insert(shuffled_at, id);
        } else {
            self.linear.push(id.clone());
            self.shuffled.push(id);
        }
        true
    }

    /// Remove everything, including the play-next list
    pub fn clear(&mut self) {
        self.linear.clear();
        self.shuffled.clear();
        self.linear_index = 0;
        self.shuffled_index = 0;
        self.play_next.clear();
        self.context = PlaybackContext::default();
    }

    // ===== Play next =====

    /// Queue a track to play after the current one, ahead of the list
    ///
    /// Multiple requests play in the order they were made.
    pub fn enqueue_next(&mut self, id: TrackId) {
        self.play_next.push_back(id);
    }

    /// Drop a track from the play-next list; returns whether it was there
    pub fn remove_from_play_next(&mut self, id: &TrackId) -> bool {
        match self.play_next.iter().position(|t| t == id) {
            Some(pos) => {
                self.play_next.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Empty the play-next list
    pub fn clear_play_next(&mut self) {
        self.play_next.clear();
    }

    /// Pending play-next tracks, next first
    pub fn play_next(&self) -> impl Iterator<Item = &TrackId> {
        self.play_next.iter()
    }

    // ===== Ordering settings =====

    /// Turn shuffle on or off
    ///
    /// Enabling regenerates the shuffled order with `current` pinned first.
    /// Either way the active index is moved to `current` in the now-active
    /// order, or to 0 if it is not there.
    pub fn set_shuffle(&mut self, enabled: bool, current: Option<&TrackId>) {
        self.shuffle = enabled;
        if enabled {
            self.shuffled = shuffled_with_first(&self.linear, current);
        }

        let index = current
            .and_then(|id| self.active_order().iter().position(|t| t == id))
            .unwrap_or(0);
        self.set_active_index(index);
        self.sync_inactive_index();
    }

    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn reversed(&self) -> bool {
        self.reversed
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    // ===== Navigation =====

    /// Pick the next track and commit to it
    ///
    /// Play-next entries win over everything and are consumed. Otherwise the
    /// active index moves one step (backwards when reversed), wrapping only
    /// with `RepeatMode::On`. `None` means the end of the queue was reached;
    /// nothing changes in that case.
    pub fn resolve_next(&mut self) -> Option<QueueEntry> {
        if let Some(id) = self.play_next.pop_front() {
            return Some(QueueEntry {
                id,
                position: QueuePosition::PlayNext,
            });
        }
        let entry = self.peek_step(self.forward_step())?;
        self.commit(&entry);
        Some(entry)
    }

    /// Pick the previous track and commit to it
    ///
    /// The play-next list is never consulted going backwards.
    pub fn resolve_previous(&mut self) -> Option<QueueEntry> {
        let entry = self.peek_step(-self.forward_step())?;
        self.commit(&entry);
        Some(entry)
    }

    /// What [`resolve_next`](Self::resolve_next) would return, without
    /// changing anything
    pub fn peek_next(&self) -> Option<QueueEntry> {
        if let Some(id) = self.play_next.front() {
            return Some(QueueEntry {
                id: id.clone(),
                position: QueuePosition::PlayNext,
            });
        }
        self.peek_step(self.forward_step())
    }

    /// What [`resolve_previous`](Self::resolve_previous) would return
    pub fn peek_previous(&self) -> Option<QueueEntry> {
        self.peek_step(-self.forward_step())
    }

    /// Move the current index to `id` in the active order
    ///
    /// Returns the entry, or `None` if the id is not in the list.
    pub fn locate(&mut self, id: &TrackId) -> Option<QueueEntry> {
        let index = self.active_order().iter().position(|t| t == id)?;
        let entry = QueueEntry::at(id.clone(), index);
        self.commit(&entry);
        Some(entry)
    }

    fn forward_step(&self) -> isize {
        if self.reversed {
            -1
        } else {
            1
        }
    }

    fn peek_step(&self, step: isize) -> Option<QueueEntry> {
        let order = self.active_order();
        let len = order.len() as isize;
        if len == 0 {
            return None;
        }

        let target = self.current_index() as isize + step;
        let index = if (0..len).contains(&target) {
            target
        } else if self.repeat == RepeatMode::On {
            if target < 0 {
                len - 1
            } else {
                0
            }
        } else {
            return None;
        };

        let index = index as usize;
        Some(QueueEntry::at(order[index].clone(), index))
    }

    fn commit(&mut self, entry: &QueueEntry) {
        if let QueuePosition::Index(index) = entry.position {
            self.set_active_index(index);
            self.sync_inactive_index();
        }
    }

    fn set_active_index(&mut self, index: usize) {
        if self.shuffle {
            self.shuffled_index = index;
        } else {
            self.linear_index = index;
        }
    }

    /// Point the inactive index at the active track
    fn sync_inactive_index(&mut self) {
        let Some(current) = self.current().cloned() else {
            self.linear_index = 0;
            self.shuffled_index = 0;
            return;
        };

        if self.shuffle {
            self.linear_index = self
                .linear
                .iter()
                .position(|t| *t == current)
                .unwrap_or(0);
        } else {
            self.shuffled_index = self
                .shuffled
                .iter()
                .position(|t| *t == current)
                .unwrap_or(0);
        }
    }

    // ===== Queries =====

    /// The order currently used for navigation
    pub fn active_order(&self) -> &[TrackId] {
        if self.shuffle {
            &self.shuffled
        } else {
            &self.linear
        }
    }

    /// Current index into [`active_order`](Self::active_order)
    pub fn current_index(&self) -> usize {
        if self.shuffle {
            self.shuffled_index
        } else {
            self.linear_index
        }
    }

    /// Track at the current index
    pub fn current(&self) -> Option<&TrackId> {
        self.active_order().get(self.current_index())
    }

    pub fn linear(&self) -> &[TrackId] {
        &self.linear
    }

    pub fn shuffled(&self) -> &[TrackId] {
        &self.shuffled
    }

    pub fn context(&self) -> &PlaybackContext {
        &self.context
    }

    /// Number of tracks in the list (play-next entries excluded)
    pub fn len(&self) -> usize {
        self.linear.len()
    }

    pub fn is_empty(&self) -> bool {
        self.linear.is_empty()
    }

    pub fn play_next_len(&self) -> usize {
        self.play_next.len()
    }

    /// Repair a queue loaded from storage
    ///
    /// Rebuilds the shuffled order if it no longer matches the linear list
    /// and clamps both indices into range.
    pub(crate) fn repair(&mut self) {
        let mut linear = self.linear.clone();
        let mut shuffled = self.shuffled.clone();
        linear.sort();
        shuffled.sort();
        if linear != shuffled {
            let current = self.current().cloned();
            self.shuffled = shuffled_with_first(&self.linear, current.as_ref());
            self.shuffled_index = 0;
        }

        if self.linear_index >= self.linear.len() {
            self.linear_index = 0;
        }
        if self.shuffled_index >= self.shuffled.len() {
            self.shuffled_index = 0;
        }
        self.sync_inactive_index();
    }
}
