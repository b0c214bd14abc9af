//! Transport and queue controls

use super::{Completion, Player, TransportCommand};
use crate::error::DeviceResult;
use crate::events::PlayerEvent;
use crate::resolver::{LoadRequest, SwitchReason};
use crate::types::{FallbackPolicy, PlayerState, RepeatMode};
use cadence_core::{PlaybackContext, TrackId};
use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

impl Player {
    // ===== Device commands =====

    /// Send a command to the device; its optimistic write lands on success
    pub(super) fn issue(&mut self, command: TransportCommand) {
        let future = match command {
            TransportCommand::Resume => self.bridge.resume(),
            TransportCommand::Pause => self.bridge.pause(),
            TransportCommand::Seek(seconds) => self.bridge.seek(seconds),
            TransportCommand::SkipNext => self.bridge.skip_next(),
            TransportCommand::SkipPrevious => self.bridge.skip_previous(),
            TransportCommand::SetVolume(level) => self.bridge.set_volume(level),
            TransportCommand::Restart => self.bridge.restart(),
        };

        let issued_at = self.snapshot_seq;
        self.track(
            future
                .map(move |result| Completion::Command {
                    command,
                    issued_at,
                    result,
                })
                .boxed(),
        );
    }

    pub(super) fn on_command_done(
        &mut self,
        command: TransportCommand,
        issued_at: u64,
        result: DeviceResult<()>,
    ) {
        if let Err(e) = result {
            error!(?command, error = %e, "Device command failed");
            self.notify_error(&e);
            return;
        }

        if issued_at != self.snapshot_seq {
            debug!(?command, "Device reported state since command, skipping optimistic write");
            return;
        }

        match command {
            TransportCommand::Resume => self.optimistic_playing(true),
            TransportCommand::Pause => self.optimistic_playing(false),
            TransportCommand::Seek(seconds) => self.transport.progress_secs = seconds,
            TransportCommand::Restart => {
                self.transport.progress_secs = 0.0;
                self.optimistic_playing(true);
            }
            TransportCommand::SkipNext
            | TransportCommand::SkipPrevious
            | TransportCommand::SetVolume(_) => {}
        }
    }

    fn optimistic_playing(&mut self, playing: bool) {
        self.set_playing(playing);
        if matches!(self.state, PlayerState::Playing | PlayerState::Paused) {
            self.set_state(if playing {
                PlayerState::Playing
            } else {
                PlayerState::Paused
            });
        }
    }

    /// Whether device commands can be sent; toasts when not
    fn require_device(&self) -> bool {
        if self.bridge.device_id().is_some() && self.state.is_connected() {
            return true;
        }
        warn!(state = ?self.state, "Playback device not ready");
        self.notify("The player is not ready yet, please wait a moment");
        false
    }

    // ===== Transport =====

    pub(super) fn play(&mut self) {
        if self.transport.playing {
            return;
        }
        if self.require_device() {
            self.issue(TransportCommand::Resume);
        }
    }

    pub(super) fn pause(&mut self) {
        if self.require_device() {
            self.issue(TransportCommand::Pause);
        }
    }

    pub(super) fn seek(&mut self, seconds: f64) {
        if self.require_device() {
            self.issue(TransportCommand::Seek(seconds));
        }
    }

    pub(super) fn set_volume(&mut self, level: f32) {
        self.transport.volume = level;
        self.muted_volume = None;
        if self.bridge.device_id().is_some() {
            self.issue(TransportCommand::SetVolume(level));
        }
    }

    pub(super) fn toggle_mute(&mut self) {
        let (level, restore) = match self.muted_volume.take() {
            Some(previous) if self.transport.volume == 0.0 => (previous, None),
            _ => (0.0, Some(self.transport.volume)),
        };
        self.set_volume(level);
        self.muted_volume = restore;
    }

    pub(super) fn next_track(&mut self) {
        if self.radio.is_active() {
            self.advance_radio(SwitchReason::User);
            return;
        }

        if self.queue.is_empty() && self.queue.play_next_len() == 0 {
            debug!("Local queue empty, skipping on the device");
            if self.require_device() {
                self.issue(TransportCommand::SkipNext);
            }
            return;
        }

        match self.queue.resolve_next() {
            Some(entry) => {
                let request = LoadRequest::new(
                    entry.id,
                    true,
                    FallbackPolicy::AdvanceToNext,
                    SwitchReason::User,
                )
                .with_budget(self.fallback_budget());
                self.switch_to(request);
            }
            None => {
                info!("Reached the end of the queue");
                if self.transport.playing && self.require_device() {
                    self.issue(TransportCommand::Pause);
                }
                if self.state == PlayerState::Playing {
                    self.set_state(PlayerState::Paused);
                }
                self.emit(PlayerEvent::EndOfQueue);
            }
        }
    }

    pub(super) fn prev_track(&mut self) {
        if self.radio.is_active() {
            debug!("Personal radio has no previous track");
            return;
        }

        if self.queue.is_empty() {
            debug!("Local queue empty, skipping on the device");
            if self.require_device() {
                self.issue(TransportCommand::SkipPrevious);
            }
            return;
        }

        match self.queue.resolve_previous() {
            Some(entry) => {
                let request = LoadRequest::new(
                    entry.id,
                    true,
                    FallbackPolicy::RevertToPrevious,
                    SwitchReason::User,
                )
                .with_budget(self.fallback_budget());
                self.switch_to(request);
            }
            None => debug!("Already at the start of the queue"),
        }
    }

    // ===== Ordering =====

    /// Ordering belongs to the radio while it is active
    fn reject_in_radio(&self, setting: &str) -> bool {
        if self.radio.is_active() {
            warn!(setting, "Ignoring ordering change while personal radio is active");
            return true;
        }
        false
    }

    pub(super) fn set_shuffle(&mut self, enabled: bool) {
        if self.reject_in_radio("shuffle") {
            return;
        }
        let current = self.current_track.as_ref().map(|t| t.id.clone());
        self.queue.set_shuffle(enabled, current.as_ref());
        self.transport.shuffle = enabled;
    }

    pub(super) fn set_reversed(&mut self, reversed: bool) {
        if self.reject_in_radio("reversed") {
            return;
        }
        self.queue.set_reversed(reversed);
        self.transport.reversed = reversed;
    }

    pub(super) fn set_repeat_mode(&mut self, mode: RepeatMode) {
        if self.reject_in_radio("repeat") {
            return;
        }
        self.queue.set_repeat_mode(mode);
        self.transport.repeat_mode = mode;
    }

    // ===== Queue =====

    pub(super) fn play_list(
        &mut self,
        ids: Vec<TrackId>,
        context: PlaybackContext,
        start: Option<&TrackId>,
        autoplay: bool,
    ) {
        if self.radio.is_active() {
            info!("Leaving personal radio for a list");
            self.radio.deactivate();
        }

        if let Err(e) = self.queue.set_list(ids, context, start) {
            warn!(error = %e, "Rejected track list");
            return;
        }

        let Some(first) = self.queue.current().cloned() else {
            return;
        };
        let request = LoadRequest::new(first, autoplay, FallbackPolicy::AdvanceToNext, SwitchReason::User)
            .with_budget(self.fallback_budget());
        self.switch_to(request);
    }

    pub(super) fn append(&mut self, id: TrackId, play_next: bool) {
        if !self.queue.append(id.clone(), play_next) {
            debug!(track_id = %id, "Track already in the list");
        }
    }

    pub(super) fn play_track_on_list(&mut self, id: &TrackId) {
        match self.queue.locate(id) {
            Some(entry) => {
                let request = LoadRequest::new(
                    entry.id,
                    true,
                    FallbackPolicy::AdvanceToNext,
                    SwitchReason::User,
                )
                .with_budget(self.fallback_budget());
                self.switch_to(request);
            }
            None => warn!(track_id = %id, "Track is not in the current list"),
        }
    }
}
