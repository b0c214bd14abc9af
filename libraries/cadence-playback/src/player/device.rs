//! Device lifecycle and snapshot reconciliation

use super::{Completion, Player, TransportCommand};
use crate::error::{DeviceError, DeviceErrorKind, DeviceResult};
use crate::events::PlayerEvent;
use crate::resolver::{LoadRequest, SwitchReason};
use crate::transport::{DeviceEvent, Snapshot, TransportEvent};
use crate::types::{FallbackPolicy, PlayerState, RepeatMode};
use cadence_core::TrackId;
use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

impl Player {
    pub(super) fn connect(&mut self) {
        if matches!(self.state, PlayerState::Connecting) || self.state.is_connected() {
            debug!(state = ?self.state, "Already connected or connecting");
            return;
        }

        info!(device_name = %self.config.device_name, "Connecting to playback device");
        self.set_state(PlayerState::Connecting);
        let connect = self.bridge.connect(
            &self.config.device_name,
            self.tokens.clone(),
            self.device_tx.clone(),
        );
        self.track(connect.map(Completion::Connected).boxed());
    }

    pub(super) fn on_connected(&mut self, result: DeviceResult<()>) {
        match result {
            Ok(()) => debug!("Device session established, waiting for ready"),
            Err(e) => self.on_device_error(&e),
        }
    }

    pub(super) fn on_device_event(&mut self, event: DeviceEvent) {
        let Some(event) = self.bridge.translate(event) else {
            return;
        };

        match event {
            TransportEvent::Ready(device_id) => {
                info!(device_id = %device_id, "Device ready");
                if matches!(self.state, PlayerState::Idle | PlayerState::Connecting) {
                    self.set_state(PlayerState::Ready);
                }
                self.emit(PlayerEvent::DeviceReady { device_id });
            }
            TransportEvent::Offline(device_id) => {
                warn!(device_id = %device_id, "Device went offline");
                if self.state != PlayerState::Failed {
                    self.set_state(PlayerState::Idle);
                }
                self.set_playing(false);
                self.emit(PlayerEvent::DeviceOffline { device_id });
            }
            TransportEvent::StateChanged(snapshot) => self.on_snapshot(snapshot),
            TransportEvent::Error(e) => self.on_device_error(&e),
        }
    }

    /// Apply a pushed snapshot; it always overrides local state
    fn on_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot_seq += 1;
        self.set_playing(snapshot.playing);
        self.transport.progress_secs = snapshot.progress_secs;

        if let Some(track) = snapshot.track {
            self.follow_device_track(&track.id);
            self.set_current_track(Some(track));
        }

        if matches!(
            self.state,
            PlayerState::Ready | PlayerState::Playing | PlayerState::Paused
        ) && self.current_track.is_some()
        {
            self.set_state(if snapshot.playing {
                PlayerState::Playing
            } else {
                PlayerState::Paused
            });
        }

        if snapshot.track_ended {
            self.on_track_ended();
        }
    }

    /// Move the queue position to a track the device switched to on its own
    ///
    /// Not applied in radio mode or mid switch, nor while a play-next track
    /// is sounding.
    fn follow_device_track(&mut self, id: &TrackId) {
        if self.radio.is_active()
            || self.state == PlayerState::Loading
            || self.queue.current() == Some(id)
        {
            return;
        }
        let list_sounding = self
            .current_track
            .as_ref()
            .map_or(true, |current| self.queue.current() == Some(&current.id));
        if !list_sounding {
            return;
        }
        if let Some(entry) = self.queue.locate(id) {
            debug!(track_id = %id, index = ?entry.position, "Following device to queued track");
        }
    }

    fn on_track_ended(&mut self) {
        let Some(track) = self.current_track.clone() else {
            return;
        };
        debug!(track_id = %track.id, "Track ended");
        self.emit(PlayerEvent::TrackEnded {
            track_id: track.id.clone(),
        });

        if self.queue.repeat_mode() == RepeatMode::One && !self.radio.is_active() {
            self.issue(TransportCommand::Restart);
            return;
        }

        self.scrobble(&track, true);

        if self.radio.is_active() {
            self.advance_radio(SwitchReason::TrackEnded);
            return;
        }

        match self.queue.resolve_next() {
            Some(entry) => {
                let request = LoadRequest::new(
                    entry.id,
                    true,
                    FallbackPolicy::AdvanceToNext,
                    SwitchReason::TrackEnded,
                )
                .with_budget(self.fallback_budget());
                self.switch_to(request);
            }
            None => {
                info!("Reached the end of the queue");
                self.emit(PlayerEvent::EndOfQueue);
            }
        }
    }

    pub(super) fn on_device_error(&mut self, e: &DeviceError) {
        error!(kind = %e.kind, message = %e.message, "Device error");

        match e.kind {
            DeviceErrorKind::Authentication => self.set_state(PlayerState::Failed),
            DeviceErrorKind::Initialization | DeviceErrorKind::AccountIneligible
                if self.state == PlayerState::Connecting =>
            {
                self.set_state(PlayerState::Failed);
            }
            _ => {}
        }

        let message = match e.kind {
            DeviceErrorKind::Authentication => {
                "Authentication expired, please sign in again".to_string()
            }
            DeviceErrorKind::AccountIneligible => {
                "This account cannot use the playback device, a premium account may be required"
                    .to_string()
            }
            _ => e.to_string(),
        };
        self.notify(message);
    }
}
