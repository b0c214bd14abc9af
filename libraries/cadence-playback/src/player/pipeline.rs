//! Track switching: fetch, load, fall back

use super::{Completion, Player, RadioPurpose, TransportCommand};
use crate::error::{DeviceResult, PlayerError};
use crate::events::PlayerEvent;
use crate::resolver::{LoadRequest, SwitchReason};
use crate::types::{FallbackPolicy, PlayerState};
use cadence_core::{CatalogResult, PlaybackContext, Scrobble, TrackId, TrackMetadata};
use futures_util::FutureExt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Radio tracks tried before a radio fallback pass gives up
const RADIO_FALLBACK_BUDGET: usize = 5;

impl Player {
    /// Start switching to `request.id`, superseding any switch in flight
    pub(super) fn switch_to(&mut self, request: LoadRequest) {
        if request.reason == SwitchReason::User && request.autoplay {
            if let Some(track) = self.current_track.clone() {
                self.scrobble(&track, false);
            }
        }

        let generation = self.resolver.begin();
        debug!(
            track_id = %request.id,
            generation,
            attempt = request.attempt,
            "Switching track"
        );

        if self.state.is_connected() {
            self.set_state(PlayerState::Loading);
        }

        let fetch = self.resolver.fetch(&request.id);
        self.track(
            async move {
                let result = fetch.await;
                Completion::Fetched {
                    generation,
                    request,
                    result,
                }
            }
            .boxed(),
        );
    }

    /// Switch to an arbitrary track without touching the queue position
    pub(super) fn switch_to_id(&mut self, id: TrackId, autoplay: bool, policy: FallbackPolicy) {
        let request = LoadRequest::new(id, autoplay, policy, SwitchReason::User)
            .with_budget(self.fallback_budget());
        self.switch_to(request);
    }

    pub(super) fn on_fetched(
        &mut self,
        generation: u64,
        request: LoadRequest,
        result: CatalogResult<TrackMetadata>,
    ) {
        if !self.resolver.is_current(generation) {
            debug!(track_id = %request.id, "Discarding superseded fetch");
            return;
        }

        let track = match result {
            Ok(track) => track,
            Err(e) => {
                warn!(track_id = %request.id, error = %e, "Track could not be resolved");
                self.fallback(&request, &format!("Cannot play this track: {e}"));
                return;
            }
        };

        self.set_current_track(Some(track));

        if self.bridge.device_id().is_none() {
            warn!(track_id = %request.id, "No playback device, track not loaded");
            self.notify("The player is not ready yet, please wait a moment");
            if self.state == PlayerState::Loading {
                self.set_state(PlayerState::Ready);
            }
            return;
        }

        let issued_at = self.snapshot_seq;
        let load = self.bridge.load_and_play(&request.id, request.autoplay);
        self.track(
            async move {
                let result = load.await;
                Completion::Loaded {
                    generation,
                    request,
                    issued_at,
                    result,
                }
            }
            .boxed(),
        );
    }

    pub(super) fn on_loaded(
        &mut self,
        generation: u64,
        request: LoadRequest,
        issued_at: u64,
        result: DeviceResult<()>,
    ) {
        if !self.resolver.is_current(generation) {
            debug!(track_id = %request.id, "Discarding superseded load");
            return;
        }

        match result {
            Ok(()) => {
                info!(track_id = %request.id, autoplay = request.autoplay, "Track loaded");
                // A snapshot since the load was issued wins
                let playing = if issued_at == self.snapshot_seq {
                    self.transport.progress_secs = 0.0;
                    self.set_playing(request.autoplay);
                    request.autoplay
                } else {
                    debug!(track_id = %request.id, "Device reported state during load, keeping it");
                    self.transport.playing
                };
                if self.state.is_connected() {
                    self.set_state(if playing {
                        PlayerState::Playing
                    } else {
                        PlayerState::Paused
                    });
                }
            }
            Err(e) => {
                error!(track_id = %request.id, error = %e, "Track failed to load");
                self.fallback(&request, &format!("Cannot play this track: {}", e.message));
            }
        }
    }

    /// Notify, then try the next candidate per the request's policy
    fn fallback(&mut self, failed: &LoadRequest, message: &str) {
        self.notify(message);

        let candidate = if self.radio.is_active() {
            match self.radio.advance() {
                Some(id) => Some(id),
                None if failed.attempt + 1 < failed.budget => {
                    debug!("Radio buffer dry during fallback, fetching a batch");
                    self.request_radio_batch(RadioPurpose::Fallback(failed.clone()));
                    return;
                }
                None => None,
            }
        } else {
            match failed.policy {
                FallbackPolicy::AdvanceToNext => self.queue.resolve_next(),
                FallbackPolicy::RevertToPrevious => self.queue.resolve_previous(),
            }
            .map(|entry| entry.id)
        };

        match candidate.and_then(|id| failed.retry_with(id)) {
            Some(retry) => {
                debug!(track_id = %retry.id, attempt = retry.attempt, "Falling back");
                self.switch_to(retry);
            }
            None => self.exhausted(),
        }
    }

    /// A whole fallback pass failed: halt and go back to `Ready`
    fn exhausted(&mut self) {
        let e = PlayerError::QueueExhausted;
        error!(error = %e, "Giving up on playback");
        self.notify(e.to_string());
        self.emit(PlayerEvent::QueueExhausted);

        self.set_current_track(None);
        if self.state.is_connected() {
            if self.transport.playing {
                self.issue(TransportCommand::Pause);
            }
            self.set_state(PlayerState::Ready);
        }
    }

    /// Attempts allowed in one fallback pass
    pub(super) fn fallback_budget(&self) -> usize {
        if self.radio.is_active() {
            RADIO_FALLBACK_BUDGET
        } else {
            self.queue.len() + self.queue.play_next_len()
        }
    }

    pub(super) fn scrobble(&self, track: &TrackMetadata, completed: bool) {
        let context = if self.radio.is_active() {
            PlaybackContext::PersonalRadio
        } else {
            self.queue.context().clone()
        };
        let scrobble = Scrobble::new(
            track.clone(),
            self.transport.progress_secs,
            completed,
            context,
        );
        self.collaborators.scrobbler.scrobble(&scrobble);
    }

    // ===== Personal radio =====

    pub(super) fn play_personal_radio(&mut self) {
        if self.radio_source.is_none() {
            warn!("Personal radio requested without a radio source");
            self.notify("Personal radio is not available");
            return;
        }

        info!("Entering personal radio");
        self.radio.activate();
        self.request_radio_batch(RadioPurpose::Start);
    }

    /// Play the next radio track, fetching a batch first if the buffer is dry
    pub(super) fn advance_radio(&mut self, reason: SwitchReason) {
        match self.radio.advance() {
            Some(id) => {
                let request = LoadRequest::new(id, true, FallbackPolicy::AdvanceToNext, reason)
                    .with_budget(RADIO_FALLBACK_BUDGET);
                self.switch_to(request);
                if self.radio.needs_refill() {
                    self.request_radio_batch(RadioPurpose::Refill);
                }
            }
            None => self.request_radio_batch(RadioPurpose::Advance),
        }
    }

    fn request_radio_batch(&mut self, purpose: RadioPurpose) {
        let Some(source) = self.radio_source.as_ref().map(Arc::clone) else {
            return;
        };
        self.radio.mark_refilling();
        self.track(
            async move {
                let result = source.recommend().await;
                Completion::Radio { purpose, result }
            }
            .boxed(),
        );
    }

    pub(super) fn on_radio_batch(&mut self, purpose: RadioPurpose, result: CatalogResult<Vec<TrackId>>) {
        if !self.radio.is_active() {
            debug!(?purpose, "Discarding radio batch, radio no longer active");
            return;
        }

        match result {
            Ok(batch) if !batch.is_empty() => {
                debug!(?purpose, count = batch.len(), "Radio batch received");
                self.radio.absorb(batch);
                match purpose {
                    RadioPurpose::Refill => {}
                    RadioPurpose::Fallback(failed) => {
                        match self.radio.advance().and_then(|id| failed.retry_with(id)) {
                            Some(retry) => {
                                self.switch_to(retry);
                                if self.radio.needs_refill() {
                                    self.request_radio_batch(RadioPurpose::Refill);
                                }
                            }
                            None => self.exhausted(),
                        }
                    }
                    RadioPurpose::Start | RadioPurpose::Advance => {
                        self.advance_radio(SwitchReason::User)
                    }
                }
            }
            Ok(_) => {
                self.radio.refill_failed();
                warn!(?purpose, "Radio returned no recommendations");
                self.radio_batch_failed(purpose, "Personal radio has nothing to play".to_string());
            }
            Err(e) => {
                self.radio.refill_failed();
                error!(?purpose, error = %e, "Radio recommendations failed");
                self.radio_batch_failed(purpose, format!("Personal radio failed: {e}"));
            }
        }
    }

    fn radio_batch_failed(&mut self, purpose: RadioPurpose, message: String) {
        match purpose {
            RadioPurpose::Refill => {}
            RadioPurpose::Fallback(_) => self.exhausted(),
            RadioPurpose::Start | RadioPurpose::Advance => self.notify(message),
        }
    }
}
