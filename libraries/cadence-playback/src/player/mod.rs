//! Player facade
//!
//! A single task owning the queue, the transport state and the current
//! track. It reacts to three sources, in this priority order:
//! 1. Device events (pushed snapshots always win)
//! 2. Completions of in-flight work (fetches, loads, device commands)
//! 3. Commands from [`PlayerHandle`]s
//!
//! In-flight work lives in a `FuturesUnordered` polled by the same task, so
//! nothing ever runs in parallel and no state needs locking.
//!
//! # States
//!
//! ```text
//! Idle ──connect──▶ Connecting ──ready──▶ Ready ──switch──▶ Loading ──▶ Playing/Paused
//!                       │                   │                              │
//!                       └── init/account ───┴───────── authentication ─────┴──▶ Failed
//! ```

mod controls;
mod device;
mod pipeline;

use crate::collaborators::Collaborators;
use crate::error::{DeviceError, DeviceResult};
use crate::events::{PlayerEvent, PlayerSnapshot};
use crate::handle::{PlayerCommand, PlayerHandle};
use crate::queue::QueueEngine;
use crate::radio::PersonalRadio;
use crate::resolver::{LoadRequest, TrackResolver};
use crate::session::SavedSession;
use crate::transport::{DeviceEvent, DeviceSdk, PlaybackRequester, TokenProvider, TransportBridge};
use crate::types::{PlayerConfig, PlayerState, TransportState};
use cadence_core::{
    Catalog, CatalogResult, DisplaySink, LikedTracks, Notifier, RadioSource, Scrobbler,
    TokenSource, TrackId, TrackMetadata,
};
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

/// Device command tracked for its optimistic write
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TransportCommand {
    Resume,
    Pause,
    Seek(f64),
    SkipNext,
    SkipPrevious,
    SetVolume(f32),
    Restart,
}

/// Why a radio batch was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RadioPurpose {
    /// First batch after entering radio mode; plays immediately
    Start,

    /// Buffer ran dry on `next_track`; plays immediately
    Advance,

    /// Background top-up
    Refill,

    /// Buffer ran dry mid fallback pass; the pass continues on the batch
    Fallback(LoadRequest),
}

/// Result of a finished in-flight operation
pub(crate) enum Completion {
    Connected(DeviceResult<()>),
    Fetched {
        generation: u64,
        request: LoadRequest,
        result: CatalogResult<TrackMetadata>,
    },
    Loaded {
        generation: u64,
        request: LoadRequest,
        issued_at: u64,
        result: DeviceResult<()>,
    },
    Command {
        command: TransportCommand,
        issued_at: u64,
        result: DeviceResult<()>,
    },
    Radio {
        purpose: RadioPurpose,
        result: CatalogResult<Vec<TrackId>>,
    },
}

enum Step {
    Device(DeviceEvent),
    Completed(Completion),
    Command(PlayerCommand),
    Shutdown,
}

/// Builds a [`Player`] and its [`PlayerHandle`]
pub struct PlayerBuilder {
    config: PlayerConfig,
    device: Arc<dyn DeviceSdk>,
    requester: Arc<dyn PlaybackRequester>,
    catalog: Arc<dyn Catalog>,
    tokens: Arc<dyn TokenSource>,
    radio_source: Option<Arc<dyn RadioSource>>,
    collaborators: Collaborators,
    session: Option<SavedSession>,
}

impl PlayerBuilder {
    pub fn new(
        device: Arc<dyn DeviceSdk>,
        requester: Arc<dyn PlaybackRequester>,
        catalog: Arc<dyn Catalog>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            config: PlayerConfig::default(),
            device,
            requester,
            catalog,
            tokens,
            radio_source: None,
            collaborators: Collaborators::default(),
            session: None,
        }
    }

    pub fn config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.collaborators.notifier = notifier;
        self
    }

    pub fn display(mut self, display: Arc<dyn DisplaySink>) -> Self {
        self.collaborators.display = display;
        self
    }

    pub fn scrobbler(mut self, scrobbler: Arc<dyn Scrobbler>) -> Self {
        self.collaborators.scrobbler = scrobbler;
        self
    }

    pub fn liked_tracks(mut self, likes: Arc<dyn LikedTracks>) -> Self {
        self.collaborators.likes = likes;
        self
    }

    pub fn radio_source(mut self, source: Arc<dyn RadioSource>) -> Self {
        self.radio_source = Some(source);
        self
    }

    /// Restore a previously saved session
    ///
    /// The session's ordering settings and volume override the config.
    pub fn session(mut self, session: SavedSession) -> Self {
        self.session = Some(session);
        self
    }

    pub fn build(self) -> (Player, PlayerHandle) {
        let config = self.config;
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (device_tx, device_rx) = mpsc::channel(config.event_buffer.max(1));
        let (events_tx, _) = broadcast::channel(config.event_buffer.max(1));

        let mut transport = TransportState {
            volume: config.volume.clamp(0.0, 1.0),
            repeat_mode: config.repeat_mode,
            shuffle: config.shuffle,
            reversed: config.reversed,
            ..TransportState::default()
        };

        let (queue, current_track) = match self.session {
            Some(mut session) => {
                session.queue.repair();
                transport.volume = session.volume.clamp(0.0, 1.0);
                transport.progress_secs = session.progress_secs;
                transport.shuffle = session.queue.shuffle();
                transport.reversed = session.queue.reversed();
                transport.repeat_mode = session.queue.repeat_mode();
                (session.queue, session.current_track)
            }
            None => (
                QueueEngine::with_settings(config.shuffle, config.reversed, config.repeat_mode),
                None,
            ),
        };

        let (snapshot_tx, snapshot_rx) = watch::channel(PlayerSnapshot::default());
        let handle = PlayerHandle::new(command_tx, snapshot_rx, events_tx.clone());

        let player = Player {
            bridge: TransportBridge::new(self.device, self.requester, config.uri_scheme.clone()),
            resolver: TrackResolver::new(self.catalog),
            tokens: TokenProvider::new(self.tokens),
            radio_source: self.radio_source,
            collaborators: self.collaborators,
            config,
            queue,
            radio: PersonalRadio::new(),
            transport,
            state: PlayerState::Idle,
            current_track,
            muted_volume: None,
            snapshot_seq: 0,
            pending: FuturesUnordered::new(),
            commands: command_rx,
            device_tx,
            device_rx,
            snapshot_tx,
            events_tx,
        };
        player.publish();

        (player, handle)
    }
}

/// The player task
///
/// Created by [`PlayerBuilder::build`]; drive it with [`Player::run`].
pub struct Player {
    config: PlayerConfig,
    bridge: TransportBridge,
    resolver: TrackResolver,
    tokens: TokenProvider,
    radio_source: Option<Arc<dyn RadioSource>>,
    collaborators: Collaborators,

    queue: QueueEngine,
    radio: PersonalRadio,
    transport: TransportState,
    state: PlayerState,
    current_track: Option<TrackMetadata>,

    /// Volume to restore when unmuting
    muted_volume: Option<f32>,

    /// Number of device snapshots seen; guards optimistic writes
    snapshot_seq: u64,

    pending: FuturesUnordered<BoxFuture<'static, Completion>>,
    commands: mpsc::Receiver<PlayerCommand>,
    device_tx: mpsc::Sender<DeviceEvent>,
    device_rx: mpsc::Receiver<DeviceEvent>,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
    events_tx: broadcast::Sender<PlayerEvent>,
}

impl Player {
    /// Process events until every handle is dropped
    pub async fn run(mut self) {
        info!(device_name = %self.config.device_name, "Player started");

        loop {
            let step = tokio::select! {
                biased;
                Some(event) = self.device_rx.recv() => Step::Device(event),
                Some(done) = self.pending.next(), if !self.pending.is_empty() => Step::Completed(done),
                command = self.commands.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => Step::Shutdown,
                },
            };

            match step {
                Step::Device(event) => self.on_device_event(event),
                Step::Completed(done) => self.on_completion(done),
                Step::Command(command) => self.on_command(command),
                Step::Shutdown => break,
            }
            self.publish();
        }

        info!(pending = self.pending.len(), "Player stopped");
    }

    fn on_completion(&mut self, done: Completion) {
        match done {
            Completion::Connected(result) => self.on_connected(result),
            Completion::Fetched {
                generation,
                request,
                result,
            } => self.on_fetched(generation, request, result),
            Completion::Loaded {
                generation,
                request,
                issued_at,
                result,
            } => self.on_loaded(generation, request, issued_at, result),
            Completion::Command {
                command,
                issued_at,
                result,
            } => self.on_command_done(command, issued_at, result),
            Completion::Radio { purpose, result } => self.on_radio_batch(purpose, result),
        }
    }

    fn on_command(&mut self, command: PlayerCommand) {
        debug!(?command, "Player command");
        match command {
            PlayerCommand::Connect => self.connect(),
            PlayerCommand::Play => self.play(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::PlayOrPause => {
                if self.transport.playing {
                    self.pause();
                } else {
                    self.play();
                }
            }
            PlayerCommand::NextTrack => self.next_track(),
            PlayerCommand::PrevTrack => self.prev_track(),
            PlayerCommand::Seek(seconds) => self.seek(seconds),
            PlayerCommand::SetVolume(level) => self.set_volume(level),
            PlayerCommand::ToggleMute => self.toggle_mute(),
            PlayerCommand::SetShuffle(enabled) => self.set_shuffle(enabled),
            PlayerCommand::SetReversed(reversed) => self.set_reversed(reversed),
            PlayerCommand::SetRepeatMode(mode) => self.set_repeat_mode(mode),
            PlayerCommand::PlayList {
                ids,
                context,
                start,
                autoplay,
            } => self.play_list(ids, context, start.as_ref(), autoplay),
            PlayerCommand::AddToPlayNext(id) => self.queue.enqueue_next(id),
            PlayerCommand::Append { id, play_next } => self.append(id, play_next),
            PlayerCommand::RemoveFromPlayNext(id) => {
                self.queue.remove_from_play_next(&id);
            }
            PlayerCommand::ClearPlayNext => self.queue.clear_play_next(),
            PlayerCommand::PlayTrackOnList(id) => self.play_track_on_list(&id),
            PlayerCommand::SwitchTo {
                id,
                autoplay,
                policy,
            } => self.switch_to_id(id, autoplay, policy),
            PlayerCommand::PlayPersonalRadio => self.play_personal_radio(),
            PlayerCommand::LikeChanged { id, liked } => {
                if self.current_track.as_ref().map(|t| &t.id) == Some(&id) {
                    self.collaborators.display.set_tray_like_state(liked);
                }
            }
            PlayerCommand::SaveSession(reply) => {
                // receiver may have given up waiting
                let _ = reply.send(self.saved_session());
            }
        }
    }

    fn saved_session(&self) -> SavedSession {
        SavedSession {
            queue: self.queue.clone(),
            volume: self.transport.volume,
            current_track: self.current_track.clone(),
            progress_secs: self.transport.progress_secs,
        }
    }

    // ===== Shared helpers =====

    fn set_state(&mut self, state: PlayerState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "Player state");
            self.state = state;
            self.emit(PlayerEvent::StateChanged { state });
        }
    }

    fn set_playing(&mut self, playing: bool) {
        if self.transport.playing != playing {
            self.transport.playing = playing;
            self.collaborators.display.set_tray_play_state(playing);
        }
    }

    /// Replace the current track, updating every display surface
    fn set_current_track(&mut self, track: Option<TrackMetadata>) {
        let previous = self.current_track.as_ref().map(|t| t.id.clone());
        let changed = previous.as_ref() != track.as_ref().map(|t| &t.id);
        self.current_track = track;

        let display = &self.collaborators.display;
        display.set_window_title(&cadence_core::window_title(self.current_track.as_ref()));
        display.set_media_session_metadata(self.current_track.as_ref());
        let liked = self
            .current_track
            .as_ref()
            .is_some_and(|t| self.collaborators.likes.is_liked(&t.id));
        display.set_tray_like_state(liked);

        if changed {
            if let Some(track) = &self.current_track {
                self.emit(PlayerEvent::TrackChanged {
                    track_id: track.id.clone(),
                    previous_track_id: previous,
                });
            }
        }
    }

    /// Show a toast and record it as an error event
    fn notify(&self, message: impl Into<String>) {
        let message = message.into();
        self.collaborators.notifier.show_toast(&message);
        self.emit(PlayerEvent::Error { message });
    }

    fn notify_error(&self, error: &DeviceError) {
        self.notify(error.to_string());
    }

    fn emit(&self, event: PlayerEvent) {
        // no subscribers is fine
        let _ = self.events_tx.send(event);
    }

    fn track(&mut self, operation: BoxFuture<'static, Completion>) {
        self.pending.push(operation);
    }

    fn publish(&self) {
        let queue = self.queue.active_order().to_vec();
        let current_index = (!queue.is_empty()).then(|| self.queue.current_index());
        let up_next = if self.radio.is_active() {
            self.radio.state().next
        } else {
            self.queue.peek_next().map(|entry| entry.id)
        };

        let snapshot = PlayerSnapshot {
            state: self.state,
            transport: self.transport.clone(),
            current_track: self.current_track.clone(),
            device_id: self.bridge.device_id().map(str::to_string),
            queue,
            current_index,
            play_next: self.queue.play_next().cloned().collect(),
            up_next,
            context: self.queue.context().clone(),
            radio: self.radio.state(),
            pending_operations: self.pending.len(),
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}
