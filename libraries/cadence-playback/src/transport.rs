//! Transport bridge
//!
//! Single point of contact with the external playback device. The device is
//! connection oriented, asynchronous and fallible; the bridge turns its
//! commands into `'static` futures the player can keep in flight and turns
//! its raw events into [`TransportEvent`]s.

use crate::error::{DeviceError, DeviceResult};
use cadence_core::{AlbumId, AlbumRef, ArtistId, ArtistRef, TokenSource, TrackId, TrackMetadata};
use async_trait::async_trait;
use futures_util::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Artist as reported by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceArtist {
    pub id: String,
    pub name: String,
}

/// Album as reported by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAlbum {
    pub id: String,
    pub name: String,

    /// Cover image URLs, largest first
    pub images: Vec<String>,
}

/// The track the device says is sounding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<DeviceArtist>,
    pub album: Option<DeviceAlbum>,
    pub duration_ms: u64,
}

impl From<DeviceTrack> for TrackMetadata {
    fn from(track: DeviceTrack) -> Self {
        Self {
            id: TrackId::new(track.id),
            name: track.name,
            artists: track
                .artists
                .into_iter()
                .map(|artist| ArtistRef {
                    id: ArtistId::new(artist.id),
                    name: artist.name,
                })
                .collect(),
            album: track.album.map(|album| AlbumRef {
                id: AlbumId::new(album.id),
                name: album.name,
                art: album.images.into_iter().next(),
            }),
            duration_ms: track.duration_ms,
        }
    }
}

/// Raw state report pushed by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub paused: bool,
    pub position_ms: u64,
    pub current_track: Option<DeviceTrack>,
}

/// Raw device callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Ready { device_id: String },
    NotReady { device_id: String },

    /// `None` when the device has no active session
    StateChanged(Option<DeviceState>),

    InitializationError(String),
    AuthenticationError(String),
    AccountError(String),
    PlaybackError(String),
}

/// Translated device state, authoritative for `playing`, progress and the
/// sounding track
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub playing: bool,
    pub progress_secs: f64,
    pub track: Option<TrackMetadata>,

    /// The device stopped at the end of the track it was playing
    pub track_ended: bool,
}

/// Lifecycle events emitted by the bridge
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Ready(String),
    Offline(String),
    StateChanged(Snapshot),
    Error(DeviceError),
}

/// The external playback device
///
/// Implementations push [`DeviceEvent`]s into the sender handed to
/// [`connect`](Self::connect) for as long as the session lives.
#[async_trait]
pub trait DeviceSdk: Send + Sync {
    /// Establish the device session
    async fn connect(
        &self,
        name: &str,
        tokens: TokenProvider,
        events: mpsc::Sender<DeviceEvent>,
    ) -> DeviceResult<()>;

    async fn resume(&self) -> DeviceResult<()>;

    async fn pause(&self) -> DeviceResult<()>;

    async fn seek(&self, position_ms: u64) -> DeviceResult<()>;

    async fn next_track(&self) -> DeviceResult<()>;

    async fn previous_track(&self) -> DeviceResult<()>;

    /// Volume from 0.0 to 1.0
    async fn set_volume(&self, volume: f32) -> DeviceResult<()>;
}

/// Out-of-band "start playing these URIs on that device" request
#[async_trait]
pub trait PlaybackRequester: Send + Sync {
    async fn start_playback(&self, device_id: &str, uris: &[String]) -> DeviceResult<()>;
}

/// Token callback handed to the device
///
/// Returns the stored token while it is valid and refreshes it otherwise.
/// This is the only place the player triggers a token refresh.
#[derive(Clone)]
pub struct TokenProvider {
    source: Arc<dyn TokenSource>,
}

impl TokenProvider {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self { source }
    }

    /// A usable bearer token
    ///
    /// # Errors
    /// `Authentication` when no token is stored and refreshing fails.
    pub async fn token(&self) -> DeviceResult<String> {
        if let Some(token) = self.source.access_token().await {
            if !token.is_expired() {
                return Ok(token.value);
            }
        }

        debug!("Access token missing or expired, refreshing");
        if !self.source.refresh_access_token().await {
            warn!("Access token refresh failed");
            return Err(DeviceError::authentication("token refresh failed"));
        }

        self.source
            .access_token()
            .await
            .map(|token| token.value)
            .ok_or_else(|| DeviceError::authentication("no token after refresh"))
    }
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider").finish_non_exhaustive()
    }
}

/// Future of an in-flight device command
pub type CommandFuture = BoxFuture<'static, DeviceResult<()>>;

/// Owns the device connection and the last raw state it reported
pub struct TransportBridge {
    device: Arc<dyn DeviceSdk>,
    requester: Arc<dyn PlaybackRequester>,
    uri_scheme: String,
    device_id: Option<String>,
    last_state: Option<DeviceState>,
}

impl TransportBridge {
    pub fn new(
        device: Arc<dyn DeviceSdk>,
        requester: Arc<dyn PlaybackRequester>,
        uri_scheme: impl Into<String>,
    ) -> Self {
        Self {
            device,
            requester,
            uri_scheme: uri_scheme.into(),
            device_id: None,
            last_state: None,
        }
    }

    /// Id of the connected device, once it reported ready
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn connect(
        &self,
        name: &str,
        tokens: TokenProvider,
        events: mpsc::Sender<DeviceEvent>,
    ) -> CommandFuture {
        let device = Arc::clone(&self.device);
        let name = name.to_string();
        async move { device.connect(&name, tokens, events).await }.boxed()
    }

    pub fn resume(&self) -> CommandFuture {
        let device = Arc::clone(&self.device);
        async move { device.resume().await }.boxed()
    }

    pub fn pause(&self) -> CommandFuture {
        let device = Arc::clone(&self.device);
        async move { device.pause().await }.boxed()
    }

    /// Seek to `seconds` into the current track
    pub fn seek(&self, seconds: f64) -> CommandFuture {
        let device = Arc::clone(&self.device);
        let position_ms = (seconds.max(0.0) * 1000.0).round() as u64;
        async move { device.seek(position_ms).await }.boxed()
    }

    pub fn skip_next(&self) -> CommandFuture {
        let device = Arc::clone(&self.device);
        async move { device.next_track().await }.boxed()
    }

    pub fn skip_previous(&self) -> CommandFuture {
        let device = Arc::clone(&self.device);
        async move { device.previous_track().await }.boxed()
    }

    pub fn set_volume(&self, level: f32) -> CommandFuture {
        let device = Arc::clone(&self.device);
        let level = level.clamp(0.0, 1.0);
        async move { device.set_volume(level).await }.boxed()
    }

    /// Seek to the start and resume
    pub fn restart(&self) -> CommandFuture {
        let device = Arc::clone(&self.device);
        async move {
            device.seek(0).await?;
            device.resume().await
        }
        .boxed()
    }

    /// Switch the device to `id`, resuming when `autoplay` is set
    pub fn load_and_play(&self, id: &TrackId, autoplay: bool) -> CommandFuture {
        let Some(device_id) = self.device_id.clone() else {
            return future::ready(Err(DeviceError::playback("device is not ready"))).boxed();
        };

        let device = Arc::clone(&self.device);
        let requester = Arc::clone(&self.requester);
        let uris = vec![id.to_uri(&self.uri_scheme)];
        debug!(track_uri = %uris[0], device_id = %device_id, "Loading track on device");

        async move {
            requester.start_playback(&device_id, &uris).await?;
            if autoplay {
                device.resume().await?;
            }
            Ok(())
        }
        .boxed()
    }

    /// Turn a raw device callback into a transport event
    ///
    /// Returns `None` for state reports without an active session.
    pub fn translate(&mut self, event: DeviceEvent) -> Option<TransportEvent> {
        match event {
            DeviceEvent::Ready { device_id } => {
                self.device_id = Some(device_id.clone());
                Some(TransportEvent::Ready(device_id))
            }
            DeviceEvent::NotReady { device_id } => {
                if self.device_id.as_deref() == Some(device_id.as_str()) {
                    self.device_id = None;
                }
                self.last_state = None;
                Some(TransportEvent::Offline(device_id))
            }
            DeviceEvent::StateChanged(None) => None,
            DeviceEvent::StateChanged(Some(state)) => {
                let track_ended = self.is_track_end(&state);
                self.last_state = Some(state.clone());

                Some(TransportEvent::StateChanged(Snapshot {
                    playing: !state.paused,
                    progress_secs: state.position_ms as f64 / 1000.0,
                    track: state.current_track.map(TrackMetadata::from),
                    track_ended,
                }))
            }
            DeviceEvent::InitializationError(message) => {
                Some(TransportEvent::Error(DeviceError::initialization(message)))
            }
            DeviceEvent::AuthenticationError(message) => {
                Some(TransportEvent::Error(DeviceError::authentication(message)))
            }
            DeviceEvent::AccountError(message) => {
                Some(TransportEvent::Error(DeviceError::account(message)))
            }
            DeviceEvent::PlaybackError(message) => {
                Some(TransportEvent::Error(DeviceError::playback(message)))
            }
        }
    }

    /// Paused at zero right after playing the same track
    fn is_track_end(&self, state: &DeviceState) -> bool {
        let Some(previous) = &self.last_state else {
            return false;
        };

        let same_track = match (&previous.current_track, &state.current_track) {
            (Some(before), Some(now)) => before.id == now.id,
            _ => false,
        };

        same_track && !previous.paused && state.paused && state.position_ms == 0
    }
}

impl fmt::Debug for TransportBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportBridge")
            .field("uri_scheme", &self.uri_scheme)
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}
