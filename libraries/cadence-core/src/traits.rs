/// Interfaces of the collaborators the player drives
///
/// The player owns all playback state. Collaborators either answer questions
/// (catalog, tokens, likes, radio) or receive fire-and-forget updates
/// (toasts, display, scrobbles); none of them mutate player state.
use crate::error::CatalogResult;
use crate::types::{AccessToken, PlaybackContext, TrackId, TrackMetadata};
use async_trait::async_trait;

/// Remote track catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch metadata for a single track
    ///
    /// # Errors
    /// `CatalogError::NotFound` when the id is unknown, `CatalogError::Transport`
    /// for anything else.
    async fn fetch_track(&self, id: &TrackId) -> CatalogResult<TrackMetadata>;
}

/// Source of bearer tokens for the playback device
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Currently stored token, if any (may be expired)
    async fn access_token(&self) -> Option<AccessToken>;

    /// Refresh the stored token; `true` when a new token was stored
    async fn refresh_access_token(&self) -> bool;
}

/// Recommendation feed backing personal radio mode
#[async_trait]
pub trait RadioSource: Send + Sync {
    /// Next batch of recommended tracks, in play order
    async fn recommend(&self) -> CatalogResult<Vec<TrackId>>;
}

/// User-visible, non-blocking notifications
pub trait Notifier: Send + Sync {
    fn show_toast(&self, message: &str);
}

/// Window, tray and media-session surfaces
pub trait DisplaySink: Send + Sync {
    fn set_window_title(&self, title: &str);

    fn set_tray_like_state(&self, liked: bool);

    fn set_tray_play_state(&self, playing: bool);

    fn set_media_session_metadata(&self, track: Option<&TrackMetadata>);
}

/// Read access to the user's liked tracks
pub trait LikedTracks: Send + Sync {
    fn is_liked(&self, id: &TrackId) -> bool;
}

/// A listen report for an outgoing track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scrobble {
    pub track: TrackMetadata,

    /// Whole seconds listened; the full length when `completed`
    pub elapsed_secs: u64,

    pub completed: bool,

    pub context: PlaybackContext,
}

impl Scrobble {
    /// Build a report from raw elapsed seconds
    pub fn new(
        track: TrackMetadata,
        elapsed_secs: f64,
        completed: bool,
        context: PlaybackContext,
    ) -> Self {
        let elapsed_secs = if completed {
            track.duration_ms / 1000
        } else {
            elapsed_secs.max(0.0).floor() as u64
        };
        Self {
            track,
            elapsed_secs,
            completed,
            context,
        }
    }
}

/// Listening-history sink (scrobbling, telemetry)
pub trait Scrobbler: Send + Sync {
    fn scrobble(&self, scrobble: &Scrobble);
}
