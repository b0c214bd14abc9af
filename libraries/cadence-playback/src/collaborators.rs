//! Default collaborators
//!
//! Used when the front-end does not provide its own. They log instead of
//! showing anything.

use cadence_core::{DisplaySink, LikedTracks, Notifier, Scrobble, Scrobbler, TrackId, TrackMetadata};
use std::sync::Arc;
use tracing::{debug, info};

/// Writes toasts to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_toast(&self, message: &str) {
        info!(message, "Toast");
    }
}

/// Ignores every display update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDisplay;

impl DisplaySink for NoopDisplay {
    fn set_window_title(&self, title: &str) {
        debug!(title, "Window title");
    }

    fn set_tray_like_state(&self, _liked: bool) {}

    fn set_tray_play_state(&self, _playing: bool) {}

    fn set_media_session_metadata(&self, _track: Option<&TrackMetadata>) {}
}

/// Logs scrobbles without reporting them anywhere
#[derive(Debug, Default, Clone, Copy)]
pub struct LogScrobbler;

impl Scrobbler for LogScrobbler {
    fn scrobble(&self, scrobble: &Scrobble) {
        debug!(
            track_id = %scrobble.track.id,
            elapsed_secs = scrobble.elapsed_secs,
            completed = scrobble.completed,
            "Scrobble"
        );
    }
}

/// No liked tracks
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLikes;

impl LikedTracks for NoLikes {
    fn is_liked(&self, _id: &TrackId) -> bool {
        false
    }
}

/// Fire-and-forget surfaces the player reports to
#[derive(Clone)]
pub struct Collaborators {
    pub notifier: Arc<dyn Notifier>,
    pub display: Arc<dyn DisplaySink>,
    pub scrobbler: Arc<dyn Scrobbler>,
    pub likes: Arc<dyn LikedTracks>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            notifier: Arc::new(LogNotifier),
            display: Arc::new(NoopDisplay),
            scrobbler: Arc::new(LogScrobbler),
            likes: Arc::new(NoLikes),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
