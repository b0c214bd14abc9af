/// Where a play queue came from
use serde::{Deserialize, Serialize};

/// Origin of the current queue
///
/// Carried for display and for continuing a context later; never used for
/// ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackContext {
    Album { id: String },
    Playlist { id: String },
    Artist { id: String },
    Search { query: String },
    Library,
    PersonalRadio,
    /// Tracks queued one by one with no common source
    #[default]
    Adhoc,
}

impl PlaybackContext {
    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Album { .. } => "album",
            Self::Playlist { .. } => "playlist",
            Self::Artist { .. } => "artist",
            Self::Search { .. } => "search",
            Self::Library => "library",
            Self::PersonalRadio => "personal_radio",
            Self::Adhoc => "adhoc",
        }
    }
}
