/// Track metadata as resolved from the catalog
use crate::types::{AlbumId, ArtistId, TrackId};
use serde::{Deserialize, Serialize};

/// Application name used in window titles
pub const APP_NAME: &str = "Cadence";

/// Artist reference attached to a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: ArtistId,
    pub name: String,
}

/// Album reference attached to a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: AlbumId,
    pub name: String,

    /// Cover art URL, if the catalog has one
    pub art: Option<String>,
}

/// Fully resolved metadata for a single track
///
/// Only the fields the player needs for ordering, display and scrobbling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub id: TrackId,
    pub name: String,
    pub artists: Vec<ArtistRef>,
    pub album: Option<AlbumRef>,

    /// Track duration in milliseconds (0 when unknown)
    pub duration_ms: u64,
}

impl TrackMetadata {
    /// Create metadata with just an id and a name
    pub fn new(id: impl Into<TrackId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artists: Vec::new(),
            album: None,
            duration_ms: 0,
        }
    }

    /// Add an artist
    pub fn with_artist(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.artists.push(ArtistRef {
            id: ArtistId::new(id),
            name: name.into(),
        });
        self
    }

    /// Set the album
    pub fn with_album(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        art: Option<String>,
    ) -> Self {
        self.album = Some(AlbumRef {
            id: AlbumId::new(id),
            name: name.into(),
            art,
        });
        self
    }

    /// Set the duration
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Name of the first credited artist
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.name.as_str())
    }

    /// Whole seconds shown as the track length
    ///
    /// Unknown durations count as one second. Lengths above one second are
    /// shortened by one.
    pub fn display_duration_secs(&self) -> u64 {
        let duration_ms = if self.duration_ms == 0 {
            1000
        } else {
            self.duration_ms
        };
        let secs = duration_ms / 1000;
        if secs > 1 {
            secs - 1
        } else {
            secs
        }
    }

    /// Window title for this track
    pub fn window_title(&self) -> String {
        match self.primary_artist() {
            Some(artist) => format!("{} · {} - {}", self.name, artist, APP_NAME),
            None => format!("{} - {}", self.name, APP_NAME),
        }
    }
}

/// Window title for an optional track
pub fn window_title(track: Option<&TrackMetadata>) -> String {
    track.map_or_else(|| APP_NAME.to_string(), TrackMetadata::window_title)
}
