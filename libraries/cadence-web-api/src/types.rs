//! Types for Web API requests and responses.

use cadence_core::{TrackId, TrackMetadata};
use cadence_playback::{DeviceAlbum, DeviceArtist, DeviceState, DeviceTrack};
use serde::{Deserialize, Serialize};

// =============================================================================
// Authentication Types
// =============================================================================

/// Response from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    /// Token validity in seconds
    pub expires_in: i64,
    /// Present when the service rotates refresh tokens
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// =============================================================================
// Catalog Types
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiImage {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiAlbum {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub images: Vec<ApiImage>,
}

/// Track object as returned by `/tracks/{id}` and embedded in other responses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    #[serde(default)]
    pub album: Option<ApiAlbum>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl From<ApiTrack> for TrackMetadata {
    fn from(track: ApiTrack) -> Self {
        let mut metadata =
            TrackMetadata::new(TrackId::new(track.id), track.name).with_duration_ms(track.duration_ms);
        for artist in track.artists {
            metadata = metadata.with_artist(artist.id.unwrap_or_default(), artist.name);
        }
        if let Some(album) = track.album {
            let art = album.images.into_iter().next().map(|image| image.url);
            metadata = metadata.with_album(album.id.unwrap_or_default(), album.name, art);
        }
        metadata
    }
}

impl From<ApiTrack> for DeviceTrack {
    fn from(track: ApiTrack) -> Self {
        Self {
            id: track.id,
            name: track.name,
            artists: track
                .artists
                .into_iter()
                .map(|artist| DeviceArtist {
                    id: artist.id.unwrap_or_default(),
                    name: artist.name,
                })
                .collect(),
            album: track.album.map(|album| DeviceAlbum {
                id: album.id.unwrap_or_default(),
                name: album.name,
                images: album.images.into_iter().map(|image| image.url).collect(),
            }),
            duration_ms: track.duration_ms,
        }
    }
}

/// Response from `/me/top/tracks`.
#[derive(Debug, Deserialize)]
pub struct TopTracksResponse {
    #[serde(default)]
    pub items: Vec<ApiTrack>,
}

/// Response from `/recommendations`.
#[derive(Debug, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(default)]
    pub tracks: Vec<ApiTrack>,
}

// =============================================================================
// Player Types
// =============================================================================

/// Body of `PUT /me/player/play`.
#[derive(Debug, Serialize)]
pub struct PlayRequest<'a> {
    pub uris: &'a [String],
}

/// A device visible to the account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiDevice {
    /// Restricted devices have no id
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Response from `/me/player/devices`.
#[derive(Debug, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub devices: Vec<ApiDevice>,
}

/// Response from `/me/player`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackStateResponse {
    #[serde(default)]
    pub device: Option<ApiDevice>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub item: Option<ApiTrack>,
}

impl From<PlaybackStateResponse> for DeviceState {
    fn from(state: PlaybackStateResponse) -> Self {
        Self {
            paused: !state.is_playing,
            position_ms: state.progress_ms.unwrap_or(0),
            current_track: state.item.map(DeviceTrack::from),
        }
    }
}
