mod context;
mod ids;
mod token;
mod track;

pub use context::PlaybackContext;
pub use ids::{AlbumId, ArtistId, TrackId};
pub use token::AccessToken;
pub use track::{window_title, AlbumRef, ArtistRef, TrackMetadata, APP_NAME};
