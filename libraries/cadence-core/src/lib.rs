//! Cadence Core
//!
//! Platform-agnostic domain types, errors and collaborator traits for the
//! Cadence remote player.
//!
//! The player itself lives in `cadence-playback`; this crate only defines
//! what it talks about (`TrackId`, `TrackMetadata`, `PlaybackContext`) and
//! who it talks to (`Catalog`, `TokenSource`, `Notifier`, `DisplaySink`, ...).
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{TrackId, TrackMetadata};
//!
//! let track = TrackMetadata::new("10", "Intro")
//!     .with_artist("a1", "Band")
//!     .with_duration_ms(180_000);
//!
//! assert_eq!(track.id, TrackId::from(10u64));
//! assert_eq!(track.window_title(), "Intro · Band - Cadence");
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{AuthError, CatalogError, CatalogResult};
pub use traits::{
    Catalog, DisplaySink, LikedTracks, Notifier, RadioSource, Scrobble, Scrobbler, TokenSource,
};
pub use types::{
    window_title, AccessToken, AlbumId, AlbumRef, ArtistId, ArtistRef, PlaybackContext, TrackId,
    TrackMetadata, APP_NAME,
};
