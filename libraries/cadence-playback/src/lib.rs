//! Cadence Playback - queue and transport state machine
//!
//! Decides what plays next and keeps that decision in step with an external
//! streaming device that reports its own state asynchronously.
//!
//! This crate provides:
//! - Queue engine (linear + shuffled orders, play-next list)
//! - Repeat modes (Off, On, One) and reversed playback
//! - Transport bridge to the device SDK
//! - Track resolution with fallback when a track cannot be played
//! - Personal radio mode
//! - Player facade running as a single tokio task
//!
//! # Architecture
//!
//! `cadence-playback` owns no I/O of its own. The device, the catalog and
//! the token store are traits (`DeviceSdk`, `PlaybackRequester`,
//! `cadence_core::Catalog`, `cadence_core::TokenSource`) implemented by
//! `cadence-web-api` or by test fakes.
//!
//! # Example: Queue ordering
//!
//! ```rust
//! use cadence_playback::{QueueEngine, QueueEntry, QueuePosition, RepeatMode};
//! use cadence_core::{PlaybackContext, TrackId};
//!
//! let mut queue = QueueEngine::new();
//! let ids = vec![TrackId::from(10u64), TrackId::from(20u64), TrackId::from(30u64)];
//! queue.set_list(ids, PlaybackContext::Library, None).unwrap();
//!
//! let next = queue.resolve_next().unwrap();
//! assert_eq!(next.id, TrackId::from(20u64));
//! assert_eq!(next.position, QueuePosition::Index(1));
//!
//! // play next jumps ahead without moving the list position
//! queue.enqueue_next(TrackId::from(99u64));
//! assert_eq!(queue.resolve_next().unwrap().position, QueuePosition::PlayNext);
//! assert_eq!(queue.current_index(), 1);
//!
//! queue.set_repeat_mode(RepeatMode::On);
//! queue.resolve_next();
//! assert_eq!(queue.resolve_next().unwrap().id, TrackId::from(10u64));
//! ```
//!
//! # Example: Running the player
//!
//! ```rust,no_run
//! use cadence_playback::{PlayerBuilder, PlayerConfig};
//! # use std::sync::Arc;
//! # async fn demo(
//! #     device: Arc<dyn cadence_playback::DeviceSdk>,
//! #     requester: Arc<dyn cadence_playback::PlaybackRequester>,
//! #     catalog: Arc<dyn cadence_core::Catalog>,
//! #     tokens: Arc<dyn cadence_core::TokenSource>,
//! # ) -> cadence_playback::Result<()> {
//! let (player, handle) = PlayerBuilder::new(device, requester, catalog, tokens)
//!     .config(PlayerConfig::default())
//!     .build();
//! tokio::spawn(player.run());
//!
//! handle.connect().await?;
//! handle.play_list(vec!["1".into(), "2".into()], Default::default(), None, true).await?;
//! # Ok(())
//! # }
//! ```

mod collaborators;
mod error;
pub mod events;
mod handle;
mod player;
mod queue;
pub mod radio;
mod resolver;
mod session;
mod shuffle;
pub mod transport;
pub mod types;

// Public exports
pub use collaborators::{Collaborators, LogNotifier, LogScrobbler, NoLikes, NoopDisplay};
pub use error::{DeviceError, DeviceErrorKind, DeviceResult, PlayerError, Result};
pub use events::{PlayerEvent, PlayerSnapshot};
pub use handle::{PlayerCommand, PlayerHandle};
pub use player::{Player, PlayerBuilder};
pub use queue::{QueueEngine, QueueEntry, QueuePosition};
pub use radio::{PersonalRadio, RadioState};
pub use resolver::{LoadRequest, SwitchReason, TrackResolver};
pub use session::SavedSession;
pub use shuffle::{shuffled_with_first, shuffled_with_first_rng};
pub use transport::{
    DeviceAlbum, DeviceArtist, DeviceEvent, DeviceSdk, DeviceState, DeviceTrack, PlaybackRequester,
    Snapshot, TokenProvider, TransportBridge, TransportEvent,
};
pub use types::{FallbackPolicy, PlayerConfig, PlayerState, RepeatMode, TransportState};
