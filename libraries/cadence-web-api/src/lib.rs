//! Cadence Web API adapters
//!
//! Implements the player's collaborator traits against a streaming-service
//! Web API over HTTP.
//!
//! # Features
//!
//! - **Authentication**: cached access token, refresh-token grant on expiry
//! - **Catalog**: track metadata lookups, radio recommendations
//! - **Playback**: start-playback requests and a polled remote device
//!
//! # Example
//!
//! ```ignore
//! use cadence_playback::PlayerBuilder;
//! use cadence_web_api::{RemoteDevice, WebApiClient, WebApiConfig, WebCatalog, WebPlaybackRequester};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WebApiClient::new(WebApiConfig::load(None)?)?;
//!
//!     let (player, handle) = PlayerBuilder::new(
//!         Arc::new(RemoteDevice::new(client.clone())),
//!         Arc::new(WebPlaybackRequester::new(client.clone())),
//!         Arc::new(WebCatalog::new(client.clone())),
//!         client.tokens(),
//!     )
//!     .build();
//!     tokio::spawn(player.run());
//!
//!     handle.connect().await?;
//!     Ok(())
//! }
//! ```

mod auth;
mod catalog;
mod client;
mod config;
mod error;
mod player;
pub mod types;

pub use auth::TokenStore;
pub use catalog::{WebCatalog, WebRadio};
pub use client::WebApiClient;
pub use config::{WebApiConfig, CONFIG_FILE};
pub use error::{Result, WebApiError};
pub use player::{RemoteDevice, WebPlaybackRequester};
