/// Error types shared by the player and its collaborators
use crate::types::TrackId;
use thiserror::Error;

/// Result type alias for catalog lookups
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Failure to resolve track metadata
///
/// Always recoverable: the player falls back to a neighbouring track.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The catalog has no such track
    #[error("Track not found: {0}")]
    NotFound(TrackId),

    /// The request did not complete (network, server or decoding failure)
    #[error("Catalog transport error: {0}")]
    Transport(String),
}

impl CatalogError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// Failure to obtain a bearer token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token is stored and none could be obtained
    #[error("No access token available")]
    NoToken,

    /// The refresh request was rejected or failed
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
}
