//! Error types for the Web API adapters.

use cadence_core::{CatalogError, TrackId};
use cadence_playback::DeviceError;
use thiserror::Error;

/// Errors that can occur when talking to the streaming service.
#[derive(Error, Debug)]
pub enum WebApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Service returned an error response
    #[error("Service error ({status}): {message}")]
    ServiceError { status: u16, message: String },

    /// No token is stored and none can be obtained
    #[error("Authentication required")]
    AuthRequired,

    /// The service rejected our bearer token
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Invalid base URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse a response body
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Service is offline or unreachable
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    /// Rate limited by the service
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WebApiError {
    /// Wrap a transport failure, separating "cannot connect" from the rest
    pub(crate) fn from_send(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::Unreachable(error.to_string())
        } else {
            Self::Request(error)
        }
    }

    /// HTTP status of a service error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServiceError { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::AuthFailed(_) => Some(401),
            _ => None,
        }
    }

    /// Map onto the catalog taxonomy for a lookup of `id`
    pub fn into_catalog_error(self, id: &TrackId) -> CatalogError {
        match self.status() {
            Some(400 | 404) => CatalogError::NotFound(id.clone()),
            _ => CatalogError::transport(self.to_string()),
        }
    }

    /// Map onto the device taxonomy
    pub fn into_device_error(self) -> DeviceError {
        match &self {
            Self::AuthRequired | Self::AuthFailed(_) | Self::TokenRefreshFailed(_) => {
                DeviceError::authentication(self.to_string())
            }
            Self::ServiceError { status: 403, .. } => DeviceError::account(self.to_string()),
            _ => DeviceError::playback(self.to_string()),
        }
    }
}

impl From<config::ConfigError> for WebApiError {
    fn from(error: config::ConfigError) -> Self {
        Self::Config(error.to_string())
    }
}

/// Result type for Web API operations.
pub type Result<T> = std::result::Result<T, WebApiError>;
