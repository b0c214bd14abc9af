//! Error types for playback management

use cadence_core::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of a playback-device failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceErrorKind {
    /// The device SDK could not start
    Initialization,

    /// The device rejected our bearer token
    Authentication,

    /// The account may not use the device (e.g. not premium)
    AccountIneligible,

    /// A transport command or load failed
    Playback,
}

impl fmt::Display for DeviceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialization => "initialization",
            Self::Authentication => "authentication",
            Self::AccountIneligible => "account",
            Self::Playback => "playback",
        };
        f.write_str(name)
    }
}

/// Failure reported by, or while talking to, the playback device
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Device {kind} error: {message}")]
pub struct DeviceError {
    pub kind: DeviceErrorKind,
    pub message: String,
}

impl DeviceError {
    pub fn new(kind: DeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn initialization(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::Initialization, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::Authentication, message)
    }

    pub fn account(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::AccountIneligible, message)
    }

    pub fn playback(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::Playback, message)
    }
}

/// Result type for device operations
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Argument rejected before any state changed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Every track in one pass over the queue failed to load
    #[error("No playable track in queue")]
    QueueExhausted,

    /// Playback device failure
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Catalog lookup failure
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The player task has stopped
    #[error("Player has shut down")]
    Closed,
}

impl PlayerError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_error_message_names_kind() {
        let err = DeviceError::account("premium required");
        assert_eq!(err.to_string(), "Device account error: premium required");
    }
}
