//! Core types for playback management

use crate::error::PlayerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Repeat mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the list ends
    #[default]
    Off,

    /// Wrap around at either end of the list
    On,

    /// Loop the current track when it ends
    One,
}

impl FromStr for RepeatMode {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "on" => Ok(Self::On),
            "one" => Ok(Self::One),
            other => Err(PlayerError::invalid_argument(format!(
                "repeat mode must be 'on' | 'off' | 'one', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::On => "on",
            Self::One => "one",
        })
    }
}

/// What to try when a requested track cannot be loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackPolicy {
    #[default]
    AdvanceToNext,
    RevertToPrevious,
}

/// Player facade state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    /// No device connected
    #[default]
    Idle,

    /// Device session being established
    Connecting,

    /// Device connected, nothing loaded
    Ready,

    /// Track switch in flight
    Loading,

    Playing,

    Paused,

    /// Unrecoverable until `connect` is issued again
    Failed,
}

impl PlayerState {
    /// Whether a device session is up
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            Self::Ready | Self::Loading | Self::Playing | Self::Paused
        )
    }
}

/// Transport state exposed to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportState {
    pub playing: bool,
    pub progress_secs: f64,

    /// 0.0 to 1.0
    pub volume: f32,
    pub repeat_mode: RepeatMode,
    pub shuffle: bool,
    pub reversed: bool,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            playing: false,
            progress_secs: 0.0,
            volume: 1.0,
            repeat_mode: RepeatMode::Off,
            shuffle: false,
            reversed: false,
        }
    }
}

/// Configuration for the player facade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial volume (0.0-1.0, default: 1.0)
    pub volume: f32,

    /// Initial repeat mode (default: Off)
    pub repeat_mode: RepeatMode,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Initial reversed flag (default: false)
    pub reversed: bool,

    /// Capacity of the command channel (default: 64)
    pub command_buffer: usize,

    /// Capacity of the device event channel (default: 64)
    pub event_buffer: usize,

    /// Name the device registers under (default: "Cadence")
    pub device_name: String,

    /// URI scheme for playable track URIs (default: "spotify")
    pub uri_scheme: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            repeat_mode: RepeatMode::Off,
            shuffle: false,
            reversed: false,
            command_buffer: 64,
            event_buffer: 64,
            device_name: cadence_core::APP_NAME.to_string(),
            uri_scheme: "spotify".to_string(),
        }
    }
}
