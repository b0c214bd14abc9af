/// Command-line arguments
use cadence_playback::{PlayerError, RepeatMode};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cadence")]
#[command(about = "Headless Cadence music player", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "CADENCE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show metadata for one or more tracks
    Track {
        /// Track ids or URIs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// List playback devices visible to the account
    Devices,
    /// Play a list of tracks on a device
    Play {
        /// Track ids or URIs, in list order
        #[arg(required = true)]
        ids: Vec<String>,
        /// Device name (defaults to the configured one)
        #[arg(short, long)]
        device: Option<String>,
        /// Track to start from
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        shuffle: bool,
        #[arg(long)]
        reversed: bool,
        /// Repeat mode: off, on or one
        #[arg(long, value_parser = parse_repeat)]
        repeat: Option<RepeatMode>,
        /// Load the first track without starting it
        #[arg(long)]
        paused: bool,
    },
    /// Play personal radio
    Radio {
        #[arg(short, long)]
        device: Option<String>,
        /// Tracks requested per recommendation batch
        #[arg(long, default_value_t = 20)]
        batch: usize,
    },
    /// Continue the last saved session
    Resume {
        #[arg(short, long)]
        device: Option<String>,
    },
}

fn parse_repeat(value: &str) -> Result<RepeatMode, String> {
    value.parse().map_err(|e: PlayerError| e.to_string())
}
