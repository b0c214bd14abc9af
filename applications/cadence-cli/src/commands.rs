//! Subcommand implementations

use crate::config::CliConfig;
use crate::output::{describe_event, describe_snapshot, describe_track};
use anyhow::Context;
use cadence_core::{Catalog, Notifier, PlaybackContext, TrackId};
use cadence_playback::{
    PlayerBuilder, PlayerEvent, PlayerHandle, PlayerState, RepeatMode, SavedSession,
};
use cadence_web_api::types::DevicesResponse;
use cadence_web_api::{RemoteDevice, WebApiClient, WebCatalog, WebPlaybackRequester, WebRadio};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Toasts go straight to the terminal
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show_toast(&self, message: &str) {
        eprintln!("! {message}");
    }
}

/// Options for the `play` subcommand
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    pub ids: Vec<String>,
    pub device: Option<String>,
    pub start: Option<String>,
    pub shuffle: bool,
    pub reversed: bool,
    pub repeat: Option<RepeatMode>,
    pub paused: bool,
}

pub async fn show_tracks(config: &CliConfig, ids: &[String]) -> anyhow::Result<()> {
    let catalog = WebCatalog::new(WebApiClient::new(config.web_api.clone())?);

    for id in ids {
        match catalog.fetch_track(&TrackId::new(id.as_str())).await {
            Ok(track) => println!("{}", describe_track(&track)),
            Err(e) => {
                warn!(track_id = %id, error = %e, "Track lookup failed");
                eprintln!("{id}: {e}");
            }
        }
    }

    Ok(())
}

pub async fn list_devices(config: &CliConfig) -> anyhow::Result<()> {
    let client = WebApiClient::new(config.web_api.clone())?;
    let devices = client
        .get_json::<DevicesResponse>("/me/player/devices")
        .await?
        .map(|response| response.devices)
        .unwrap_or_default();

    if devices.is_empty() {
        println!("No devices available");
    }
    for device in devices {
        let marker = if device.is_active { "*" } else { " " };
        let id = device.id.as_deref().unwrap_or("restricted");
        println!("{marker} {} ({id})", device.name);
    }

    Ok(())
}

pub async fn play(config: &CliConfig, options: PlayOptions) -> anyhow::Result<()> {
    let mut player_config = config.player.clone();
    player_config.shuffle |= options.shuffle;
    player_config.reversed |= options.reversed;
    if let Some(repeat) = options.repeat {
        player_config.repeat_mode = repeat;
    }
    let config = CliConfig {
        player: player_config,
        ..config.clone()
    };

    let handle = start_player(&config, options.device, None, 20)?;
    let events = handle.subscribe();
    connect(&handle).await?;

    let ids: Vec<TrackId> = options.ids.into_iter().map(TrackId::new).collect();
    handle
        .play_list(
            ids,
            PlaybackContext::default(),
            options.start.map(TrackId::new),
            !options.paused,
        )
        .await?;

    follow(&handle, events, &config.session_path).await
}

pub async fn radio(config: &CliConfig, device: Option<String>, batch: usize) -> anyhow::Result<()> {
    let handle = start_player(config, device, None, batch)?;
    let events = handle.subscribe();
    connect(&handle).await?;

    handle.play_personal_radio().await?;
    follow(&handle, events, &config.session_path).await
}

pub async fn resume(config: &CliConfig, device: Option<String>) -> anyhow::Result<()> {
    let session = load_session(&config.session_path)
        .await?
        .with_context(|| format!("No saved session at {}", config.session_path.display()))?;
    let current = session.current_track.as_ref().map(|track| track.id.clone());

    let handle = start_player(config, device, Some(session), 20)?;
    let events = handle.subscribe();
    connect(&handle).await?;

    match current {
        Some(id) => handle.play_track_on_list(id).await?,
        None => anyhow::bail!("Saved session has no current track"),
    }
    follow(&handle, events, &config.session_path).await
}

fn start_player(
    config: &CliConfig,
    device: Option<String>,
    session: Option<SavedSession>,
    radio_batch: usize,
) -> anyhow::Result<PlayerHandle> {
    let client = WebApiClient::new(config.web_api.clone())?;

    let mut player_config = config.player.clone();
    if let Some(device) = device {
        player_config.device_name = device;
    }

    let mut builder = PlayerBuilder::new(
        Arc::new(RemoteDevice::new(client.clone())),
        Arc::new(WebPlaybackRequester::new(client.clone())),
        Arc::new(WebCatalog::new(client.clone())),
        client.tokens(),
    )
    .config(player_config)
    .notifier(Arc::new(ConsoleNotifier))
    .radio_source(Arc::new(WebRadio::new(client, radio_batch)));

    if let Some(session) = session {
        builder = builder.session(session);
    }

    let (player, handle) = builder.build();
    tokio::spawn(player.run());
    Ok(handle)
}

async fn connect(handle: &PlayerHandle) -> anyhow::Result<()> {
    handle.connect().await?;

    let snapshot = tokio::time::timeout(
        CONNECT_TIMEOUT,
        handle.wait_for(|s| s.device_id.is_some() || s.state == PlayerState::Failed),
    )
    .await
    .context("Timed out waiting for the playback device")??;

    if snapshot.state == PlayerState::Failed {
        anyhow::bail!("Could not connect to the playback device");
    }
    info!(device_id = ?snapshot.device_id, "Connected");
    Ok(())
}

/// Print events until the queue runs out or the user interrupts
async fn follow(
    handle: &PlayerHandle,
    mut events: tokio::sync::broadcast::Receiver<PlayerEvent>,
    session_path: &Path,
) -> anyhow::Result<()> {
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            _ = &mut interrupted => {
                info!("Interrupted, pausing playback");
                handle.pause().await?;
                break;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(line) = describe_event(&event, &handle.snapshot()) {
                        println!("{line}");
                    }
                    if matches!(event, PlayerEvent::EndOfQueue | PlayerEvent::QueueExhausted) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    println!("{}", describe_snapshot(&handle.snapshot()));
    save_session(handle, session_path).await
}

async fn save_session(handle: &PlayerHandle, path: &Path) -> anyhow::Result<()> {
    let session = handle.save_session().await?;
    tokio::fs::write(path, session.to_json()?)
        .await
        .with_context(|| format!("Failed to write session to {}", path.display()))?;
    info!(path = %path.display(), "Session saved");
    Ok(())
}

/// `None` when no session has been saved yet
pub async fn load_session(path: &Path) -> anyhow::Result<Option<SavedSession>> {
    if !path.exists() {
        return Ok(None);
    }

    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read session from {}", path.display()))?;
    Ok(Some(SavedSession::from_json(&json)?))
}
