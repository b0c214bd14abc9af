//! Player handle
//!
//! The only way in: every UI surface holds a cloned [`PlayerHandle`] and
//! talks to the player task through it. Arguments are validated here, so a
//! rejected call never reaches the player and leaves its state untouched.

use crate::error::{PlayerError, Result};
use crate::events::{PlayerEvent, PlayerSnapshot};
use crate::session::SavedSession;
use crate::types::{FallbackPolicy, RepeatMode};
use cadence_core::{PlaybackContext, TrackId};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::warn;

/// Commands processed by the player task
#[derive(Debug)]
pub enum PlayerCommand {
    Connect,
    Play,
    Pause,
    PlayOrPause,
    NextTrack,
    PrevTrack,
    Seek(f64),
    SetVolume(f32),
    ToggleMute,
    SetShuffle(bool),
    SetReversed(bool),
    SetRepeatMode(RepeatMode),
    PlayList {
        ids: Vec<TrackId>,
        context: PlaybackContext,
        start: Option<TrackId>,
        autoplay: bool,
    },
    AddToPlayNext(TrackId),
    Append {
        id: TrackId,
        play_next: bool,
    },
    RemoveFromPlayNext(TrackId),
    ClearPlayNext,
    PlayTrackOnList(TrackId),
    SwitchTo {
        id: TrackId,
        autoplay: bool,
        policy: FallbackPolicy,
    },
    PlayPersonalRadio,
    LikeChanged {
        id: TrackId,
        liked: bool,
    },
    SaveSession(oneshot::Sender<SavedSession>),
}

/// Cloneable handle to a running player
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
    snapshot: watch::Receiver<PlayerSnapshot>,
    events: broadcast::Sender<PlayerEvent>,
}

impl PlayerHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<PlayerCommand>,
        snapshot: watch::Receiver<PlayerSnapshot>,
        events: broadcast::Sender<PlayerEvent>,
    ) -> Self {
        Self {
            commands,
            snapshot,
            events,
        }
    }

    async fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlayerError::Closed)
    }

    // ===== Device =====

    /// Connect to the playback device
    pub async fn connect(&self) -> Result<()> {
        self.send(PlayerCommand::Connect).await
    }

    // ===== Transport =====

    pub async fn play(&self) -> Result<()> {
        self.send(PlayerCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(PlayerCommand::Pause).await
    }

    pub async fn play_or_pause(&self) -> Result<()> {
        self.send(PlayerCommand::PlayOrPause).await
    }

    pub async fn next_track(&self) -> Result<()> {
        self.send(PlayerCommand::NextTrack).await
    }

    pub async fn prev_track(&self) -> Result<()> {
        self.send(PlayerCommand::PrevTrack).await
    }

    /// Seek to `seconds` into the current track
    pub async fn seek(&self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() || seconds < 0.0 {
            warn!(seconds, "Rejected seek position");
            return Err(PlayerError::invalid_argument(format!(
                "seek position must be a non-negative number, got {seconds}"
            )));
        }
        self.send(PlayerCommand::Seek(seconds)).await
    }

    /// Set volume (0.0 to 1.0)
    pub async fn set_volume(&self, level: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&level) {
            warn!(level, "Rejected volume level");
            return Err(PlayerError::invalid_argument(format!(
                "volume must be between 0 and 1, got {level}"
            )));
        }
        self.send(PlayerCommand::SetVolume(level)).await
    }

    pub async fn toggle_mute(&self) -> Result<()> {
        self.send(PlayerCommand::ToggleMute).await
    }

    // ===== Ordering =====

    pub async fn set_shuffle(&self, enabled: bool) -> Result<()> {
        self.send(PlayerCommand::SetShuffle(enabled)).await
    }

    pub async fn set_reversed(&self, reversed: bool) -> Result<()> {
        self.send(PlayerCommand::SetReversed(reversed)).await
    }

    pub async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.send(PlayerCommand::SetRepeatMode(mode)).await
    }

    /// Set the repeat mode from its name (`off`, `on` or `one`)
    pub async fn set_repeat_mode_str(&self, mode: &str) -> Result<()> {
        let mode = mode.parse::<RepeatMode>().map_err(|e| {
            warn!(mode, "Rejected repeat mode");
            e
        })?;
        self.set_repeat_mode(mode).await
    }

    // ===== Queue =====

    /// Replace the queue and start playing it
    ///
    /// `start` picks the first track; without it playback starts at the
    /// head of the active order.
    pub async fn play_list(
        &self,
        ids: Vec<TrackId>,
        context: PlaybackContext,
        start: Option<TrackId>,
        autoplay: bool,
    ) -> Result<()> {
        if ids.is_empty() {
            warn!(context = context.kind(), "Rejected empty track list");
            return Err(PlayerError::invalid_argument("track list is empty"));
        }
        if let Some(start) = &start {
            if !ids.contains(start) {
                warn!(track_id = %start, "Rejected start track outside the list");
                return Err(PlayerError::invalid_argument(format!(
                    "start track {start} is not in the list"
                )));
            }
        }

        self.send(PlayerCommand::PlayList {
            ids,
            context,
            start,
            autoplay,
        })
        .await
    }

    /// Play `id` after the current track, ahead of the list
    pub async fn add_to_play_next(&self, id: TrackId) -> Result<()> {
        self.send(PlayerCommand::AddToPlayNext(id)).await
    }

    /// Add `id` to the list, after the current track or at the end
    pub async fn append(&self, id: TrackId, play_next: bool) -> Result<()> {
        self.send(PlayerCommand::Append { id, play_next }).await
    }

    pub async fn remove_from_play_next(&self, id: TrackId) -> Result<()> {
        self.send(PlayerCommand::RemoveFromPlayNext(id)).await
    }

    pub async fn clear_play_next(&self) -> Result<()> {
        self.send(PlayerCommand::ClearPlayNext).await
    }

    /// Jump to `id` within the current list
    pub async fn play_track_on_list(&self, id: TrackId) -> Result<()> {
        self.send(PlayerCommand::PlayTrackOnList(id)).await
    }

    /// Load `id` directly, recovering with `policy` if it cannot be played
    pub async fn switch_to(&self, id: TrackId, autoplay: bool, policy: FallbackPolicy) -> Result<()> {
        self.send(PlayerCommand::SwitchTo {
            id,
            autoplay,
            policy,
        })
        .await
    }

    pub async fn play_personal_radio(&self) -> Result<()> {
        self.send(PlayerCommand::PlayPersonalRadio).await
    }

    /// Tell the player a track was liked or unliked elsewhere
    pub async fn like_changed(&self, id: TrackId, liked: bool) -> Result<()> {
        self.send(PlayerCommand::LikeChanged { id, liked }).await
    }

    /// Capture the current session for persistence
    pub async fn save_session(&self) -> Result<SavedSession> {
        let (tx, rx) = oneshot::channel();
        self.send(PlayerCommand::SaveSession(tx)).await?;
        rx.await.map_err(|_| PlayerError::Closed)
    }

    // ===== Observation =====

    /// Latest published state
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that wakes on every published state
    pub fn watch(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&PlayerSnapshot) -> bool,
    ) -> Result<PlayerSnapshot> {
        let mut receiver = self.snapshot.clone();
        let snapshot = receiver
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| PlayerError::Closed)?;
        Ok(snapshot.clone())
    }
}
