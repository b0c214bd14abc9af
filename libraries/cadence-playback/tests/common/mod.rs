//! In-memory collaborators for player tests

#![allow(dead_code)]

use async_trait::async_trait;
use cadence_core::{
    AccessToken, Catalog, CatalogError, CatalogResult, DisplaySink, Notifier, RadioSource,
    Scrobble, Scrobbler, TokenSource, TrackId, TrackMetadata,
};
use cadence_playback::{
    DeviceArtist, DeviceError, DeviceEvent, DeviceResult, DeviceSdk, DeviceState, DeviceTrack,
    PlaybackRequester, PlayerBuilder, PlayerEvent, PlayerHandle, PlayerSnapshot, TokenProvider,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Notify};

pub const DEVICE_ID: &str = "device-1";
pub const TRACK_MS: u64 = 180_000;

// ===== Device =====

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Connect,
    Resume,
    Pause,
    Seek(u64),
    Next,
    Previous,
    Volume(f32),
}

pub struct FakeDevice {
    calls: Mutex<Vec<DeviceCall>>,
    events: Mutex<Option<mpsc::Sender<DeviceEvent>>>,
    on_connect: Mutex<DeviceEvent>,
}

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        Self::with_connect_event(DeviceEvent::Ready {
            device_id: DEVICE_ID.to_string(),
        })
    }

    /// Device that answers `connect` with `event` instead of ready
    pub fn with_connect_event(event: DeviceEvent) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            events: Mutex::new(None),
            on_connect: Mutex::new(event),
        })
    }

    pub fn set_connect_event(&self, event: DeviceEvent) {
        *self.on_connect.lock().unwrap() = event;
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Push a raw event as the SDK would
    pub async fn emit(&self, event: DeviceEvent) {
        let sender = self
            .events
            .lock()
            .unwrap()
            .clone()
            .expect("device was never connected");
        sender.send(event).await.expect("player stopped");
    }

    fn record(&self, call: DeviceCall) -> DeviceResult<()> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl DeviceSdk for FakeDevice {
    async fn connect(
        &self,
        _name: &str,
        tokens: TokenProvider,
        events: mpsc::Sender<DeviceEvent>,
    ) -> DeviceResult<()> {
        self.record(DeviceCall::Connect)?;
        tokens.token().await?;
        *self.events.lock().unwrap() = Some(events.clone());
        let event = self.on_connect.lock().unwrap().clone();
        events
            .send(event)
            .await
            .map_err(|_| DeviceError::initialization("player stopped"))
    }

    async fn resume(&self) -> DeviceResult<()> {
        self.record(DeviceCall::Resume)
    }

    async fn pause(&self) -> DeviceResult<()> {
        self.record(DeviceCall::Pause)
    }

    async fn seek(&self, position_ms: u64) -> DeviceResult<()> {
        self.record(DeviceCall::Seek(position_ms))
    }

    async fn next_track(&self) -> DeviceResult<()> {
        self.record(DeviceCall::Next)
    }

    async fn previous_track(&self) -> DeviceResult<()> {
        self.record(DeviceCall::Previous)
    }

    async fn set_volume(&self, volume: f32) -> DeviceResult<()> {
        self.record(DeviceCall::Volume(volume))
    }
}

/// State report for `id` as the device would send it
pub fn device_state(id: u64, paused: bool, position_ms: u64) -> DeviceEvent {
    DeviceEvent::StateChanged(Some(DeviceState {
        paused,
        position_ms,
        current_track: Some(DeviceTrack {
            id: id.to_string(),
            name: format!("Track {id}"),
            artists: vec![DeviceArtist {
                id: "artist-1".to_string(),
                name: "Artist".to_string(),
            }],
            album: None,
            duration_ms: TRACK_MS,
        }),
    }))
}

#[derive(Default)]
pub struct FakeRequester {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    failing: Mutex<HashSet<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeRequester {
    /// Hold every load until the returned gate is opened
    pub fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn fail_uri(&self, uri: &str) {
        self.failing.lock().unwrap().insert(uri.to_string());
    }

    /// Every URI sent to the device, in order
    pub fn loaded_uris(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, uris)| uris.clone())
            .collect()
    }
}

#[async_trait]
impl PlaybackRequester for FakeRequester {
    async fn start_playback(&self, device_id: &str, uris: &[String]) -> DeviceResult<()> {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failing = self.failing.lock().unwrap();
        if let Some(uri) = uris.iter().find(|uri| failing.contains(*uri)) {
            return Err(DeviceError::playback(format!("{uri} is unavailable")));
        }
        drop(failing);

        self.calls
            .lock()
            .unwrap()
            .push((device_id.to_string(), uris.to_vec()));
        Ok(())
    }
}

// ===== Catalog =====

#[derive(Default)]
pub struct FakeCatalog {
    tracks: HashMap<TrackId, TrackMetadata>,
    gates: Mutex<HashMap<TrackId, Arc<Notify>>>,
}

impl FakeCatalog {
    pub fn with_tracks(ids: &[u64]) -> Self {
        let tracks = ids
            .iter()
            .map(|&id| {
                let track = TrackMetadata::new(id, format!("Track {id}"))
                    .with_artist("artist-1", "Artist")
                    .with_duration_ms(TRACK_MS);
                (track.id.clone(), track)
            })
            .collect();
        Self {
            tracks,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Hold fetches of `id` until the returned gate is opened
    pub fn gate(&self, id: u64) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(TrackId::from(id), Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn fetch_track(&self, id: &TrackId) -> CatalogResult<TrackMetadata> {
        let gate = self.gates.lock().unwrap().get(id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.tracks
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }
}

pub struct FakeRadio {
    pub batch: Vec<TrackId>,
}

#[async_trait]
impl RadioSource for FakeRadio {
    async fn recommend(&self) -> CatalogResult<Vec<TrackId>> {
        Ok(self.batch.clone())
    }
}

/// Radio that hands out one queued batch per call, then nothing
pub struct ScriptedRadio {
    batches: Mutex<VecDeque<Vec<TrackId>>>,
}

impl ScriptedRadio {
    pub fn new(batches: Vec<Vec<TrackId>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
        }
    }
}

#[async_trait]
impl RadioSource for ScriptedRadio {
    async fn recommend(&self) -> CatalogResult<Vec<TrackId>> {
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }
}

pub struct ValidTokens;

#[async_trait]
impl TokenSource for ValidTokens {
    async fn access_token(&self) -> Option<AccessToken> {
        Some(AccessToken::expiring_in("token", 3600))
    }

    async fn refresh_access_token(&self) -> bool {
        true
    }
}

// ===== Display surfaces =====

#[derive(Default)]
pub struct RecordingNotifier {
    pub toasts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<String> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show_toast(&self, message: &str) {
        self.toasts.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub titles: Mutex<Vec<String>>,
    pub tray_playing: Mutex<Vec<bool>>,
}

impl RecordingDisplay {
    pub fn last_title(&self) -> Option<String> {
        self.titles.lock().unwrap().last().cloned()
    }
}

impl DisplaySink for RecordingDisplay {
    fn set_window_title(&self, title: &str) {
        self.titles.lock().unwrap().push(title.to_string());
    }

    fn set_tray_like_state(&self, _liked: bool) {}

    fn set_tray_play_state(&self, playing: bool) {
        self.tray_playing.lock().unwrap().push(playing);
    }

    fn set_media_session_metadata(&self, _track: Option<&TrackMetadata>) {}
}

#[derive(Default)]
pub struct RecordingScrobbler {
    pub scrobbles: Mutex<Vec<Scrobble>>,
}

impl RecordingScrobbler {
    pub fn scrobbles(&self) -> Vec<Scrobble> {
        self.scrobbles.lock().unwrap().clone()
    }
}

impl Scrobbler for RecordingScrobbler {
    fn scrobble(&self, scrobble: &Scrobble) {
        self.scrobbles.lock().unwrap().push(scrobble.clone());
    }
}

// ===== Harness =====

pub struct Harness {
    pub handle: PlayerHandle,
    pub device: Arc<FakeDevice>,
    pub requester: Arc<FakeRequester>,
    pub catalog: Arc<FakeCatalog>,
    pub notifier: Arc<RecordingNotifier>,
    pub display: Arc<RecordingDisplay>,
    pub scrobbler: Arc<RecordingScrobbler>,
}

impl Harness {
    pub fn start(catalog: FakeCatalog) -> Self {
        Self::start_with(catalog, FakeDevice::new(), |builder| builder)
    }

    /// Spawn a player; `customize` runs last and may replace any collaborator
    pub fn start_with(
        catalog: FakeCatalog,
        device: Arc<FakeDevice>,
        customize: impl FnOnce(PlayerBuilder) -> PlayerBuilder,
    ) -> Self {
        init_tracing();
        let requester = Arc::new(FakeRequester::default());
        let catalog = Arc::new(catalog);
        let notifier = Arc::new(RecordingNotifier::default());
        let display = Arc::new(RecordingDisplay::default());
        let scrobbler = Arc::new(RecordingScrobbler::default());

        let builder = PlayerBuilder::new(
            device.clone(),
            requester.clone(),
            catalog.clone(),
            Arc::new(ValidTokens),
        )
        .notifier(notifier.clone())
        .display(display.clone())
        .scrobbler(scrobbler.clone());

        let (player, handle) = customize(builder).build();
        tokio::spawn(player.run());

        Self {
            handle,
            device,
            requester,
            catalog,
            notifier,
            display,
            scrobbler,
        }
    }

    /// Started and connected to the fake device
    pub async fn connected(catalog: FakeCatalog) -> Self {
        let harness = Self::start(catalog);
        harness.handle.connect().await.unwrap();
        harness
            .wait("device ready", |s| s.device_id.is_some() && s.is_idle())
            .await;
        harness
    }

    pub async fn wait(
        &self,
        what: &str,
        predicate: impl FnMut(&PlayerSnapshot) -> bool,
    ) -> PlayerSnapshot {
        tokio::time::timeout(Duration::from_secs(2), self.handle.wait_for(predicate))
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {what}: {:?}", self.handle.snapshot()))
            .expect("player stopped")
    }

    /// Returns once every command sent so far has been processed
    pub async fn barrier(&self) {
        self.handle.save_session().await.expect("player stopped");
    }

    /// Wait until nothing is in flight and `id` is the current track
    pub async fn settled_on(&self, id: u64) -> PlayerSnapshot {
        let id = TrackId::from(id);
        self.wait(&format!("track {id}"), |s| {
            s.is_idle() && s.current_track_id() == Some(&id)
        })
        .await
    }
}

/// Log to the test writer, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn ids(raw: &[u64]) -> Vec<TrackId> {
    raw.iter().copied().map(TrackId::from).collect()
}

pub fn uri(id: u64) -> String {
    format!("spotify:track:{id}")
}

/// Everything currently buffered on an event receiver
pub fn drain(events: &mut broadcast::Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}
