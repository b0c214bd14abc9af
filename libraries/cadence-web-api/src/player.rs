//! Remote playback device driven through the player endpoints.
//!
//! The device is any Connect-capable endpoint visible to the account,
//! selected by name. Its state is not pushed to us, so a background task
//! polls `GET /me/player` and forwards every change as a device event.

use crate::client::WebApiClient;
use crate::error::WebApiError;
use crate::types::{DevicesResponse, PlayRequest, PlaybackStateResponse};
use async_trait::async_trait;
use cadence_playback::{
    DeviceError, DeviceErrorKind, DeviceEvent, DeviceResult, DeviceSdk, DeviceState,
    PlaybackRequester, TokenProvider,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Append `device_id` to a player endpoint path
fn on_device(path: &str, device_id: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}device_id={device_id}")
}

/// Starts playback of URIs on a device with `PUT /me/player/play`.
pub struct WebPlaybackRequester {
    client: WebApiClient,
}

impl WebPlaybackRequester {
    pub fn new(client: WebApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PlaybackRequester for WebPlaybackRequester {
    async fn start_playback(&self, device_id: &str, uris: &[String]) -> DeviceResult<()> {
        debug!(device_id = %device_id, uris = ?uris, "Starting playback");
        self.client
            .put_json(&on_device("/me/player/play", device_id), &PlayRequest { uris })
            .await
            .map_err(WebApiError::into_device_error)
    }
}

pub struct RemoteDevice {
    client: WebApiClient,
    device_id: Arc<RwLock<Option<String>>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteDevice {
    pub fn new(client: WebApiClient) -> Self {
        Self {
            client,
            device_id: Arc::new(RwLock::new(None)),
            poller: Mutex::new(None),
        }
    }

    /// Id of the device selected by `connect`
    pub async fn device_id(&self) -> Option<String> {
        self.device_id.read().await.clone()
    }

    async fn command_path(&self, path: &str) -> DeviceResult<String> {
        let device_id = self
            .device_id
            .read()
            .await
            .clone()
            .ok_or_else(|| DeviceError::playback("device is not connected"))?;
        Ok(on_device(path, &device_id))
    }

    async fn put(&self, path: &str) -> DeviceResult<()> {
        let path = self.command_path(path).await?;
        self.client
            .put(&path)
            .await
            .map_err(WebApiError::into_device_error)
    }

    async fn post(&self, path: &str) -> DeviceResult<()> {
        let path = self.command_path(path).await?;
        self.client
            .post(&path)
            .await
            .map_err(WebApiError::into_device_error)
    }

    fn start_polling(&self, events: mpsc::Sender<DeviceEvent>) -> DeviceResult<()> {
        let mut poller = self
            .poller
            .lock()
            .map_err(|_| DeviceError::initialization("device poller lock poisoned"))?;
        if let Some(previous) = poller.take() {
            previous.abort();
        }

        let interval = Duration::from_millis(self.client.config().poll_interval_ms);
        let client = self.client.clone();
        let device_id = Arc::clone(&self.device_id);
        *poller = Some(tokio::spawn(poll_state(client, device_id, events, interval)));
        Ok(())
    }
}

impl Drop for RemoteDevice {
    fn drop(&mut self) {
        if let Ok(mut poller) = self.poller.lock() {
            if let Some(handle) = poller.take() {
                handle.abort();
            }
        }
    }
}

/// Forward state changes until the receiver goes away or the session dies
async fn poll_state(
    client: WebApiClient,
    device_id: Arc<RwLock<Option<String>>>,
    events: mpsc::Sender<DeviceEvent>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last: Option<Option<DeviceState>> = None;

    loop {
        ticker.tick().await;

        let event = match client.get_json::<PlaybackStateResponse>("/me/player").await {
            Ok(response) => {
                let ours = device_id.read().await.clone();
                // playback moved to another device: report nothing sounding here
                let state = response
                    .filter(|state| {
                        state.device.as_ref().and_then(|device| device.id.as_ref()) == ours.as_ref()
                    })
                    .map(DeviceState::from);
                if last.as_ref() == Some(&state) {
                    continue;
                }
                last = Some(state.clone());
                DeviceEvent::StateChanged(state)
            }
            Err(e) => {
                let error = e.into_device_error();
                match error.kind {
                    DeviceErrorKind::Authentication => {
                        let _ = events.send(DeviceEvent::AuthenticationError(error.message)).await;
                        break;
                    }
                    DeviceErrorKind::AccountIneligible => {
                        let _ = events.send(DeviceEvent::AccountError(error.message)).await;
                        break;
                    }
                    _ => {
                        debug!(error = %error, "Polling device state failed");
                        continue;
                    }
                }
            }
        };

        if events.send(event).await.is_err() {
            debug!("Player stopped, ending device poll");
            break;
        }
    }
}

#[async_trait]
impl DeviceSdk for RemoteDevice {
    async fn connect(
        &self,
        name: &str,
        tokens: TokenProvider,
        events: mpsc::Sender<DeviceEvent>,
    ) -> DeviceResult<()> {
        tokens.token().await?;

        let devices = self
            .client
            .get_json::<DevicesResponse>("/me/player/devices")
            .await
            .map_err(WebApiError::into_device_error)?
            .map(|response| response.devices)
            .unwrap_or_default();

        let Some(device_id) = devices
            .into_iter()
            .find(|device| device.name.eq_ignore_ascii_case(name))
            .and_then(|device| device.id)
        else {
            warn!(name = %name, "No matching device found");
            return Err(DeviceError::initialization(format!(
                "No device named {name} is available"
            )));
        };

        info!(device_id = %device_id, name = %name, "Remote device found");
        *self.device_id.write().await = Some(device_id.clone());
        self.start_polling(events.clone())?;

        events
            .send(DeviceEvent::Ready { device_id })
            .await
            .map_err(|_| DeviceError::initialization("player stopped"))
    }

    async fn resume(&self) -> DeviceResult<()> {
        self.put("/me/player/play").await
    }

    async fn pause(&self) -> DeviceResult<()> {
        self.put("/me/player/pause").await
    }

    async fn seek(&self, position_ms: u64) -> DeviceResult<()> {
        self.put(&format!("/me/player/seek?position_ms={position_ms}"))
            .await
    }

    async fn next_track(&self) -> DeviceResult<()> {
        self.post("/me/player/next").await
    }

    async fn previous_track(&self) -> DeviceResult<()> {
        self.post("/me/player/previous").await
    }

    async fn set_volume(&self, volume: f32) -> DeviceResult<()> {
        let percent = (volume.clamp(0.0, 1.0) * 100.0).round() as u8;
        self.put(&format!("/me/player/volume?volume_percent={percent}"))
            .await
    }
}
