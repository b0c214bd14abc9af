//! Tests for the Web API adapters.
//!
//! These tests use mock servers to verify client behavior without
//! requiring a real service connection.

use cadence_core::{Catalog, CatalogError, RadioSource, TokenSource, TrackId};
use cadence_playback::{
    DeviceErrorKind, DeviceEvent, DeviceSdk, PlaybackRequester, PlayerBuilder, PlayerState,
    TokenProvider,
};
use cadence_web_api::{
    RemoteDevice, WebApiClient, WebApiConfig, WebApiError, WebCatalog, WebPlaybackRequester,
    WebRadio,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Helpers
// =============================================================================

fn config_for(server: &MockServer) -> WebApiConfig {
    WebApiConfig {
        api_base_url: server.uri(),
        accounts_base_url: server.uri(),
        client_id: "client-1".to_string(),
        poll_interval_ms: 20,
        refresh_token: Some("refresh-1".to_string()),
        access_token: Some("access-1".to_string()),
        ..WebApiConfig::default()
    }
}

fn client_for(server: &MockServer) -> WebApiClient {
    WebApiClient::new(config_for(server)).unwrap()
}

fn track_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("Track {id}"),
        "artists": [{"id": "artist-1", "name": "Artist"}],
        "album": {"id": "album-1", "name": "Album", "images": [{"url": "https://img/1"}]},
        "duration_ms": 180000
    })
}

fn devices_json() -> serde_json::Value {
    json!({"devices": [
        {"id": "other", "name": "Kitchen", "is_active": true},
        {"id": "dev-1", "name": "Cadence", "is_active": false}
    ]})
}

async fn mount_token_grant(server: &MockServer, access_token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .and(body_string_contains("client_id=client-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(server)
        .await;
}

// =============================================================================
// Token Store Tests
// =============================================================================

mod token_store {
    use super::*;

    #[tokio::test]
    async fn test_pre_issued_token_used_without_refresh() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let token = client.tokens().access_token().await.unwrap();
        assert_eq!(token.value, "access-1");
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn test_missing_token_triggers_refresh_grant() {
        let server = MockServer::start().await;
        mount_token_grant(&server, "fresh").await;

        let client = WebApiClient::new(WebApiConfig {
            access_token: None,
            ..config_for(&server)
        })
        .unwrap();

        let provider = TokenProvider::new(client.tokens());
        assert_eq!(provider.token().await.unwrap(), "fresh");
        // cached afterwards; the grant mock expects exactly one call
        assert_eq!(provider.token().await.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_rejected_refresh_is_authentication_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
            )
            .mount(&server)
            .await;

        let client = WebApiClient::new(WebApiConfig {
            access_token: None,
            ..config_for(&server)
        })
        .unwrap();

        assert!(matches!(
            client.tokens().refresh().await,
            Err(WebApiError::TokenRefreshFailed(_))
        ));
        assert!(!client.tokens().refresh_access_token().await);

        let err = TokenProvider::new(client.tokens()).token().await.unwrap_err();
        assert_eq!(err.kind, DeviceErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "first",
                "expires_in": 3600,
                "refresh_token": "refresh-2"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("refresh_token=refresh-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "second",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.tokens().refresh().await.unwrap().value, "first");
        assert_eq!(client.tokens().refresh().await.unwrap().value, "second");
    }
}

// =============================================================================
// Request Tests
// =============================================================================

mod requests {
    use super::*;

    #[tokio::test]
    async fn test_bearer_token_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/player"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"is_playing": true})))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(&server)
            .request(reqwest::Method::GET, "/me/player", None)
            .await
            .unwrap();
        assert_eq!(body, Some(json!({"is_playing": true})));
    }

    #[tokio::test]
    async fn test_no_content_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/player"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let body = client_for(&server)
            .request(reqwest::Method::GET, "/me/player", None)
            .await
            .unwrap();
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_refreshes_and_retries_once() {
        let server = MockServer::start().await;
        mount_token_grant(&server, "fresh").await;
        Mock::given(method("GET"))
            .and(path("/tracks/1"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tracks/1"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(track_json("1")))
            .expect(1)
            .mount(&server)
            .await;

        let track = WebCatalog::new(client_for(&server))
            .fetch_track(&TrackId::from(1u64))
            .await
            .unwrap();
        assert_eq!(track.name, "Track 1");
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/player"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .request(reqwest::Method::GET, "/me/player", None)
            .await;
        assert!(matches!(
            result,
            Err(WebApiError::RateLimited { retry_after_secs: 7 })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let config = WebApiConfig {
            api_base_url: "http://127.0.0.1:1".to_string(),
            access_token: Some("access-1".to_string()),
            ..WebApiConfig::default()
        };

        let result = WebApiClient::new(config)
            .unwrap()
            .request(reqwest::Method::GET, "/me/player", None)
            .await;
        assert!(matches!(result, Err(WebApiError::Unreachable(_))));
    }
}

// =============================================================================
// Catalog Tests
// =============================================================================

mod catalog {
    use super::*;

    #[tokio::test]
    async fn test_fetch_track_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tracks/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(track_json("abc")))
            .mount(&server)
            .await;

        let catalog = WebCatalog::new(client_for(&server));
        let track = catalog
            .fetch_track(&TrackId::new("spotify:track:abc"))
            .await
            .unwrap();

        assert_eq!(track.id.as_str(), "abc");
        assert_eq!(track.album.unwrap().art.as_deref(), Some("https://img/1"));
        assert_eq!(track.duration_ms, 180_000);
    }

    #[tokio::test]
    async fn test_missing_track_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tracks/404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"status": 404, "message": "Non existing id"}
            })))
            .mount(&server)
            .await;

        let id = TrackId::from(404u64);
        let err = WebCatalog::new(client_for(&server))
            .fetch_track(&id)
            .await
            .unwrap_err();
        assert_eq!(err, CatalogError::NotFound(id));
    }

    #[tokio::test]
    async fn test_server_error_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tracks/1"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway"))
            .mount(&server)
            .await;

        let err = WebCatalog::new(client_for(&server))
            .fetch_track(&TrackId::from(1u64))
            .await
            .unwrap_err();
        match err {
            CatalogError::Transport(msg) => assert!(msg.contains("Bad gateway")),
            other => panic!("Expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_radio_seeds_from_top_tracks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/top/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [track_json("s1"), track_json("s2")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/recommendations"))
            .and(query_param("seed_tracks", "s1,s2"))
            .and(query_param("limit", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": [track_json("r1"), track_json("r2"), track_json("r3")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let batch = WebRadio::new(client_for(&server), 3)
            .recommend()
            .await
            .unwrap();
        assert_eq!(
            batch,
            vec![TrackId::new("r1"), TrackId::new("r2"), TrackId::new("r3")]
        );
    }

    #[tokio::test]
    async fn test_radio_without_history_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/top/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let result = WebRadio::new(client_for(&server), 10).recommend().await;
        assert!(matches!(result, Err(CatalogError::Transport(_))));
    }
}

// =============================================================================
// Remote Device Tests
// =============================================================================

mod remote_device {
    use super::*;

    async fn mount_devices(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/me/player/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(devices_json()))
            .mount(server)
            .await;
    }

    async fn next_event(events: &mut mpsc::Receiver<DeviceEvent>) -> DeviceEvent {
        tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("timed out waiting for device event")
            .expect("device dropped the sender")
    }

    #[tokio::test]
    async fn test_start_playback_sends_uris_to_device() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/me/player/play"))
            .and(query_param("device_id", "dev-1"))
            .and(body_json(json!({"uris": ["spotify:track:1"]})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        WebPlaybackRequester::new(client_for(&server))
            .start_playback("dev-1", &["spotify:track:1".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_forbidden_playback_is_account_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/me/player/play"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"status": 403, "message": "Player command failed: Premium required"}
            })))
            .mount(&server)
            .await;

        let err = WebPlaybackRequester::new(client_for(&server))
            .start_playback("dev-1", &["spotify:track:1".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind, DeviceErrorKind::AccountIneligible);
        assert!(err.message.contains("Premium required"));
    }

    #[tokio::test]
    async fn test_connect_selects_device_by_name_and_polls() {
        let server = MockServer::start().await;
        mount_devices(&server).await;
        Mock::given(method("GET"))
            .and(path("/me/player"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "device": {"id": "dev-1", "name": "Cadence", "is_active": true},
                "is_playing": true,
                "progress_ms": 5000,
                "item": track_json("1")
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let device = RemoteDevice::new(client.clone());
        let (tx, mut events) = mpsc::channel(16);
        device
            .connect("cadence", TokenProvider::new(client.tokens()), tx)
            .await
            .unwrap();
        assert_eq!(device.device_id().await.as_deref(), Some("dev-1"));

        let mut ready = false;
        let mut state = None;
        while !ready || state.is_none() {
            match next_event(&mut events).await {
                DeviceEvent::Ready { device_id } => {
                    assert_eq!(device_id, "dev-1");
                    ready = true;
                }
                DeviceEvent::StateChanged(reported) => state = reported,
                other => panic!("Unexpected event {other:?}"),
            }
        }

        let state = state.unwrap();
        assert!(!state.paused);
        assert_eq!(state.position_ms, 5000);
        assert_eq!(state.current_track.unwrap().id, "1");
    }

    #[tokio::test]
    async fn test_connect_without_matching_device_fails() {
        let server = MockServer::start().await;
        mount_devices(&server).await;

        let client = client_for(&server);
        let (tx, _events) = mpsc::channel(16);
        let err = RemoteDevice::new(client.clone())
            .connect("Living Room", TokenProvider::new(client.tokens()), tx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, DeviceErrorKind::Initialization);
    }

    #[tokio::test]
    async fn test_commands_target_selected_device() {
        let server = MockServer::start().await;
        mount_devices(&server).await;
        Mock::given(method("GET"))
            .and(path("/me/player"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/me/player/seek"))
            .and(query_param("position_ms", "30000"))
            .and(query_param("device_id", "dev-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/me/player/volume"))
            .and(query_param("volume_percent", "50"))
            .and(query_param("device_id", "dev-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/me/player/next"))
            .and(query_param("device_id", "dev-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let device = RemoteDevice::new(client.clone());
        let (tx, _events) = mpsc::channel(16);
        device
            .connect("Cadence", TokenProvider::new(client.tokens()), tx)
            .await
            .unwrap();

        device.seek(30_000).await.unwrap();
        device.set_volume(0.5).await.unwrap();
        device.next_track().await.unwrap();
    }

    #[tokio::test]
    async fn test_commands_before_connect_fail() {
        let server = MockServer::start().await;
        let err = RemoteDevice::new(client_for(&server))
            .pause()
            .await
            .unwrap_err();
        assert_eq!(err.kind, DeviceErrorKind::Playback);
    }
}

// =============================================================================
// Player Wiring Tests
// =============================================================================

mod player_wiring {
    use super::*;

    #[tokio::test]
    async fn test_play_list_loads_first_track_on_remote_device() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/player/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(devices_json()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/me/player"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tracks/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(track_json("1")))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/me/player/play"))
            .and(query_param("device_id", "dev-1"))
            .and(body_json(json!({"uris": ["spotify:track:1"]})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        // resume after the load
        Mock::given(method("PUT"))
            .and(path("/me/player/play"))
            .and(query_param("device_id", "dev-1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (player, handle) = PlayerBuilder::new(
            Arc::new(RemoteDevice::new(client.clone())),
            Arc::new(WebPlaybackRequester::new(client.clone())),
            Arc::new(WebCatalog::new(client.clone())),
            client.tokens(),
        )
        .build();
        tokio::spawn(player.run());

        handle.connect().await.unwrap();
        tokio::time::timeout(
            Duration::from_secs(2),
            handle.wait_for(|s| s.device_id.is_some()),
        )
        .await
        .expect("device never became ready")
        .unwrap();

        handle
            .play_list(
                vec![TrackId::from(1u64), TrackId::from(2u64)],
                Default::default(),
                None,
                true,
            )
            .await
            .unwrap();

        let snapshot = tokio::time::timeout(
            Duration::from_secs(2),
            handle.wait_for(|s| s.state == PlayerState::Playing && s.is_idle()),
        )
        .await
        .expect("track never started")
        .unwrap();

        assert_eq!(snapshot.current_track_id(), Some(&TrackId::from(1u64)));
        assert_eq!(
            snapshot.current_track.unwrap().name,
            "Track 1".to_string()
        );
    }
}

// =============================================================================
// Config Tests
// =============================================================================

mod config_loading {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
client_id = "file-client"
refresh_token = "file-refresh"
poll_interval_ms = 250
"#
        )
        .unwrap();

        let config = WebApiConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.client_id, "file-client");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.api_base_url, "https://api.spotify.com/v1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = WebApiConfig::load(Some(std::path::Path::new("/nonexistent/cadence.toml")));
        assert!(matches!(result, Err(WebApiError::Config(_))));
    }
}
