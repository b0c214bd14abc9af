//! Token store backing the device's token callback.

use crate::config::WebApiConfig;
use crate::error::{Result, WebApiError};
use crate::types::TokenResponse;
use async_trait::async_trait;
use cadence_core::{AccessToken, TokenSource};
use reqwest::Client;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Lifetime assumed for a pre-issued access token
const PRE_ISSUED_TOKEN_SECS: i64 = 3600;

#[derive(Debug, Default)]
struct TokenState {
    access: Option<AccessToken>,
    refresh_token: Option<String>,
}

/// Caches the access token and renews it with the refresh-token grant.
pub struct TokenStore {
    http: Client,
    token_url: String,
    client_id: String,
    state: RwLock<TokenState>,
    // serializes refreshes so concurrent callers share one grant
    refresh_lock: Mutex<()>,
}

impl TokenStore {
    pub fn new(http: Client, config: &WebApiConfig) -> Self {
        let state = TokenState {
            access: config
                .access_token
                .as_ref()
                .map(|token| AccessToken::expiring_in(token.clone(), PRE_ISSUED_TOKEN_SECS)),
            refresh_token: config.refresh_token.clone(),
        };

        Self {
            http,
            token_url: format!("{}/api/token", config.accounts_base_url.trim_end_matches('/')),
            client_id: config.client_id.clone(),
            state: RwLock::new(state),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The cached token, expired or not
    pub async fn current(&self) -> Option<AccessToken> {
        self.state.read().await.access.clone()
    }

    /// A token that has not expired, refreshing first when needed
    pub async fn valid_token(&self) -> Result<String> {
        if let Some(token) = self.unexpired().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        // another caller may have refreshed while we waited
        if let Some(token) = self.unexpired().await {
            return Ok(token);
        }
        Ok(self.refresh_locked().await?.value)
    }

    /// Force a refresh with the stored refresh token
    pub async fn refresh(&self) -> Result<AccessToken> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Drop the cached access token after the service rejected it
    pub async fn invalidate(&self) {
        self.state.write().await.access = None;
    }

    async fn unexpired(&self) -> Option<String> {
        self.state
            .read()
            .await
            .access
            .as_ref()
            .filter(|token| !token.is_expired())
            .map(|token| token.value.clone())
    }

    async fn refresh_locked(&self) -> Result<AccessToken> {
        let refresh_token = self
            .state
            .read()
            .await
            .refresh_token
            .clone()
            .ok_or(WebApiError::AuthRequired)?;

        debug!(url = %self.token_url, "Refreshing access token");

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
            ])
            .send()
            .await
            .map_err(WebApiError::from_send)?;

        let status = response.status();

        if status.is_success() {
            let body: TokenResponse = response.json().await.map_err(|e| {
                WebApiError::ParseError(format!("Failed to parse token response: {}", e))
            })?;

            let token = AccessToken::expiring_in(body.access_token, body.expires_in);
            let mut state = self.state.write().await;
            state.access = Some(token.clone());
            if let Some(rotated) = body.refresh_token {
                state.refresh_token = Some(rotated);
            }

            info!(expires_in = body.expires_in, "Access token refreshed");
            Ok(token)
        } else if status.as_u16() == 400 || status.as_u16() == 401 {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Refresh token rejected");
            Err(WebApiError::TokenRefreshFailed(
                "Refresh token expired or revoked".to_string(),
            ))
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(WebApiError::ServiceError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }
}

#[async_trait]
impl TokenSource for TokenStore {
    async fn access_token(&self) -> Option<AccessToken> {
        self.current().await
    }

    async fn refresh_access_token(&self) -> bool {
        match self.refresh().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Could not refresh access token");
                false
            }
        }
    }
}
