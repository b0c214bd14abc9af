//! Authenticated client for the streaming-service Web API.

use crate::auth::TokenStore;
use crate::config::WebApiConfig;
use crate::error::{Result, WebApiError};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the Web API.
///
/// Every request carries the bearer token from the shared [`TokenStore`].
/// A `401` drops the cached token and the request is retried once with a
/// fresh one.
///
/// # Example
///
/// ```ignore
/// use cadence_web_api::{WebApiClient, WebApiConfig};
///
/// let client = WebApiClient::new(WebApiConfig::load(None)?)?;
/// let state = client.request(reqwest::Method::GET, "/me/player", None).await?;
/// ```
#[derive(Clone)]
pub struct WebApiClient {
    http: Client,
    config: Arc<WebApiConfig>,
    tokens: Arc<TokenStore>,
}

impl WebApiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: WebApiConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Cadence/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(WebApiError::Request)?;

        let tokens = Arc::new(TokenStore::new(http.clone(), &config));

        Ok(Self {
            http,
            config: Arc::new(config),
            tokens,
        })
    }

    pub fn config(&self) -> &WebApiConfig {
        &self.config
    }

    /// The token store shared with the playback device
    pub fn tokens(&self) -> Arc<TokenStore> {
        Arc::clone(&self.tokens)
    }

    /// Authenticated request returning the JSON body, or `None` for an empty one
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let response = self.send(method, path, body).await?;
        read_json(response).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        read_json(response).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send(Method::PUT, path, Some(body)).await?;
        Ok(())
    }

    pub async fn put(&self, path: &str) -> Result<()> {
        self.send(Method::PUT, path, None::<&()>).await?;
        Ok(())
    }

    pub async fn post(&self, path: &str) -> Result<()> {
        self.send(Method::POST, path, None::<&()>).await?;
        Ok(())
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let url = self.config.api_url(path);
        let mut retried = false;

        loop {
            let token = self.tokens.valid_token().await?;
            let mut request = self.http.request(method.clone(), &url).bearer_auth(&token);
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(method = %method, url = %url, "Web API request");
            let response = request.send().await.map_err(WebApiError::from_send)?;

            if response.status() == StatusCode::UNAUTHORIZED && !retried {
                warn!(url = %url, "Access token rejected, refreshing");
                self.tokens.invalidate().await;
                retried = true;
                continue;
            }

            return check_status(response).await;
        }
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or(1);
        return Err(WebApiError::RateLimited { retry_after_secs });
    }

    let error_text = response.text().await.unwrap_or_default();
    let message = service_message(&error_text);
    if status == StatusCode::UNAUTHORIZED {
        Err(WebApiError::AuthFailed(message))
    } else {
        Err(WebApiError::ServiceError {
            status: status.as_u16(),
            message,
        })
    }
}

/// `{"error": {"message": ..}}` bodies collapse to their message
fn service_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(None);
    }

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| WebApiError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_message_prefers_error_object() {
        assert_eq!(
            service_message(r#"{"error": {"status": 404, "message": "Non existing id"}}"#),
            "Non existing id"
        );
        assert_eq!(service_message("Bad gateway"), "Bad gateway");
    }

    #[test]
    fn new_rejects_invalid_config() {
        let result = WebApiClient::new(WebApiConfig::default());
        assert!(matches!(result, Err(WebApiError::Config(_))));
    }
}
