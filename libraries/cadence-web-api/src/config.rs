//! Web API configuration

use crate::error::{Result, WebApiError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file looked up in the working directory
pub const CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WebApiConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_accounts_base_url")]
    pub accounts_base_url: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How often the remote device is polled for state
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Pre-issued token, used until it is rejected
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for WebApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            accounts_base_url: default_accounts_base_url(),
            client_id: String::new(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            refresh_token: None,
            access_token: None,
        }
    }
}

impl WebApiConfig {
    /// Load from `path` (or `cadence.toml` when it exists) and the environment
    ///
    /// Environment variables are prefixed with `CADENCE_`, e.g.
    /// `CADENCE_REFRESH_TOKEN`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = Path::new(CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(config::Environment::with_prefix("CADENCE").try_parsing(true));

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.api_base_url)?;
        validate_url(&self.accounts_base_url)?;

        if self.access_token.is_none() && self.refresh_token.is_none() {
            return Err(WebApiError::Config(
                "No credentials (set CADENCE_REFRESH_TOKEN or CADENCE_ACCESS_TOKEN)".to_string(),
            ));
        }

        if self.refresh_token.is_some() && self.client_id.is_empty() {
            return Err(WebApiError::Config(
                "A client id is required to refresh tokens (set CADENCE_CLIENT_ID)".to_string(),
            ));
        }

        if self.timeout_secs == 0 || self.poll_interval_ms == 0 {
            return Err(WebApiError::Config(
                "Timeouts and poll interval must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), path)
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(WebApiError::InvalidUrl("URL cannot be empty".into()));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(WebApiError::InvalidUrl(format!(
            "{url} must start with http:// or https://"
        )));
    }
    url::Url::parse(url).map_err(|e| WebApiError::InvalidUrl(format!("{url}: {e}")))?;
    Ok(())
}

// Default values
fn default_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_accounts_base_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}
