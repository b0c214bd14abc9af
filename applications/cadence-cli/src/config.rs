/// CLI configuration
use cadence_playback::PlayerConfig;
use cadence_web_api::{WebApiConfig, CONFIG_FILE};
use std::path::{Path, PathBuf};

/// Where the session is saved when no `session_path` is configured
pub const DEFAULT_SESSION_FILE: &str = "cadence-session.json";

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub web_api: WebApiConfig,
    pub player: PlayerConfig,
    pub session_path: PathBuf,
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// Web API settings sit at the top level of the file, player settings in
    /// a `[player]` table. Environment variables use the `CADENCE_` prefix;
    /// player settings take a double underscore (`CADENCE_PLAYER__VOLUME`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let web_api = WebApiConfig::load(path)?;

        let mut settings = config::Config::builder();

        // Same file lookup as the Web API settings
        let file = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(CONFIG_FILE)).filter(|path| path.exists()),
        };
        if let Some(file) = file {
            settings = settings.add_source(config::File::from(file));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .separator("__")
                .try_parsing(true),
        );

        let settings = settings.build()?;

        let player = optional(settings.get::<PlayerConfig>("player"))?.unwrap_or_default();
        let session_path = optional(settings.get::<PathBuf>("session_path"))?
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));

        Ok(Self {
            web_api,
            player,
            session_path,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.web_api.validate()?;

        if !(0.0..=1.0).contains(&self.player.volume) {
            anyhow::bail!(
                "player volume must be between 0.0 and 1.0, got {}",
                self.player.volume
            );
        }
        if self.player.device_name.trim().is_empty() {
            anyhow::bail!("player device_name cannot be empty");
        }

        Ok(())
    }
}

/// Missing keys fall back to defaults, malformed ones are errors
fn optional<T>(value: Result<T, config::ConfigError>) -> anyhow::Result<Option<T>> {
    match value {
        Ok(value) => Ok(Some(value)),
        Err(config::ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
