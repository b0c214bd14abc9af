/// Cadence - headless music player
use cadence_cli::cli::{Cli, Commands};
use cadence_cli::commands::{self, PlayOptions};
use cadence_cli::config::CliConfig;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Track { ids } => {
            commands::show_tracks(&config, &ids).await?;
        }
        Commands::Devices => {
            commands::list_devices(&config).await?;
        }
        Commands::Play {
            ids,
            device,
            start,
            shuffle,
            reversed,
            repeat,
            paused,
        } => {
            let options = PlayOptions {
                ids,
                device,
                start,
                shuffle,
                reversed,
                repeat,
                paused,
            };
            commands::play(&config, options).await?;
        }
        Commands::Radio { device, batch } => {
            commands::radio(&config, device, batch).await?;
        }
        Commands::Resume { device } => {
            commands::resume(&config, device).await?;
        }
    }

    Ok(())
}
