mod bootstrap;
mod health;

use anyhow::Result;
use facebot_core::config::{AppConfig, LoadOptions, LogFormat};

fn init_logging(config: &AppConfig) {
    let level = config.logging.level.parse().unwrap_or(tracing::Level::INFO);
    let builder = tracing_subscriber::fmt().with_target(false).with_max_level(level);
    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging comes up right after the config it is configured by.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    health::spawn(&app.config.server, app.health.clone()).await?;

    tracing::info!(
        event_name = "server.started",
        command_prefix = %app.config.bot.command_prefix,
        "facebot-server up"
    );

    app.runner.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!(event_name = "server.stopping", "facebot-server shutting down");

    Ok(())
}
