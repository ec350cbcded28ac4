use std::sync::Arc;

use facebot_chat::api::{ChatApi, NoopChatApi};
use facebot_chat::dispatch::CommandDispatcher;
use facebot_chat::health::{ComponentHealth, HealthReporter};
use facebot_chat::runner::{BotRunner, NoopEventTransport, RetryWindow};
use facebot_core::config::{AppConfig, ConfigError, LoadOptions};
use facebot_core::ledger::{FaceScoreRepository, InMemoryFaceScoreRepository};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub health: Arc<RuntimeHealthReporter>,
    pub runner: BotRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Component health backed by the live ledger store.
pub struct RuntimeHealthReporter {
    ledger: Arc<dyn FaceScoreRepository>,
}

impl RuntimeHealthReporter {
    pub fn new(ledger: Arc<dyn FaceScoreRepository>) -> Self {
        Self { ledger }
    }
}

#[async_trait::async_trait]
impl HealthReporter for RuntimeHealthReporter {
    async fn check(&self) -> Vec<ComponentHealth> {
        let ledger = match self.ledger.user_face_counts().await {
            Ok(counts) => ComponentHealth::healthy(
                "ledger",
                format!("face-score store reachable ({} users tracked)", counts.len()),
            ),
            Err(error) => {
                ComponentHealth::degraded("ledger", format!("store query failed: {error}"))
            }
        };

        vec![ComponentHealth::healthy("service", "facebot-server runtime initialized"), ledger]
    }
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(event_name = "bootstrap.begin", "bootstrapping application");
    bootstrap_with_config(AppConfig::load(options)?).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let ledger: Arc<dyn FaceScoreRepository> = Arc::new(InMemoryFaceScoreRepository::new());
    let health = Arc::new(RuntimeHealthReporter::new(ledger.clone()));

    // The real REST client and WebSocket transport are wired in by the
    // deployment; the defaults keep the process healthy without credentials.
    let api: Arc<dyn ChatApi> = Arc::new(NoopChatApi);
    let dispatcher = Arc::new(CommandDispatcher::new(
        config.bot.clone(),
        api,
        ledger.clone(),
        health.clone(),
    ));
    let runner =
        BotRunner::new(Arc::new(NoopEventTransport), dispatcher, RetryWindow::default());

    info!(
        event_name = "bootstrap.ready",
        bot_name = %config.bot.name,
        command_prefix = %config.bot.command_prefix,
        "application components wired"
    );

    Ok(Application { config, health, runner })
}
