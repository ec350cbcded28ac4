use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use facebot_chat::health::{HealthReporter, HealthStatus};
use facebot_core::config::ServerConfig;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    reporter: Arc<dyn HealthReporter>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheckEntry {
    pub name: String,
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub components: Vec<HealthCheckEntry>,
    pub checked_at: String,
}

pub fn router(reporter: Arc<dyn HealthReporter>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { reporter })
}

/// Binds the health listener and serves it on a background task. Bind
/// failures surface immediately; serve failures only log, since the bot loop
/// should outlive a broken health endpoint.
pub async fn spawn(server: &ServerConfig, reporter: Arc<dyn HealthReporter>) -> std::io::Result<()> {
    let address = format!("{}:{}", server.bind_address, server.health_port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(event_name = "health.listening", address = %address, "health endpoint listening");

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(reporter)).await {
            error!(event_name = "health.serve_error", error = %error, "health endpoint terminated");
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let components: Vec<HealthCheckEntry> = state
        .reporter
        .check()
        .await
        .into_iter()
        .map(|component| HealthCheckEntry {
            name: component.name,
            status: status_label(component.status),
            detail: component.detail,
        })
        .collect();

    let degraded = components.iter().any(|component| component.status != "ready");
    let payload = HealthResponse {
        status: if degraded { "degraded" } else { "ready" },
        components,
        checked_at: Utc::now().to_rfc3339(),
    };

    let code = if degraded { StatusCode::SERVICE_UNAVAILABLE } else { StatusCode::OK };
    (code, Json(payload))
}

fn status_label(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Healthy => "ready",
        HealthStatus::Degraded | HealthStatus::Unhealthy => "degraded",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};
    use facebot_chat::health::{ComponentHealth, HealthReporter, HealthStatus, NoopHealthReporter};

    use super::{health, HealthState};

    struct DegradedReporter;

    #[async_trait]
    impl HealthReporter for DegradedReporter {
        async fn check(&self) -> Vec<ComponentHealth> {
            vec![
                ComponentHealth::healthy("service", "runtime initialized"),
                ComponentHealth {
                    name: "ledger".to_owned(),
                    status: HealthStatus::Unhealthy,
                    detail: "store unavailable".to_owned(),
                },
            ]
        }
    }

    #[tokio::test]
    async fn health_returns_ready_when_all_components_are_healthy() {
        let (status, Json(payload)) =
            health(State(HealthState { reporter: Arc::new(NoopHealthReporter) })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert!(payload.components.iter().all(|component| component.status == "ready"));
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_a_component_degrades() {
        let (status, Json(payload)) =
            health(State(HealthState { reporter: Arc::new(DegradedReporter) })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.components[1].status, "degraded");
    }
}
