use async_trait::async_trait;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Stamp-markup badge used in chat-rendered health tables.
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Healthy => ":white_check_mark:",
            Self::Degraded => ":warning:",
            Self::Unhealthy => ":x:",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub detail: String,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { name: name.into(), status: HealthStatus::Healthy, detail: detail.into() }
    }

    pub fn degraded(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { name: name.into(), status: HealthStatus::Degraded, detail: detail.into() }
    }
}

/// On-demand component health, consumed by the `status` command and the
/// server's health endpoint. There is no polling; every check runs when
/// asked.
#[async_trait]
pub trait HealthReporter: Send + Sync {
    async fn check(&self) -> Vec<ComponentHealth>;
}

#[derive(Default)]
pub struct NoopHealthReporter;

#[async_trait]
impl HealthReporter for NoopHealthReporter {
    async fn check(&self) -> Vec<ComponentHealth> {
        vec![ComponentHealth::healthy("service", "runtime initialized")]
    }
}
