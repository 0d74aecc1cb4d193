use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::provider::TppClient;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: HashMap<String, DependencyStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyStatus {
    Healthy { status: String, latency_ms: u64 },
    Unhealthy { status: String, error: String },
}

#[async_trait]
pub trait DependencyChecker: Send + Sync {
    async fn check(&self) -> DependencyStatus;
}

pub struct PostgresChecker {
    pool: sqlx::PgPool,
}

impl PostgresChecker {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DependencyChecker for PostgresChecker {
    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => DependencyStatus::Healthy {
                status: "healthy".to_string(),
                latency_ms: start.elapsed().as_millis() as u64,
            },
            Err(e) => DependencyStatus::Unhealthy {
                status: "unhealthy".to_string(),
                error: e.to_string(),
            },
        }
    }
}

pub struct ProviderChecker {
    client: TppClient,
}

impl ProviderChecker {
    pub fn new(client: TppClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DependencyChecker for ProviderChecker {
    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match self.client.balance().await {
            Ok(_) => DependencyStatus::Healthy {
                status: "healthy".to_string(),
                latency_ms: start.elapsed().as_millis() as u64,
            },
            Err(e) => DependencyStatus::Unhealthy {
                status: "unhealthy".to_string(),
                error: format!("{} (circuit {})", e, self.client.circuit_state()),
            },
        }
    }
}

pub async fn check_health(
    postgres: PostgresChecker,
    provider: ProviderChecker,
    start_time: Instant,
) -> HealthResponse {
    let timeout_duration = Duration::from_secs(5);

    let (postgres_result, provider_result) = tokio::join!(
        timeout(timeout_duration, postgres.check()),
        timeout(timeout_duration, provider.check())
    );

    let mut dependencies = HashMap::new();

    dependencies.insert(
        "postgres".to_string(),
        postgres_result.unwrap_or_else(|_| DependencyStatus::Unhealthy {
            status: "unhealthy".to_string(),
            error: "timeout".to_string(),
        }),
    );

    dependencies.insert(
        "provider".to_string(),
        provider_result.unwrap_or_else(|_| DependencyStatus::Unhealthy {
            status: "unhealthy".to_string(),
            error: "timeout".to_string(),
        }),
    );

    let overall_status = determine_overall_status(&dependencies);

    HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        dependencies,
    }
}

fn determine_overall_status(dependencies: &HashMap<String, DependencyStatus>) -> String {
    // The database is the only critical dependency; a slow or flaky provider
    // degrades service but the ledger remains authoritative.
    let critical_deps = ["postgres"];
    let mut has_critical_failure = false;
    let mut has_non_critical_failure = false;

    for (name, status) in dependencies {
        if matches!(status, DependencyStatus::Unhealthy { .. }) {
            if critical_deps.contains(&name.as_str()) {
                has_critical_failure = true;
            } else {
                has_non_critical_failure = true;
            }
        }
    }

    if has_critical_failure {
        "unhealthy".to_string()
    } else if has_non_critical_failure {
        "degraded".to_string()
    } else {
        "healthy".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> DependencyStatus {
        DependencyStatus::Healthy {
            status: "healthy".to_string(),
            latency_ms: 1,
        }
    }

    fn unhealthy() -> DependencyStatus {
        DependencyStatus::Unhealthy {
            status: "unhealthy".to_string(),
            error: "boom".to_string(),
        }
    }

    #[test]
    fn test_all_healthy() {
        let deps = HashMap::from([
            ("postgres".to_string(), healthy()),
            ("provider".to_string(), healthy()),
        ]);
        assert_eq!(determine_overall_status(&deps), "healthy");
    }

    #[test]
    fn test_provider_down_is_degraded() {
        let deps = HashMap::from([
            ("postgres".to_string(), healthy()),
            ("provider".to_string(), unhealthy()),
        ]);
        assert_eq!(determine_overall_status(&deps), "degraded");
    }

    #[test]
    fn test_postgres_down_is_unhealthy() {
        let deps = HashMap::from([
            ("postgres".to_string(), unhealthy()),
            ("provider".to_string(), healthy()),
        ]);
        assert_eq!(determine_overall_status(&deps), "unhealthy");
    }
}
