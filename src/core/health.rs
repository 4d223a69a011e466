use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::explain::Explainer;
use crate::inference::Ensemble;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub components: ComponentHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub scaler: bool,
    pub models: Vec<String>,
    pub explainer: bool,
}

/// Reports readiness of the loaded engine. The process stays "online"
/// even when degraded; inference requests then get "not ready" answers.
#[derive(Clone)]
pub struct HealthChecker {
    start_time: std::time::Instant,
    started_at: DateTime<Utc>,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            start_time: std::time::Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn get_status(&self, ensemble: &Ensemble, explainer: &Explainer) -> HealthStatus {
        let components = ComponentHealth {
            scaler: ensemble.has_normalizer(),
            models: ensemble.registry().ids().map(String::from).collect(),
            explainer: explainer.is_configured(),
        };

        HealthStatus {
            status: if ensemble.is_ready() {
                "online".to_string()
            } else {
                "degraded".to_string()
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: self.started_at,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}
