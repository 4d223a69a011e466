use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::inference::{EnsembleSettings, ModelSpec};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub models: ModelConfig,
    pub explain: ExplainConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub dir: PathBuf,
    pub scaler: String,
    /// Per-model time budget; 0 disables the limit.
    pub timeout_ms: u64,
    /// Model whose importances back `/feature_importance`.
    pub importance_model: String,
    pub models: Vec<ModelSpec>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./models"),
            scaler: "star_classifier_scaler.json".to_string(),
            timeout_ms: 2000,
            importance_model: "rf".to_string(),
            models: ModelSpec::defaults(),
        }
    }
}

impl ModelConfig {
    pub fn ensemble_settings(&self) -> EnsembleSettings {
        EnsembleSettings {
            model_timeout: (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then `nebula.toml` (or `$NEBULA_CONFIG`), then `NEBULA_*`
    /// variables such as `NEBULA_SERVER__PORT=9000`.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let file = env::var("NEBULA_CONFIG").unwrap_or_else(|_| "nebula".to_string());

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix("NEBULA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration ({})", file))?;

        let mut config: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        if config.explain.api_key.is_none() {
            config.explain.api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        }

        Ok(config)
    }
}
