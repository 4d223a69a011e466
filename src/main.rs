use anyhow::{Context, Result};
use nebula_lens::api::{self, AppState};
use nebula_lens::core::{logging, Config, HealthChecker, InferenceMetrics};
use nebula_lens::explain::{Explainer, GeminiClient};
use nebula_lens::inference::{loader, Ensemble};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    logging::init_logging(&config.monitoring.log_level);

    tracing::info!("🚀 Nebula Lens classification service starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Model directory: {}", config.models.dir.display());

    // Load scaler and models; whatever is missing leaves the service degraded
    let artifacts = loader::load_all(
        &config.models.dir,
        &config.models.scaler,
        &config.models.models,
    );
    if !artifacts.failures.is_empty() {
        tracing::warn!(
            "⚠️  {} artifact(s) failed to load, continuing degraded",
            artifacts.failures.len()
        );
    }

    let ensemble = Ensemble::new(
        artifacts.normalizer,
        artifacts.registry,
        config.models.ensemble_settings(),
    );

    // Explanation service is optional
    let explainer = match config.explain.api_key.clone() {
        Some(key) => match GeminiClient::new(&config.explain, key) {
            Ok(client) => {
                tracing::info!("✅ Explanation service configured ({})", config.explain.model);
                Explainer::new(Arc::new(client))
            }
            Err(e) => {
                tracing::error!("❌ Failed to build explanation client: {}", e);
                Explainer::disabled()
            }
        },
        None => {
            tracing::warn!("⚠️  GEMINI_API_KEY not set, explanations disabled");
            Explainer::disabled()
        }
    };

    let metrics = InferenceMetrics::new().context("Failed to register metrics")?;

    let state = Arc::new(AppState {
        ensemble,
        explainer,
        importance_model: config.models.importance_model.clone(),
        health: HealthChecker::new(),
        metrics,
    });

    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server host '{}'", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    let (bound, server) = warp::serve(api::routes(state))
        .try_bind_with_graceful_shutdown(addr, async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("🛑 Shutdown signal received");
        })
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("✅ Listening on http://{}", bound);
    server.await;

    Ok(())
}
