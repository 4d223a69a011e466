use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// HTTP stack targets kept quieter than the service itself.
const QUIET_TARGETS: [&str; 3] = ["hyper=warn", "reqwest=warn", "warp=info"];

/// `RUST_LOG`, when set, replaces the configured level and the quiet targets.
fn build_filter(log_level: &str, rust_log: Option<&str>) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return EnvFilter::new(directives);
    }

    QUIET_TARGETS
        .iter()
        .filter_map(|directive| directive.parse().ok())
        .fold(EnvFilter::new(log_level), EnvFilter::add_directive)
}

/// Installs the process-wide subscriber. A second call (tests, embedding)
/// leaves the existing one in place.
pub fn init_logging(log_level: &str) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(log_level, rust_log.as_deref());

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("📝 Log level: {}", rust_log.as_deref().unwrap_or(log_level));
    }
}
