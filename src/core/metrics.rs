use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::inference::EnsembleResponse;

/// Prometheus instruments for the HTTP surface.
pub struct InferenceMetrics {
    registry: Registry,
    requests: IntCounter,
    not_ready: IntCounter,
    model_failures: IntCounterVec,
    explanation_failures: IntCounter,
    latency: Histogram,
}

impl InferenceMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("nebula".to_string()), None)?;

        let requests = IntCounter::new("predict_requests_total", "Classification requests")?;
        let not_ready = IntCounter::new(
            "predict_not_ready_total",
            "Requests rejected because artifacts are not loaded",
        )?;
        let model_failures = IntCounterVec::new(
            Opts::new("model_failures_total", "Per-model inference failures"),
            &["model"],
        )?;
        let explanation_failures = IntCounter::new(
            "explanation_failures_total",
            "Failed calls to the explanation service",
        )?;
        let latency = Histogram::with_opts(
            HistogramOpts::new("predict_latency_seconds", "End-to-end ensemble latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5]),
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(not_ready.clone()))?;
        registry.register(Box::new(model_failures.clone()))?;
        registry.register(Box::new(explanation_failures.clone()))?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            registry,
            requests,
            not_ready,
            model_failures,
            explanation_failures,
            latency,
        })
    }

    pub fn record_response(&self, response: &EnsembleResponse, elapsed_secs: f64) {
        self.requests.inc();
        self.latency.observe(elapsed_secs);
        for (model, result) in &response.predictions {
            if result.is_failed() {
                self.model_failures.with_label_values(&[model.as_str()]).inc();
            }
        }
    }

    pub fn record_not_ready(&self) {
        self.requests.inc();
        self.not_ready.inc();
    }

    pub fn record_explanation_failure(&self) {
        self.explanation_failures.inc();
    }

    #[cfg(test)]
    fn model_failures(&self, model: &str) -> u64 {
        self.model_failures.with_label_values(&[model]).get()
    }

    /// Text exposition format for `/metrics`.
    pub fn gather(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!("Failed to encode metrics: {}", e);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
