use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;

use super::adapter::{ModelAdapter, ModelResult};
use super::consensus::{self, ConsensusResult};
use super::error::{ImportanceError, InferenceError};
use super::features::{FeatureVector, Normalizer, ScaledVector};
use super::importance::{self, FeatureRanking};
use super::labels::ProbabilityDistribution;
use super::performance::PerformanceTable;
use super::registry::ModelRegistry;

#[derive(Debug, Clone)]
pub struct EnsembleSettings {
    /// Upper bound for a single model call; `None` waits indefinitely.
    ///
    /// The clock starts when the call is handed to the blocking pool, so
    /// time spent queued behind other blocking work counts against it.
    pub model_timeout: Option<Duration>,
}

impl Default for EnsembleSettings {
    fn default() -> Self {
        Self {
            model_timeout: Some(Duration::from_millis(2000)),
        }
    }
}

/// Full answer for one classification request.
#[derive(Debug, Clone, Serialize)]
pub struct EnsembleResponse {
    pub predictions: BTreeMap<String, ModelResult>,
    pub performance: PerformanceTable,
    pub model_agreement: ConsensusResult,
    pub input_features: FeatureVector,
}

/// Shared, read-only inference engine: normalizer + registry.
pub struct Ensemble {
    normalizer: Option<Arc<Normalizer>>,
    registry: Arc<ModelRegistry>,
    settings: EnsembleSettings,
}

impl Ensemble {
    pub fn new(
        normalizer: Option<Normalizer>,
        registry: ModelRegistry,
        settings: EnsembleSettings,
    ) -> Self {
        Self {
            normalizer: normalizer.map(Arc::new),
            registry: Arc::new(registry),
            settings,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn has_normalizer(&self) -> bool {
        self.normalizer.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.normalizer.is_some() && !self.registry.is_empty()
    }

    pub fn normalize(&self, features: &FeatureVector) -> Result<ScaledVector, InferenceError> {
        self.normalizer
            .as_ref()
            .ok_or(InferenceError::ScalerUnavailable)?
            .normalize(features)
    }

    /// Runs every registered model concurrently on the same input.
    ///
    /// A failing, panicking or slow model only affects its own entry.
    pub async fn run_ensemble(
        &self,
        input: &ScaledVector,
    ) -> Result<BTreeMap<String, ModelResult>, InferenceError> {
        if self.registry.is_empty() {
            return Err(InferenceError::ModelsNotLoaded);
        }

        let calls = self.registry.iter().map(|(id, adapter)| {
            isolate(
                id.to_string(),
                adapter.clone(),
                *input,
                self.settings.model_timeout,
            )
        });

        Ok(futures::future::join_all(calls).await.into_iter().collect())
    }

    pub async fn infer(&self, features: FeatureVector) -> Result<EnsembleResponse, InferenceError> {
        let start = Instant::now();
        let scaled = self.normalize(&features)?;
        let predictions = self.run_ensemble(&scaled).await?;
        let model_agreement = consensus::resolve(predictions.values());

        tracing::debug!(
            "Ensemble finished in {:.2}ms: {:?} ({}/{} agree)",
            start.elapsed().as_secs_f64() * 1000.0,
            model_agreement.prediction,
            model_agreement.count,
            model_agreement.total
        );

        Ok(EnsembleResponse {
            predictions,
            performance: PerformanceTable::reference(),
            model_agreement,
            input_features: features,
        })
    }

    pub fn feature_importance(&self, model_id: &str) -> Result<FeatureRanking, ImportanceError> {
        importance::rank(&self.registry, model_id)
    }
}

/// Runs one model on the blocking pool and records its outcome, whatever it is.
async fn isolate(
    id: String,
    adapter: Arc<dyn ModelAdapter>,
    input: ScaledVector,
    timeout: Option<Duration>,
) -> (String, ModelResult) {
    let task = tokio::task::spawn_blocking(move || adapter.predict(&input));

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => flatten(joined),
            Err(_) => Err(InferenceError::Timeout(limit.as_millis() as u64)),
        },
        None => flatten(task.await),
    };

    if let Err(e) = &outcome {
        tracing::warn!("⚠️  Model '{}' failed: {}", id, e);
    }

    (id, ModelResult::from_outcome(outcome))
}

fn flatten(
    joined: Result<Result<ProbabilityDistribution, InferenceError>, JoinError>,
) -> Result<ProbabilityDistribution, InferenceError> {
    joined.map_err(|e| InferenceError::Aborted(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::adapter::MockModelAdapter;
    use crate::inference::labels::ClassLabel;

    fn features() -> FeatureVector {
        FeatureVector {
            u: 19.2,
            g: 17.8,
            r: 17.1,
            i: 16.9,
            z: 16.8,
            redshift: 0.0001,
        }
    }

    fn answering(label: ClassLabel, p: f64) -> MockModelAdapter {
        let mut mock = MockModelAdapter::new();
        mock.expect_predict().returning(move |_| {
            let rest = (1.0 - p) / 2.0;
            let pairs = ClassLabel::ALL
                .iter()
                .map(|l| (*l, if *l == label { p } else { rest }));
            ProbabilityDistribution::from_pairs(pairs)
        });
        mock
    }

    fn failing() -> MockModelAdapter {
        let mut mock = MockModelAdapter::new();
        mock.expect_predict()
            .returning(|_| Err(InferenceError::ShapeMismatch { expected: 6, actual: 5 }));
        mock
    }

    fn ensemble(registry: ModelRegistry) -> Ensemble {
        Ensemble::new(Some(Normalizer::identity()), registry, EnsembleSettings::default())
    }

    #[tokio::test]
    async fn test_one_failure_is_isolated() {
        let registry = ModelRegistry::builder()
            .register("knn", Arc::new(answering(ClassLabel::Star, 0.8)))
            .register("mlp", Arc::new(failing()))
            .register("rf", Arc::new(answering(ClassLabel::Star, 0.9)))
            .build();

        let response = ensemble(registry).infer(features()).await.unwrap();

        assert_eq!(response.predictions.len(), 3);
        assert!(response.predictions["mlp"].is_failed());
        assert_eq!(response.model_agreement.total, 2);
        assert_eq!(response.model_agreement.count, 2);
        assert_eq!(response.model_agreement.prediction, Some(ClassLabel::Star));
    }

    #[tokio::test]
    async fn test_all_failures_give_error_consensus() {
        let registry = ModelRegistry::builder()
            .register("a", Arc::new(failing()))
            .register("b", Arc::new(failing()))
            .build();

        let response = ensemble(registry).infer(features()).await.unwrap();
        assert_eq!(response.model_agreement, ConsensusResult::error());
    }

    #[tokio::test]
    async fn test_empty_registry_is_not_loaded() {
        let result = ensemble(ModelRegistry::empty()).infer(features()).await;
        assert_eq!(result.unwrap_err(), InferenceError::ModelsNotLoaded);
    }

    #[tokio::test]
    async fn test_missing_scaler_is_not_ready() {
        let mut mock = MockModelAdapter::new();
        mock.expect_predict().never();
        let registry = ModelRegistry::builder().register("rf", Arc::new(mock)).build();
        let engine = Ensemble::new(None, registry, EnsembleSettings::default());

        let err = engine.infer(features()).await.unwrap_err();
        assert_eq!(err, InferenceError::ScalerUnavailable);
        assert!(err.is_not_ready());
        assert!(!engine.is_ready());
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let mut slow = MockModelAdapter::new();
        slow.expect_predict().returning(|_| {
            std::thread::sleep(Duration::from_millis(300));
            ProbabilityDistribution::from_pairs([(ClassLabel::Qso, 1.0)])
        });

        let registry = ModelRegistry::builder()
            .register("dl", Arc::new(slow))
            .register("rf", Arc::new(answering(ClassLabel::Galaxy, 0.7)))
            .build();
        let engine = Ensemble::new(
            Some(Normalizer::identity()),
            registry,
            EnsembleSettings {
                model_timeout: Some(Duration::from_millis(30)),
            },
        );

        let response = engine.infer(features()).await.unwrap();
        assert_eq!(
            response.predictions["dl"],
            ModelResult::failed(InferenceError::Timeout(30))
        );
        assert_eq!(response.model_agreement.prediction, Some(ClassLabel::Galaxy));
        assert_eq!(response.model_agreement.total, 1);
    }

    #[tokio::test]
    async fn test_dropped_request_leaves_engine_usable() {
        let mut slow = MockModelAdapter::new();
        slow.expect_predict().returning(|_| {
            std::thread::sleep(Duration::from_millis(300));
            ProbabilityDistribution::from_pairs([(ClassLabel::Star, 1.0)])
        });
        let registry = ModelRegistry::builder().register("dl", Arc::new(slow)).build();
        let engine = ensemble(registry);
        let scaled = engine.normalize(&features()).unwrap();

        let start = Instant::now();
        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), engine.run_ensemble(&scaled)).await;
        assert!(abandoned.is_err());
        assert!(start.elapsed() < Duration::from_millis(250));

        let response = engine.infer(features()).await.unwrap();
        assert_eq!(response.model_agreement.prediction, Some(ClassLabel::Star));
        assert_eq!(response.model_agreement.total, 1);
    }

    #[tokio::test]
    async fn test_panicking_model_is_isolated() {
        let mut broken = MockModelAdapter::new();
        broken.expect_predict().returning(|_| panic!("corrupt weights"));

        let registry = ModelRegistry::builder()
            .register("svm", Arc::new(broken))
            .register("rf", Arc::new(answering(ClassLabel::Qso, 0.6)))
            .build();

        let response = ensemble(registry).infer(features()).await.unwrap();
        assert!(response.predictions["svm"].is_failed());
        assert_eq!(response.model_agreement.total, 1);
    }

    #[tokio::test]
    async fn test_response_echoes_input() {
        let registry = ModelRegistry::builder()
            .register("rf", Arc::new(answering(ClassLabel::Star, 0.9)))
            .build();
        let response = ensemble(registry).infer(features()).await.unwrap();

        assert_eq!(response.input_features, features());
        assert_eq!(response.performance, PerformanceTable::reference());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["model_agreement"]["prediction"], "STAR");
        assert_eq!(value["predictions"]["rf"]["prediction"], "STAR");
        assert_eq!(value["input_features"]["redshift"], 0.0001);
    }
}
