use nebula_lens::inference::{
    ClassLabel, DirectProbabilityAdapter, Ensemble, EnsembleSettings, FeatureVector,
    IndexDecodeAdapter, InferenceError, LabelDecoder, ModelRegistry, Normalizer,
    ProbabilisticClassifier, ScaledVector, SoftmaxClassifier,
};
use std::sync::Arc;
use std::time::Duration;

struct FixedTable(Vec<(ClassLabel, f64)>);

impl ProbabilisticClassifier for FixedTable {
    fn predict_proba(
        &self,
        _input: &ScaledVector,
    ) -> Result<Vec<(ClassLabel, f64)>, InferenceError> {
        Ok(self.0.clone())
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(vec![0.05, 0.30, 0.30, 0.15, 0.10, 0.10])
    }
}

struct FixedVector(Vec<f64>);

impl SoftmaxClassifier for FixedVector {
    fn predict_raw(&self, _input: &ScaledVector) -> Result<Vec<f64>, InferenceError> {
        Ok(self.0.clone())
    }
}

/// Probabilities depend on the scaled input so repeated runs are checked
/// against real arithmetic.
struct InputDriven;

impl ProbabilisticClassifier for InputDriven {
    fn predict_proba(
        &self,
        input: &ScaledVector,
    ) -> Result<Vec<(ClassLabel, f64)>, InferenceError> {
        let x = input.values();
        let star = 1.0 / (1.0 + (-(x[0] - x[5])).exp());
        Ok(vec![
            (ClassLabel::Star, star),
            (ClassLabel::Galaxy, (1.0 - star) * 0.7),
            (ClassLabel::Qso, (1.0 - star) * 0.3),
        ])
    }
}

struct Broken;

impl ProbabilisticClassifier for Broken {
    fn predict_proba(
        &self,
        _input: &ScaledVector,
    ) -> Result<Vec<(ClassLabel, f64)>, InferenceError> {
        Err(InferenceError::Backend("weights corrupted".to_string()))
    }
}

struct Slow;

impl ProbabilisticClassifier for Slow {
    fn predict_proba(
        &self,
        _input: &ScaledVector,
    ) -> Result<Vec<(ClassLabel, f64)>, InferenceError> {
        std::thread::sleep(Duration::from_millis(300));
        Ok(vec![(ClassLabel::Star, 1.0)])
    }
}

fn direct<M: ProbabilisticClassifier + 'static>(model: M) -> Arc<DirectProbabilityAdapter<M>> {
    Arc::new(DirectProbabilityAdapter::new(model))
}

fn star() -> Arc<DirectProbabilityAdapter<FixedTable>> {
    direct(FixedTable(vec![
        (ClassLabel::Star, 0.8),
        (ClassLabel::Galaxy, 0.15),
        (ClassLabel::Qso, 0.05),
    ]))
}

fn galaxy() -> Arc<DirectProbabilityAdapter<FixedTable>> {
    direct(FixedTable(vec![
        (ClassLabel::Galaxy, 0.6),
        (ClassLabel::Star, 0.4),
    ]))
}

fn sample() -> FeatureVector {
    FeatureVector {
        u: 19.47,
        g: 17.04,
        r: 15.94,
        i: 15.50,
        z: 15.22,
        redshift: 0.00016,
    }
}

fn ensemble(registry: ModelRegistry) -> Ensemble {
    Ensemble::new(
        Some(Normalizer::standard(
            [19.0, 17.5, 16.8, 16.4, 16.1, 0.5],
            [1.2, 1.1, 1.0, 1.0, 1.0, 0.7],
        )),
        registry,
        EnsembleSettings::default(),
    )
}

#[tokio::test]
async fn test_four_of_five_agree() {
    let registry = ModelRegistry::builder()
        .register("dl", star())
        .register("knn", galaxy())
        .register("mlp", star())
        .register("rf", star())
        .register("svm", star())
        .build();

    let response = ensemble(registry).infer(sample()).await.unwrap();
    let agreement = &response.model_agreement;

    assert_eq!(agreement.prediction, Some(ClassLabel::Star));
    assert_eq!(agreement.count, 4);
    assert_eq!(agreement.total, 5);
    assert!((agreement.confidence - 0.8).abs() < 1e-12);
}

#[tokio::test]
async fn test_reverse_alphabetical_decoder() {
    // Index 0 is STAR for this network, not GALAXY.
    let decoder = LabelDecoder::new(vec![ClassLabel::Star, ClassLabel::Qso, ClassLabel::Galaxy]);
    let dense = Arc::new(IndexDecodeAdapter::new(
        FixedVector(vec![0.7, 0.2, 0.1]),
        decoder,
    ));
    let registry = ModelRegistry::builder().register("dl", dense).build();

    let response = ensemble(registry).infer(sample()).await.unwrap();
    let dl = response.predictions["dl"].prediction().unwrap();

    assert_eq!(dl.label, ClassLabel::Star);
    assert_eq!(dl.confidence, 0.7);
    assert_eq!(dl.probabilities.get(ClassLabel::Galaxy), Some(0.1));
}

#[tokio::test]
async fn test_failed_model_is_excluded_from_total() {
    let registry = ModelRegistry::builder()
        .register("broken", direct(Broken))
        .register("rf", star())
        .register("svm", star())
        .build();

    let response = ensemble(registry).infer(sample()).await.unwrap();

    assert!(response.predictions["broken"].is_failed());
    assert_eq!(response.model_agreement.total, 2);
    assert_eq!(response.model_agreement.count, 2);
    // Mean over the two agreeing models, both at 0.8.
    assert!((response.model_agreement.confidence - 0.8).abs() < 1e-12);
}

#[tokio::test]
async fn test_all_failed_yields_error_consensus() {
    let registry = ModelRegistry::builder()
        .register("a", direct(Broken))
        .register("b", direct(Broken))
        .build();

    let response = ensemble(registry).infer(sample()).await.unwrap();
    let json = serde_json::to_value(&response.model_agreement).unwrap();

    assert!(response.model_agreement.is_error());
    assert_eq!(json["prediction"], "Error");
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_slow_model_times_out_alone() {
    let registry = ModelRegistry::builder()
        .register("rf", star())
        .register("slow", direct(Slow))
        .build();
    let ensemble = Ensemble::new(
        Some(Normalizer::identity()),
        registry,
        EnsembleSettings {
            model_timeout: Some(Duration::from_millis(50)),
        },
    );

    let response = ensemble.infer(sample()).await.unwrap();

    assert!(response.predictions["slow"].is_failed());
    assert_eq!(response.model_agreement.prediction, Some(ClassLabel::Star));
    assert_eq!(response.model_agreement.total, 1);
}

#[tokio::test]
async fn test_missing_scaler_is_not_ready() {
    let registry = ModelRegistry::builder().register("rf", star()).build();
    let ensemble = Ensemble::new(None, registry, EnsembleSettings::default());

    let err = ensemble.infer(sample()).await.unwrap_err();

    assert_eq!(err, InferenceError::ScalerUnavailable);
    assert!(err.is_not_ready());
}

#[tokio::test]
async fn test_repeated_inference_is_bit_identical() {
    let registry = ModelRegistry::builder()
        .register("a", direct(InputDriven))
        .register("b", star())
        .build();
    let ensemble = ensemble(registry);

    let first = ensemble.infer(sample()).await.unwrap();
    let second = ensemble.infer(sample()).await.unwrap();

    for (id, result) in &first.predictions {
        let a = result.prediction().unwrap();
        let b = second.predictions[id].prediction().unwrap();
        assert_eq!(a.label, b.label);
        assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
        for ((la, pa), (lb, pb)) in a.probabilities.iter().zip(b.probabilities.iter()) {
            assert_eq!(la, lb);
            assert_eq!(pa.to_bits(), pb.to_bits());
        }
    }
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_feature_importance_tie_keeps_column_order() {
    let registry = ModelRegistry::builder()
        .register("rf", star())
        .register("dl", direct(InputDriven))
        .build();
    let ensemble = ensemble(registry);

    let ranking = ensemble.feature_importance("rf").unwrap();
    assert_eq!(ranking.features(), vec!["g", "r", "i", "z", "redshift", "u"]);

    assert!(ensemble.feature_importance("dl").is_err());
    assert!(ensemble.feature_importance("missing").is_err());
}
