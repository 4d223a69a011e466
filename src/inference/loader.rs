use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::adapter::{DirectProbabilityAdapter, IndexDecodeAdapter, ModelAdapter};
use super::decoder::LabelDecoder;
use super::error::ArtifactError;
use super::features::Normalizer;
use super::models::{DenseNetwork, KNearestNeighbors, LinearClassifier, MlpClassifier, RandomForest};
use super::registry::ModelRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Linear,
    Mlp,
    Knn,
    Forest,
    /// Dense network emitting a bare probability vector; needs a decoder.
    Dense,
    /// ONNX graph emitting a bare probability vector; needs a decoder.
    Onnx,
}

impl ModelKind {
    pub fn needs_decoder(&self) -> bool {
        matches!(self, ModelKind::Dense | ModelKind::Onnx)
    }
}

/// One manifest entry: where a model's artifact lives and how to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: String,
    pub kind: ModelKind,
    pub path: String,
    #[serde(default)]
    pub decoder: Option<String>,
}

impl ModelSpec {
    pub fn new(id: &str, kind: ModelKind, path: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            path: path.to_string(),
            decoder: None,
        }
    }

    pub fn with_decoder(mut self, decoder: &str) -> Self {
        self.decoder = Some(decoder.to_string());
        self
    }

    /// The five-model ensemble the service ships with.
    pub fn defaults() -> Vec<ModelSpec> {
        vec![
            ModelSpec::new("svm", ModelKind::Linear, "model_svm.json"),
            ModelSpec::new("mlp", ModelKind::Mlp, "model_mlp.json"),
            ModelSpec::new("knn", ModelKind::Knn, "model_knn.json"),
            ModelSpec::new("rf", ModelKind::Forest, "model_rf.json"),
            ModelSpec::new("dl", ModelKind::Dense, "model_dl.json")
                .with_decoder("dl_label_encoder.json"),
        ]
    }
}

/// Everything read from disk at startup. Missing pieces are left out, never fatal.
pub struct LoadedArtifacts {
    pub normalizer: Option<Normalizer>,
    pub registry: ModelRegistry,
    pub failures: Vec<(String, String)>,
}

pub fn load_all(dir: &Path, scaler_file: &str, specs: &[ModelSpec]) -> LoadedArtifacts {
    let mut failures = Vec::new();

    let normalizer = match load_normalizer(&dir.join(scaler_file)) {
        Ok(normalizer) => {
            tracing::info!("✅ Scaler loaded from {}", scaler_file);
            Some(normalizer)
        }
        Err(e) => {
            tracing::error!("❌ Failed to load scaler: {}", e);
            failures.push(("scaler".to_string(), e.to_string()));
            None
        }
    };

    let mut builder = ModelRegistry::builder();
    for spec in specs {
        match load_adapter(dir, spec) {
            Ok(adapter) => {
                tracing::info!("✅ Model '{}' loaded ({:?})", spec.id, spec.kind);
                builder = builder.register(spec.id.clone(), adapter);
            }
            Err(e) => {
                tracing::warn!("⚠️  Model '{}' not loaded: {}", spec.id, e);
                failures.push((spec.id.clone(), e.to_string()));
            }
        }
    }

    LoadedArtifacts {
        normalizer,
        registry: builder.build(),
        failures,
    }
}

pub fn load_normalizer(path: &Path) -> Result<Normalizer, ArtifactError> {
    let normalizer: Normalizer = read_json(path)?;
    normalizer.validate().map_err(|reason| invalid(path, reason))?;
    Ok(normalizer)
}

pub fn load_adapter(dir: &Path, spec: &ModelSpec) -> Result<Arc<dyn ModelAdapter>, ArtifactError> {
    let path = dir.join(&spec.path);

    let adapter: Arc<dyn ModelAdapter> = match spec.kind {
        ModelKind::Linear => {
            let model: LinearClassifier = read_json(&path)?;
            model.validate().map_err(|reason| invalid(&path, reason))?;
            Arc::new(DirectProbabilityAdapter::new(model))
        }
        ModelKind::Mlp => {
            let model: MlpClassifier = read_json(&path)?;
            model.validate().map_err(|reason| invalid(&path, reason))?;
            Arc::new(DirectProbabilityAdapter::new(model))
        }
        ModelKind::Knn => {
            let model: KNearestNeighbors = read_json(&path)?;
            model.validate().map_err(|reason| invalid(&path, reason))?;
            Arc::new(DirectProbabilityAdapter::new(model))
        }
        ModelKind::Forest => {
            let model: RandomForest = read_json(&path)?;
            model.validate().map_err(|reason| invalid(&path, reason))?;
            Arc::new(DirectProbabilityAdapter::new(model))
        }
        ModelKind::Dense => {
            let decoder = load_decoder(dir, spec)?;
            let model: DenseNetwork = read_json(&path)?;
            model.validate().map_err(|reason| invalid(&path, reason))?;
            if model.output_width() != decoder.classes().len() {
                return Err(invalid(
                    &path,
                    format!(
                        "network emits {} values but decoder has {} classes",
                        model.output_width(),
                        decoder.classes().len()
                    ),
                ));
            }
            Arc::new(IndexDecodeAdapter::new(model, decoder))
        }
        ModelKind::Onnx => load_onnx(dir, spec, &path)?,
    };

    Ok(adapter)
}

#[cfg(feature = "onnx")]
fn load_onnx(dir: &Path, spec: &ModelSpec, path: &Path) -> Result<Arc<dyn ModelAdapter>, ArtifactError> {
    let decoder = load_decoder(dir, spec)?;
    let model = super::models::OnnxClassifier::load(path).map_err(|e| invalid(path, e.to_string()))?;
    Ok(Arc::new(IndexDecodeAdapter::new(model, decoder)))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(_dir: &Path, _spec: &ModelSpec, _path: &Path) -> Result<Arc<dyn ModelAdapter>, ArtifactError> {
    Err(ArtifactError::UnsupportedKind(
        "onnx (built without the `onnx` feature)".to_string(),
    ))
}

fn load_decoder(dir: &Path, spec: &ModelSpec) -> Result<LabelDecoder, ArtifactError> {
    let file = spec.decoder.as_deref().ok_or_else(|| {
        invalid(&dir.join(&spec.path), format!("model '{}' needs a label decoder", spec.id))
    })?;
    let path = dir.join(file);
    let decoder: LabelDecoder = read_json(&path)?;
    decoder.validate().map_err(|reason| invalid(&path, reason))?;
    Ok(decoder)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn invalid(path: &Path, reason: String) -> ArtifactError {
    ArtifactError::Invalid {
        path: PathBuf::from(path),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::features::ScaledVector;
    use crate::inference::labels::ClassLabel;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nebula-lens-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(dir: &Path, name: &str, body: serde_json::Value) {
        std::fs::write(dir.join(name), body.to_string()).unwrap();
    }

    fn write_scaler(dir: &Path) {
        write(
            dir,
            "scaler.json",
            serde_json::json!({
                "kind": "standard",
                "feature_names": ["u", "g", "r", "i", "z", "redshift"],
                "mean": [0, 0, 0, 0, 0, 0],
                "scale": [1, 1, 1, 1, 1, 1]
            }),
        );
    }

    fn write_dense(dir: &Path) {
        write(
            dir,
            "dl.json",
            serde_json::json!({
                "layers": [{
                    "weights": [[0, 0, 0, 0, 0, 1], [0, 0, 0, 0, 0, 0], [0, 0, 0, 0, 0, -1]],
                    "bias": [0, 0, 0],
                    "activation": "softmax"
                }]
            }),
        );
        write(dir, "decoder.json", serde_json::json!({"classes": ["STAR", "QSO", "GALAXY"]}));
    }

    #[test]
    fn test_loads_dense_model_with_decoder() {
        let dir = scratch_dir();
        write_dense(&dir);
        let spec = ModelSpec::new("dl", ModelKind::Dense, "dl.json").with_decoder("decoder.json");

        let adapter = load_adapter(&dir, &spec).unwrap();
        let dist = adapter
            .predict(&ScaledVector::new([0.0, 0.0, 0.0, 0.0, 0.0, 2.0]))
            .unwrap();
        // First output unit decodes to STAR under this decoder.
        assert_eq!(dist.top().map(|(l, _)| l), Some(ClassLabel::Star));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_dense_without_decoder_is_rejected() {
        let dir = scratch_dir();
        write_dense(&dir);
        let spec = ModelSpec::new("dl", ModelKind::Dense, "dl.json");
        assert!(matches!(
            load_adapter(&dir, &spec),
            Err(ArtifactError::Invalid { .. })
        ));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_partial_load_keeps_good_models() {
        let dir = scratch_dir();
        write_scaler(&dir);
        write_dense(&dir);
        let specs = vec![
            ModelSpec::new("dl", ModelKind::Dense, "dl.json").with_decoder("decoder.json"),
            ModelSpec::new("rf", ModelKind::Forest, "missing_rf.json"),
        ];

        let loaded = load_all(&dir, "scaler.json", &specs);
        assert!(loaded.normalizer.is_some());
        assert_eq!(loaded.registry.ids().collect::<Vec<_>>(), vec!["dl"]);
        assert_eq!(loaded.failures.len(), 1);
        assert_eq!(loaded.failures[0].0, "rf");
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_scaler_leaves_normalizer_empty() {
        let dir = scratch_dir();
        let loaded = load_all(&dir, "scaler.json", &[]);
        assert!(loaded.normalizer.is_none());
        assert!(loaded.registry.is_empty());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_corrupt_artifact_is_parse_error() {
        let dir = scratch_dir();
        std::fs::write(dir.join("model_knn.json"), "{not json").unwrap();
        let spec = ModelSpec::new("knn", ModelKind::Knn, "model_knn.json");
        assert!(matches!(
            load_adapter(&dir, &spec),
            Err(ArtifactError::Parse { .. })
        ));
        std::fs::remove_dir_all(dir).ok();
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_onnx_kind_needs_feature() {
        let dir = scratch_dir();
        let spec = ModelSpec::new("dl", ModelKind::Onnx, "dl.onnx").with_decoder("decoder.json");
        assert!(matches!(
            load_adapter(&dir, &spec),
            Err(ArtifactError::UnsupportedKind(_))
        ));
        std::fs::remove_dir_all(dir).ok();
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn test_onnx_graph_missing_is_invalid() {
        let dir = scratch_dir();
        write_dense(&dir);
        let spec = ModelSpec::new("dl", ModelKind::Onnx, "dl.onnx").with_decoder("decoder.json");
        assert!(matches!(
            load_adapter(&dir, &spec),
            Err(ArtifactError::Invalid { .. })
        ));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_default_manifest() {
        let specs = ModelSpec::defaults();
        assert_eq!(specs.len(), 5);
        assert!(specs.iter().filter(|s| s.kind.needs_decoder()).all(|s| s.decoder.is_some()));
    }
}
