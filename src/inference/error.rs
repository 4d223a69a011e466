use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while running the ensemble or one of its models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// The fitted normalizer failed to load at startup.
    #[error("Scaler is not loaded")]
    ScalerUnavailable,

    /// The registry holds no models.
    #[error("Models are not loaded")]
    ModelsNotLoaded,

    /// Input or output dimensionality does not match the fitted artifact.
    #[error("Shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A model produced a non-finite or out-of-range value.
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// A model did not answer within its time budget.
    #[error("Model timed out after {0}ms")]
    Timeout(u64),

    /// The model task panicked or was cancelled.
    #[error("Model task aborted: {0}")]
    Aborted(String),

    /// A backend-specific failure (e.g. ONNX runtime).
    #[error("Backend error: {0}")]
    Backend(String),
}

impl InferenceError {
    /// True when the whole service is unusable rather than a single model.
    pub fn is_not_ready(&self) -> bool {
        matches!(
            self,
            InferenceError::ScalerUnavailable | InferenceError::ModelsNotLoaded
        )
    }
}

/// Errors raised while reading artifacts at startup.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("Unsupported model kind '{0}'")]
    UnsupportedKind(String),
}

/// Raised when feature importances are requested from a model that cannot supply them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportanceError {
    #[error("Model '{0}' is not loaded")]
    ModelMissing(String),

    #[error("Model '{0}' does not expose feature importances")]
    Unsupported(String),
}
