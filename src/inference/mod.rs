//! Ensemble inference and consensus engine.
//!
//! Raw features are scaled by the fitted [`Normalizer`], fanned out to every
//! adapter in the [`ModelRegistry`], and the per-model results are reduced to
//! one label by [`consensus::resolve`].

pub mod adapter;
pub mod consensus;
pub mod decoder;
pub mod error;
pub mod features;
pub mod importance;
pub mod labels;
pub mod loader;
pub mod models;
pub mod orchestrator;
pub mod performance;
pub mod registry;

pub use adapter::{
    DirectProbabilityAdapter, IndexDecodeAdapter, ModelAdapter, ModelPrediction, ModelResult,
    ProbabilisticClassifier, SoftmaxClassifier,
};
pub use consensus::ConsensusResult;
pub use decoder::LabelDecoder;
pub use error::{ArtifactError, ImportanceError, InferenceError};
pub use features::{FeatureVector, Normalizer, ScaledVector, FEATURE_COUNT, FEATURE_NAMES};
pub use importance::FeatureRanking;
pub use labels::{ClassLabel, ProbabilityDistribution};
pub use loader::{LoadedArtifacts, ModelKind, ModelSpec};
pub use orchestrator::{Ensemble, EnsembleResponse, EnsembleSettings};
pub use performance::PerformanceTable;
pub use registry::ModelRegistry;
