//! Uniform model capability over the two native output contracts.
//!
//! Models that return a full (label, probability) table are wrapped by
//! [`DirectProbabilityAdapter`]. Models that only emit a bare probability
//! vector are wrapped by [`IndexDecodeAdapter`], which owns the
//! [`LabelDecoder`] for that model. Both present the same [`ModelAdapter`]
//! surface to the orchestrator.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

use super::decoder::LabelDecoder;
use super::error::InferenceError;
use super::features::ScaledVector;
use super::labels::{ClassLabel, ProbabilityDistribution};

/// One predictor, seen by the ensemble.
#[cfg_attr(test, mockall::automock)]
pub trait ModelAdapter: Send + Sync {
    fn predict(&self, input: &ScaledVector) -> Result<ProbabilityDistribution, InferenceError>;

    /// Per-feature importance scores, when the model family has them.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Native contract: full (label, probability) table.
pub trait ProbabilisticClassifier: Send + Sync {
    fn predict_proba(&self, input: &ScaledVector)
        -> Result<Vec<(ClassLabel, f64)>, InferenceError>;

    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Native contract: probability vector indexed by an implicit class index.
pub trait SoftmaxClassifier: Send + Sync {
    fn predict_raw(&self, input: &ScaledVector) -> Result<Vec<f64>, InferenceError>;
}

pub struct DirectProbabilityAdapter<M> {
    model: M,
}

impl<M: ProbabilisticClassifier> DirectProbabilityAdapter<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

impl<M: ProbabilisticClassifier> ModelAdapter for DirectProbabilityAdapter<M> {
    fn predict(&self, input: &ScaledVector) -> Result<ProbabilityDistribution, InferenceError> {
        ProbabilityDistribution::from_pairs(self.model.predict_proba(input)?)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.model.feature_importances()
    }
}

pub struct IndexDecodeAdapter<M> {
    model: M,
    decoder: LabelDecoder,
}

impl<M: SoftmaxClassifier> IndexDecodeAdapter<M> {
    pub fn new(model: M, decoder: LabelDecoder) -> Self {
        Self { model, decoder }
    }

    pub fn decoder(&self) -> &LabelDecoder {
        &self.decoder
    }
}

impl<M: SoftmaxClassifier> ModelAdapter for IndexDecodeAdapter<M> {
    fn predict(&self, input: &ScaledVector) -> Result<ProbabilityDistribution, InferenceError> {
        let raw = self.model.predict_raw(input)?;
        self.decoder.zip(&raw)
    }
}

/// Successful output of one model for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrediction {
    pub label: ClassLabel,
    pub confidence: f64,
    pub probabilities: ProbabilityDistribution,
}

impl ModelPrediction {
    pub fn from_distribution(
        probabilities: ProbabilityDistribution,
    ) -> Result<Self, InferenceError> {
        let (label, confidence) = probabilities
            .top()
            .ok_or_else(|| InferenceError::Numerical("empty model output".to_string()))?;
        Ok(Self {
            label,
            confidence,
            probabilities,
        })
    }
}

/// Per-model record: a prediction or a failure marker.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResult {
    Success(ModelPrediction),
    Failed { error: String },
}

impl ModelResult {
    pub fn failed(error: impl ToString) -> Self {
        ModelResult::Failed {
            error: error.to_string(),
        }
    }

    pub fn from_outcome(outcome: Result<ProbabilityDistribution, InferenceError>) -> Self {
        match outcome.and_then(ModelPrediction::from_distribution) {
            Ok(prediction) => ModelResult::Success(prediction),
            Err(e) => ModelResult::failed(e),
        }
    }

    pub fn prediction(&self) -> Option<&ModelPrediction> {
        match self {
            ModelResult::Success(prediction) => Some(prediction),
            ModelResult::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ModelResult::Failed { .. })
    }
}

// Wire shape: {"prediction", "confidence", "probabilities"}. Failures keep
// the same keys so clients never have to branch on the shape.
impl Serialize for ModelResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ModelResult", 3)?;
        match self {
            ModelResult::Success(prediction) => {
                state.serialize_field("prediction", &prediction.label)?;
                state.serialize_field("confidence", &prediction.confidence)?;
                state.serialize_field("probabilities", &prediction.probabilities)?;
            }
            ModelResult::Failed { error } => {
                let mut probabilities = BTreeMap::new();
                probabilities.insert("Error", error.as_str());
                state.serialize_field("prediction", "Error")?;
                state.serialize_field("confidence", &0.0)?;
                state.serialize_field("probabilities", &probabilities)?;
            }
        }
        state.end()
    }
}
