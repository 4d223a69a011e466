use serde::{Deserialize, Serialize};

use super::error::InferenceError;
use super::labels::{ClassLabel, ProbabilityDistribution};

/// Index → label table shipped alongside models that only emit a bare
/// probability vector. Its ordering is authoritative for that model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDecoder {
    classes: Vec<ClassLabel>,
}

impl LabelDecoder {
    pub fn new(classes: Vec<ClassLabel>) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &[ClassLabel] {
        &self.classes
    }

    pub fn decode(&self, index: usize) -> Option<ClassLabel> {
        self.classes.get(index).copied()
    }

    /// Pairs the `k`-th raw probability with the `k`-th decoder class.
    pub fn zip(&self, raw: &[f64]) -> Result<ProbabilityDistribution, InferenceError> {
        if raw.len() != self.classes.len() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.classes.len(),
                actual: raw.len(),
            });
        }
        ProbabilityDistribution::from_pairs(self.classes.iter().copied().zip(raw.iter().copied()))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("decoder has no classes".to_string());
        }
        for (idx, label) in self.classes.iter().enumerate() {
            if self.classes[..idx].contains(label) {
                return Err(format!("decoder lists {} twice", label));
            }
        }
        Ok(())
    }
}
