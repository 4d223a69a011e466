use serde::{Deserialize, Serialize};

use super::{label_probabilities, softmax};
use crate::inference::adapter::ProbabilisticClassifier;
use crate::inference::error::InferenceError;
use crate::inference::features::{ScaledVector, FEATURE_COUNT};
use crate::inference::labels::ClassLabel;

/// One-vs-rest linear decision functions squashed through a softmax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub classes: Vec<ClassLabel>,
    pub coef: Vec<[f64; FEATURE_COUNT]>,
    pub intercept: Vec<f64>,
}

impl LinearClassifier {
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("no classes".to_string());
        }
        if self.coef.len() != self.classes.len() || self.intercept.len() != self.classes.len() {
            return Err(format!(
                "{} classes but {} coefficient rows and {} intercepts",
                self.classes.len(),
                self.coef.len(),
                self.intercept.len()
            ));
        }
        Ok(())
    }

    fn decision_function(&self, input: &ScaledVector) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| {
                row.iter()
                    .zip(input.as_slice())
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
                    + b
            })
            .collect()
    }
}

impl ProbabilisticClassifier for LinearClassifier {
    fn predict_proba(
        &self,
        input: &ScaledVector,
    ) -> Result<Vec<(ClassLabel, f64)>, InferenceError> {
        let scores = self.decision_function(input);
        label_probabilities(&self.classes, softmax(&scores))
    }
}
