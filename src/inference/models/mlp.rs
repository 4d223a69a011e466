use serde::{Deserialize, Serialize};

use super::{label_probabilities, softmax};
use crate::inference::adapter::{ProbabilisticClassifier, SoftmaxClassifier};
use crate::inference::error::InferenceError;
use crate::inference::features::{ScaledVector, FEATURE_COUNT};
use crate::inference::labels::ClassLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Identity,
    Relu,
    Tanh,
    Logistic,
    Softmax,
}

impl Activation {
    fn apply(&self, values: Vec<f64>) -> Vec<f64> {
        match self {
            Activation::Identity => values,
            Activation::Relu => values.into_iter().map(|v| v.max(0.0)).collect(),
            Activation::Tanh => values.into_iter().map(f64::tanh).collect(),
            Activation::Logistic => values
                .into_iter()
                .map(|v| 1.0 / (1.0 + (-v).exp()))
                .collect(),
            Activation::Softmax => softmax(&values),
        }
    }
}

/// Fully connected layer; `weights` holds one row per output unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    fn forward(&self, input: &[f64]) -> Result<Vec<f64>, InferenceError> {
        let mut output = Vec::with_capacity(self.weights.len());
        for (row, b) in self.weights.iter().zip(&self.bias) {
            if row.len() != input.len() {
                return Err(InferenceError::ShapeMismatch {
                    expected: row.len(),
                    actual: input.len(),
                });
            }
            output.push(row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + b);
        }
        Ok(self.activation.apply(output))
    }
}

/// Feed-forward network returning the raw output vector of its last layer.
///
/// Used directly as the index-and-decode model, and wrapped by
/// [`MlpClassifier`] when the artifact carries its own class list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseNetwork {
    pub layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    pub fn validate(&self) -> Result<(), String> {
        let mut width = FEATURE_COUNT;
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.weights.is_empty() || layer.weights.len() != layer.bias.len() {
                return Err(format!("layer {} has mismatched weights and bias", idx));
            }
            if layer.weights.iter().any(|row| row.len() != width) {
                return Err(format!("layer {} expects {} inputs", idx, width));
            }
            width = layer.weights.len();
        }
        if self.layers.is_empty() {
            return Err("network has no layers".to_string());
        }
        Ok(())
    }

    pub fn output_width(&self) -> usize {
        self.layers.last().map(|l| l.weights.len()).unwrap_or(0)
    }

    pub fn forward(&self, input: &ScaledVector) -> Result<Vec<f64>, InferenceError> {
        let mut activations = input.as_slice().to_vec();
        for layer in &self.layers {
            activations = layer.forward(&activations)?;
        }
        if activations.iter().any(|v| !v.is_finite()) {
            return Err(InferenceError::Numerical(
                "network produced a non-finite output".to_string(),
            ));
        }
        Ok(activations)
    }
}

impl SoftmaxClassifier for DenseNetwork {
    fn predict_raw(&self, input: &ScaledVector) -> Result<Vec<f64>, InferenceError> {
        self.forward(input)
    }
}

/// Multilayer perceptron that knows its own class ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    pub classes: Vec<ClassLabel>,
    #[serde(flatten)]
    pub network: DenseNetwork,
}

impl MlpClassifier {
    pub fn validate(&self) -> Result<(), String> {
        self.network.validate()?;
        if self.network.output_width() != self.classes.len() {
            return Err(format!(
                "output layer has {} units for {} classes",
                self.network.output_width(),
                self.classes.len()
            ));
        }
        Ok(())
    }
}

impl ProbabilisticClassifier for MlpClassifier {
    fn predict_proba(
        &self,
        input: &ScaledVector,
    ) -> Result<Vec<(ClassLabel, f64)>, InferenceError> {
        label_probabilities(&self.classes, self.network.forward(input)?)
    }
}
