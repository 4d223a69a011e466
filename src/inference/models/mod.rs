//! Pure-Rust evaluators for the pre-trained model families in the ensemble.
//!
//! Each evaluator is deserialized from a JSON artifact exported after
//! training and is read-only afterwards.

pub mod forest;
pub mod knn;
pub mod linear;
pub mod mlp;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use forest::RandomForest;
pub use knn::KNearestNeighbors;
pub use linear::LinearClassifier;
pub use mlp::{DenseNetwork, MlpClassifier};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

use super::error::InferenceError;
use super::labels::ClassLabel;

/// Numerically stable softmax.
pub(crate) fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|v| v / sum).collect()
}

pub(crate) fn label_probabilities(
    classes: &[ClassLabel],
    probabilities: Vec<f64>,
) -> Result<Vec<(ClassLabel, f64)>, InferenceError> {
    if probabilities.len() != classes.len() {
        return Err(InferenceError::ShapeMismatch {
            expected: classes.len(),
            actual: probabilities.len(),
        });
    }
    Ok(classes.iter().copied().zip(probabilities).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_logits_are_stable() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert_eq!(probs, vec![0.5, 0.5]);
    }
}
