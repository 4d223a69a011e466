use serde::{Deserialize, Serialize};

use super::label_probabilities;
use crate::inference::adapter::ProbabilisticClassifier;
use crate::inference::error::InferenceError;
use crate::inference::features::{ScaledVector, FEATURE_COUNT};
use crate::inference::labels::ClassLabel;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Go `left` when `x[feature] <= threshold`, otherwise `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class training sample weights reaching this leaf.
    Leaf { value: Vec<f64> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!("node {} splits on feature {}", idx, feature));
                    }
                    // Children must point forward, which also rules out cycles.
                    let n = self.nodes.len();
                    if *left <= idx || *right <= idx || *left >= n || *right >= n {
                        return Err(format!("node {} has invalid children", idx));
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf {} has {} values for {} classes",
                            idx,
                            value.len(),
                            n_classes
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_probabilities(&self, input: &[f64]) -> Result<Vec<f64>, InferenceError> {
        let mut idx = 0;
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = input.get(*feature).ok_or(InferenceError::ShapeMismatch {
                        expected: feature + 1,
                        actual: input.len(),
                    })?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { value }) => {
                    let total: f64 = value.iter().sum();
                    if total <= 0.0 {
                        return Err(InferenceError::Numerical(format!(
                            "leaf {} has no sample weight",
                            idx
                        )));
                    }
                    return Ok(value.iter().map(|v| v / total).collect());
                }
                None => {
                    return Err(InferenceError::Numerical(format!(
                        "tree walked to missing node {}",
                        idx
                    )))
                }
            }
        }
        Err(InferenceError::Numerical("tree walk did not reach a leaf".to_string()))
    }
}

/// Bagged decision trees; class probabilities are the mean of per-tree
/// leaf frequencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub classes: Vec<ClassLabel>,
    pub feature_importances: [f64; FEATURE_COUNT],
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.classes.len())
                .map_err(|e| format!("tree {}: {}", idx, e))?;
        }
        Ok(())
    }
}

impl ProbabilisticClassifier for RandomForest {
    fn predict_proba(
        &self,
        input: &ScaledVector,
    ) -> Result<Vec<(ClassLabel, f64)>, InferenceError> {
        let mut sums = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let probs = tree.leaf_probabilities(input.as_slice())?;
            if probs.len() != sums.len() {
                return Err(InferenceError::ShapeMismatch {
                    expected: sums.len(),
                    actual: probs.len(),
                });
            }
            for (sum, p) in sums.iter_mut().zip(probs) {
                *sum += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        label_probabilities(&self.classes, sums.into_iter().map(|s| s / n_trees).collect())
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(self.feature_importances.to_vec())
    }
}
