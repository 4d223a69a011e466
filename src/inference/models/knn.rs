use serde::{Deserialize, Serialize};

use crate::inference::adapter::ProbabilisticClassifier;
use crate::inference::error::InferenceError;
use crate::inference::features::{ScaledVector, FEATURE_COUNT};
use crate::inference::labels::ClassLabel;

/// Uniform-weight k-nearest-neighbours over the stored (scaled) training set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNearestNeighbors {
    pub classes: Vec<ClassLabel>,
    pub k: usize,
    pub points: Vec<[f64; FEATURE_COUNT]>,
    pub labels: Vec<ClassLabel>,
}

impl KNearestNeighbors {
    pub fn validate(&self) -> Result<(), String> {
        if self.k == 0 {
            return Err("k must be positive".to_string());
        }
        if self.points.len() != self.labels.len() {
            return Err(format!(
                "{} points but {} labels",
                self.points.len(),
                self.labels.len()
            ));
        }
        if self.points.len() < self.k {
            return Err(format!(
                "k = {} exceeds {} stored points",
                self.k,
                self.points.len()
            ));
        }
        if let Some(label) = self.labels.iter().find(|l| !self.classes.contains(l)) {
            return Err(format!("label {} is not in the class list", label));
        }
        Ok(())
    }

    fn squared_distance(a: &[f64; FEATURE_COUNT], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }
}

impl ProbabilisticClassifier for KNearestNeighbors {
    fn predict_proba(
        &self,
        input: &ScaledVector,
    ) -> Result<Vec<(ClassLabel, f64)>, InferenceError> {
        if self.points.len() < self.k || self.k == 0 {
            return Err(InferenceError::ShapeMismatch {
                expected: self.k,
                actual: self.points.len(),
            });
        }

        let mut distances: Vec<(f64, usize)> = self
            .points
            .iter()
            .enumerate()
            .map(|(idx, point)| (Self::squared_distance(point, input.as_slice()), idx))
            .collect();
        // Stable sort: equidistant points keep training-set order.
        distances.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut votes = vec![0usize; self.classes.len()];
        for (_, idx) in distances.iter().take(self.k) {
            if let Some(slot) = self.classes.iter().position(|c| *c == self.labels[*idx]) {
                votes[slot] += 1;
            }
        }

        Ok(self
            .classes
            .iter()
            .copied()
            .zip(votes)
            .map(|(label, count)| (label, count as f64 / self.k as f64))
            .collect())
    }
}
