use serde::{Deserialize, Serialize};

use super::error::InferenceError;

pub const FEATURE_COUNT: usize = 6;

/// Column order the normalizer and every model were fitted with.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["u", "g", "r", "i", "z", "redshift"];

/// Raw photometric measurements for one object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub u: f64,
    pub g: f64,
    pub r: f64,
    pub i: f64,
    pub z: f64,
    pub redshift: f64,
}

impl FeatureVector {
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [self.u, self.g, self.r, self.i, self.z, self.redshift]
    }
}

/// Feature vector after scaling, in `FEATURE_NAMES` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledVector([f64; FEATURE_COUNT]);

impl ScaledVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }
}

/// Pre-fitted affine scaling transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Normalizer {
    /// `(x - mean) / scale`
    Standard {
        feature_names: Vec<String>,
        mean: [f64; FEATURE_COUNT],
        scale: [f64; FEATURE_COUNT],
    },
    /// `x * scale + min`
    MinMax {
        feature_names: Vec<String>,
        min: [f64; FEATURE_COUNT],
        scale: [f64; FEATURE_COUNT],
    },
}

impl Normalizer {
    pub fn standard(mean: [f64; FEATURE_COUNT], scale: [f64; FEATURE_COUNT]) -> Self {
        Normalizer::Standard {
            feature_names: default_feature_names(),
            mean,
            scale,
        }
    }

    pub fn min_max(min: [f64; FEATURE_COUNT], scale: [f64; FEATURE_COUNT]) -> Self {
        Normalizer::MinMax {
            feature_names: default_feature_names(),
            min,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self::standard([0.0; FEATURE_COUNT], [1.0; FEATURE_COUNT])
    }

    /// Checks the fitted parameters against the expected column layout.
    pub fn validate(&self) -> Result<(), String> {
        let (names, offset, scale) = match self {
            Normalizer::Standard {
                feature_names,
                mean,
                scale,
            } => (feature_names, mean, scale),
            Normalizer::MinMax {
                feature_names,
                min,
                scale,
            } => (feature_names, min, scale),
        };

        if names.len() != FEATURE_COUNT
            || names.iter().zip(FEATURE_NAMES.iter()).any(|(a, b)| a != b)
        {
            return Err(format!(
                "fitted column order {:?} does not match {:?}",
                names, FEATURE_NAMES
            ));
        }
        if offset.iter().any(|v| !v.is_finite()) {
            return Err("offset contains non-finite values".to_string());
        }
        if let Normalizer::Standard { .. } = self {
            if scale.iter().any(|v| !v.is_finite() || *v == 0.0) {
                return Err("scale must be finite and non-zero".to_string());
            }
        } else if scale.iter().any(|v| !v.is_finite()) {
            return Err("scale contains non-finite values".to_string());
        }
        Ok(())
    }

    pub fn normalize(&self, features: &FeatureVector) -> Result<ScaledVector, InferenceError> {
        let raw = features.to_array();
        let mut scaled = [0.0; FEATURE_COUNT];

        for (idx, value) in raw.iter().enumerate() {
            scaled[idx] = match self {
                Normalizer::Standard { mean, scale, .. } => (value - mean[idx]) / scale[idx],
                Normalizer::MinMax { min, scale, .. } => value * scale[idx] + min[idx],
            };
        }

        if let Some(idx) = scaled.iter().position(|v| !v.is_finite()) {
            return Err(InferenceError::Numerical(format!(
                "scaled feature '{}' is not finite",
                FEATURE_NAMES[idx]
            )));
        }

        Ok(ScaledVector(scaled))
    }
}

fn default_feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
}
