use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::error::ImportanceError;
use super::features::{FEATURE_COUNT, FEATURE_NAMES};
use super::registry::ModelRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScore {
    pub feature: &'static str,
    pub importance: f64,
}

/// Features ordered by descending importance.
///
/// Serialized as a JSON object whose key order is the ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRanking(Vec<FeatureScore>);

impl FeatureRanking {
    /// Stable descending sort: equal scores keep the fitted column order.
    pub fn from_scores(scores: &[f64; FEATURE_COUNT]) -> Self {
        let mut ranked: Vec<FeatureScore> = FEATURE_NAMES
            .iter()
            .zip(scores.iter())
            .map(|(feature, importance)| FeatureScore {
                feature: *feature,
                importance: *importance,
            })
            .collect();
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        Self(ranked)
    }

    pub fn entries(&self) -> &[FeatureScore] {
        &self.0
    }

    pub fn features(&self) -> Vec<&'static str> {
        self.0.iter().map(|s| s.feature).collect()
    }
}

impl Serialize for FeatureRanking {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for score in &self.0 {
            map.serialize_entry(score.feature, &score.importance)?;
        }
        map.end()
    }
}

/// Ranks features by the importance scores of the designated model.
pub fn rank(registry: &ModelRegistry, model_id: &str) -> Result<FeatureRanking, ImportanceError> {
    let adapter = registry
        .get(model_id)
        .ok_or_else(|| ImportanceError::ModelMissing(model_id.to_string()))?;

    let scores = adapter
        .feature_importances()
        .ok_or_else(|| ImportanceError::Unsupported(model_id.to_string()))?;

    let scores: [f64; FEATURE_COUNT] = scores.try_into().map_err(|raw: Vec<f64>| {
        tracing::warn!(
            "Model '{}' reported {} importances for {} features",
            model_id,
            raw.len(),
            FEATURE_COUNT
        );
        ImportanceError::Unsupported(model_id.to_string())
    })?;

    Ok(FeatureRanking::from_scores(&scores))
}
