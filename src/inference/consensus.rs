use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use super::adapter::ModelResult;
use super::labels::ClassLabel;

/// Plurality-vote outcome across the valid model results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    /// Winning label, or `None` when no model produced a valid result
    /// (serialized as `"Error"`).
    #[serde(serialize_with = "serialize_verdict")]
    pub prediction: Option<ClassLabel>,
    pub count: usize,
    pub total: usize,
    pub confidence: f64,
}

impl ConsensusResult {
    pub fn error() -> Self {
        Self {
            prediction: None,
            count: 0,
            total: 0,
            confidence: 0.0,
        }
    }

    pub fn is_error(&self) -> bool {
        self.prediction.is_none()
    }
}

fn serialize_verdict<S: Serializer>(
    prediction: &Option<ClassLabel>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match prediction {
        Some(label) => label.serialize(serializer),
        None => serializer.serialize_str("Error"),
    }
}

/// Reduces per-model results to one label.
///
/// Each valid model casts one vote for its top label. The label with the
/// most votes wins; equal vote counts go to the label that comes first in
/// canonical order. Confidence is the mean confidence of the models that
/// voted for the winner.
pub fn resolve<'a, I>(results: I) -> ConsensusResult
where
    I: IntoIterator<Item = &'a ModelResult>,
{
    // label -> (votes, confidence sum)
    let mut tally: BTreeMap<ClassLabel, (usize, f64)> = BTreeMap::new();
    let mut total = 0;

    for prediction in results.into_iter().filter_map(ModelResult::prediction) {
        let entry = tally.entry(prediction.label).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += prediction.confidence;
        total += 1;
    }

    let mut winner: Option<(ClassLabel, usize, f64)> = None;
    for (label, (votes, confidence_sum)) in tally {
        match winner {
            Some((_, best, _)) if votes <= best => {}
            _ => winner = Some((label, votes, confidence_sum)),
        }
    }

    match winner {
        Some((label, count, confidence_sum)) => ConsensusResult {
            prediction: Some(label),
            count,
            total,
            confidence: confidence_sum / count as f64,
        },
        None => ConsensusResult::error(),
    }
}
