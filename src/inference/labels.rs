use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::InferenceError;

/// Object classes the ensemble can predict.
///
/// Variant order is the canonical label order (GALAXY, QSO, STAR). Every
/// tie-break in the crate falls back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClassLabel {
    Galaxy,
    Qso,
    Star,
}

impl ClassLabel {
    pub const ALL: [ClassLabel; 3] = [ClassLabel::Galaxy, ClassLabel::Qso, ClassLabel::Star];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassLabel::Galaxy => "GALAXY",
            ClassLabel::Qso => "QSO",
            ClassLabel::Star => "STAR",
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClassLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GALAXY" => Ok(ClassLabel::Galaxy),
            "QSO" => Ok(ClassLabel::Qso),
            "STAR" => Ok(ClassLabel::Star),
            other => Err(format!("unknown class label '{}'", other)),
        }
    }
}

/// Class → probability mapping produced by one model.
///
/// Values are kept exactly as the model produced them; they are expected,
/// not forced, to sum to one.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ProbabilityDistribution {
    probabilities: BTreeMap<ClassLabel, f64>,
}

impl ProbabilityDistribution {
    /// Builds a distribution from (label, probability) pairs.
    ///
    /// Rejects duplicate labels and values that are negative or not finite.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, InferenceError>
    where
        I: IntoIterator<Item = (ClassLabel, f64)>,
    {
        let mut probabilities = BTreeMap::new();
        for (label, probability) in pairs {
            if !probability.is_finite() || probability < 0.0 {
                return Err(InferenceError::Numerical(format!(
                    "invalid probability {} for {}",
                    probability, label
                )));
            }
            if probabilities.insert(label, probability).is_some() {
                return Err(InferenceError::Numerical(format!(
                    "duplicate label {} in model output",
                    label
                )));
            }
        }
        if probabilities.is_empty() {
            return Err(InferenceError::Numerical("empty model output".to_string()));
        }
        Ok(Self { probabilities })
    }

    pub fn get(&self, label: ClassLabel) -> Option<f64> {
        self.probabilities.get(&label).copied()
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Iterates in canonical label order.
    pub fn iter(&self) -> impl Iterator<Item = (ClassLabel, f64)> + '_ {
        self.probabilities.iter().map(|(label, p)| (*label, *p))
    }

    /// Label with the highest probability. Equal probabilities resolve to
    /// the label that comes first in canonical order.
    pub fn top(&self) -> Option<(ClassLabel, f64)> {
        let mut best: Option<(ClassLabel, f64)> = None;
        for (label, probability) in self.iter() {
            match best {
                Some((_, current)) if probability <= current => {}
                _ => best = Some((label, probability)),
            }
        }
        best
    }
}
