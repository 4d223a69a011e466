use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Offline evaluation scores for one reference model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetric {
    pub accuracy: f64,
    pub f1_score: f64,
}

/// Held-out test-set scores reported alongside every prediction.
/// Static data: measured when the models were trained.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceTable {
    entries: Vec<(&'static str, PerformanceMetric)>,
}

impl PerformanceTable {
    pub fn reference() -> Self {
        let metric = |accuracy, f1_score| PerformanceMetric { accuracy, f1_score };
        Self {
            entries: vec![
                ("Random Forest (RF)", metric(0.97, 0.97)),
                ("Deep Learning (DL)", metric(0.97, 0.97)),
                ("Multi-Layer Perceptron (MLP)", metric(0.95, 0.94)),
                ("Support Vector Machine (SVM)", metric(0.92, 0.91)),
                ("K-Nearest Neighbours (KNN)", metric(0.89, 0.88)),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<PerformanceMetric> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, metric)| *metric)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for PerformanceTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, metric) in &self.entries {
            map.serialize_entry(name, metric)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_table() {
        let table = PerformanceTable::reference();
        assert_eq!(table.len(), 5);
        assert_eq!(
            table.get("Support Vector Machine (SVM)"),
            Some(PerformanceMetric {
                accuracy: 0.92,
                f1_score: 0.91
            })
        );
        assert!(table.get("XGBoost").is_none());
    }

    #[test]
    fn test_serializes_in_table_order() {
        let json = serde_json::to_string(&PerformanceTable::reference()).unwrap();
        let rf = json.find("Random Forest (RF)").unwrap();
        let knn = json.find("K-Nearest Neighbours (KNN)").unwrap();
        assert!(rf < knn);
        assert!(json.contains(r#""Multi-Layer Perceptron (MLP)":{"accuracy":0.95,"f1_score":0.94}"#));
    }
}
