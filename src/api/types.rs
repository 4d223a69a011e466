use serde::{Deserialize, Serialize};

use crate::inference::ClassLabel;

/// Body of `/get_explanation`. `prediction` is kept as text so a client
/// echoing an `"Error"` consensus gets a specific answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub prediction: String,
    pub confidence: f64,
}

impl ExplanationRequest {
    /// The consensus carried no label because every model failed.
    pub fn is_failed_consensus(&self) -> bool {
        self.prediction.trim().eq_ignore_ascii_case("error")
    }

    pub fn label(&self) -> Result<ClassLabel, String> {
        self.prediction.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    pub message: String,
}
