pub mod gemini;
pub mod prompt;

pub use gemini::GeminiClient;
pub use prompt::explanation_prompt;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::inference::ClassLabel;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExplainError {
    #[error("Explanation service is not configured")]
    NotConfigured,

    #[error("Explanation service request failed: {0}")]
    Request(String),

    #[error("Explanation service returned no text")]
    EmptyResponse,
}

/// External free-form text generator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ExplainError>;
}

/// Turns a consensus result into prose via the configured generator.
#[derive(Clone)]
pub struct Explainer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Explainer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    pub fn disabled() -> Self {
        Self { generator: None }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn explain(&self, label: ClassLabel, confidence: f64) -> Result<String, ExplainError> {
        let generator = self.generator.as_ref().ok_or(ExplainError::NotConfigured)?;
        let prompt = explanation_prompt(label, confidence);

        match generator.generate(&prompt).await {
            Ok(text) if text.trim().is_empty() => Err(ExplainError::EmptyResponse),
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::error!("❌ Explanation service error: {}", e);
                Err(e)
            }
        }
    }
}
