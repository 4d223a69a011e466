pub mod handlers;
pub mod routes;
pub mod types;

pub use routes::routes;
pub use types::{ErrorBody, ExplanationRequest, ExplanationResponse};

use crate::core::{HealthChecker, InferenceMetrics};
use crate::explain::Explainer;
use crate::inference::Ensemble;

/// Everything a request handler can see. Read-only after startup.
pub struct AppState {
    pub ensemble: Ensemble,
    pub explainer: Explainer,
    pub importance_model: String,
    pub health: HealthChecker,
    pub metrics: InferenceMetrics,
}
