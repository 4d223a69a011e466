use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};
use warp::Rejection;

use super::types::{ErrorBody, ExplanationRequest, ExplanationResponse, WelcomeMessage};
use super::AppState;
use crate::explain::ExplainError;
use crate::inference::FeatureVector;

pub fn error_reply(status: StatusCode, message: impl Into<String>) -> Response {
    reply::with_status(reply::json(&ErrorBody::new(message)), status).into_response()
}

pub fn welcome() -> Response {
    reply::json(&WelcomeMessage {
        message: "Welcome to the Nebula Lens API!".to_string(),
    })
    .into_response()
}

pub fn health(state: Arc<AppState>) -> Response {
    let status = state.health.get_status(&state.ensemble, &state.explainer);
    reply::json(&status).into_response()
}

pub fn metrics(state: Arc<AppState>) -> Response {
    reply::with_header(
        state.metrics.gather(),
        "content-type",
        "text/plain; version=0.0.4",
    )
    .into_response()
}

pub async fn predict(
    features: FeatureVector,
    state: Arc<AppState>,
) -> Result<Response, Infallible> {
    let span = tracing::info_span!("predict", request_id = %Uuid::new_v4());

    async move {
        let start = Instant::now();

        match state.ensemble.infer(features).await {
            Ok(response) => {
                let elapsed = start.elapsed();
                state.metrics.record_response(&response, elapsed.as_secs_f64());

                let agreement = &response.model_agreement;
                tracing::info!(
                    "🎯 Consensus: {} ({}/{} models, confidence {:.2}) in {:.2}ms",
                    agreement
                        .prediction
                        .map(|label| label.to_string())
                        .unwrap_or_else(|| "Error".to_string()),
                    agreement.count,
                    agreement.total,
                    agreement.confidence,
                    elapsed.as_secs_f64() * 1000.0
                );

                Ok(reply::json(&response).into_response())
            }
            Err(e) if e.is_not_ready() => {
                state.metrics.record_not_ready();
                tracing::warn!("⚠️  Prediction rejected: {}", e);
                Ok(error_reply(
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("{}. Check backend server logs.", e),
                ))
            }
            Err(e) => {
                tracing::warn!("⚠️  Prediction input rejected: {}", e);
                Ok(error_reply(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("Error during data scaling: {}", e),
                ))
            }
        }
    }
    .instrument(span)
    .await
}

pub async fn explanation(
    request: ExplanationRequest,
    state: Arc<AppState>,
) -> Result<Response, Infallible> {
    if !request.confidence.is_finite() || !(0.0..=1.0).contains(&request.confidence) {
        return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            "confidence must be between 0 and 1",
        ));
    }

    if request.is_failed_consensus() {
        return Ok(error_reply(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Explanation unavailable: no model produced a prediction.",
        ));
    }

    let label = match request.label() {
        Ok(label) => label,
        Err(e) => {
            return Ok(error_reply(
                StatusCode::BAD_REQUEST,
                format!("Invalid prediction: {}", e),
            ))
        }
    };

    match state.explainer.explain(label, request.confidence).await {
        Ok(explanation) => Ok(reply::json(&ExplanationResponse { explanation }).into_response()),
        Err(ExplainError::NotConfigured) => Ok(error_reply(
            StatusCode::BAD_GATEWAY,
            "Explanation service is not initialized. Check API key.",
        )),
        Err(_) => {
            state.metrics.record_explanation_failure();
            Ok(error_reply(
                StatusCode::BAD_GATEWAY,
                "Failed to generate explanation.",
            ))
        }
    }
}

pub fn feature_importance(state: Arc<AppState>) -> Response {
    match state.ensemble.feature_importance(&state.importance_model) {
        Ok(ranking) => reply::json(&ranking).into_response(),
        Err(e) => {
            tracing::debug!("Feature importance unavailable: {}", e);
            error_reply(StatusCode::NOT_FOUND, e.to_string())
        }
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected a JSON body".to_string(),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            "Content-Length header is required".to_string(),
        )
    } else if let Some(e) = err.find::<warp::filters::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(error_reply(status, message))
}
