use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

use super::handlers;
use super::types::ExplanationRequest;
use super::AppState;
use crate::inference::FeatureVector;

const MAX_BODY_BYTES: u64 = 16 * 1024;

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Full HTTP surface: welcome, health, predict, explanation, importance, metrics.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "HEAD", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type", "authorization"]);

    let root = warp::path::end().and(warp::get()).map(handlers::welcome);

    let health = warp::path!("health")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(handlers::health);

    let health_head = warp::path!("health")
        .and(warp::head())
        .map(|| warp::http::StatusCode::OK);

    let predict = warp::path!("predict")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<FeatureVector>())
        .and(with_state(state.clone()))
        .and_then(handlers::predict);

    let explanation = warp::path!("get_explanation")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<ExplanationRequest>())
        .and(with_state(state.clone()))
        .and_then(handlers::explanation);

    let importance = warp::path!("feature_importance")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(handlers::feature_importance);

    let metrics = warp::path!("metrics")
        .and(warp::get())
        .and(with_state(state))
        .map(handlers::metrics);

    root.or(health)
        .or(health_head)
        .or(predict)
        .or(explanation)
        .or(importance)
        .or(metrics)
        .with(cors)
        .with(warp::trace::request())
        .recover(handlers::handle_rejection)
}
