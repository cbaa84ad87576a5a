pub mod config;
pub mod country;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod traffic;
pub mod worker;

use axum::{Router, middleware::from_fn_with_state, routing::get};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::guard::{blacklist_check, burst_limit, hit_limit};
use crate::handlers::{
    fallback_handler, hit_handler, index_handler, metrics_handler, stats_handler,
    take_photo_handler,
};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    // layers run bottom-up: blacklist, then burst
    let guarded = Router::new()
        .route("/", get(index_handler))
        .route("/stats", get(stats_handler))
        .route_layer(from_fn_with_state(state.clone(), burst_limit))
        .route_layer(from_fn_with_state(state.clone(), blacklist_check));

    let tracked = Router::new()
        .route("/hit", get(hit_handler))
        .route_layer(from_fn_with_state(state.clone(), hit_limit));

    Router::new()
        .merge(guarded)
        .merge(tracked)
        .route("/api/takephoto", get(take_photo_handler))
        .route("/metrics", get(metrics_handler))
        .fallback(fallback_handler)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
