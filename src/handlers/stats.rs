use axum::{Json, extract::State};
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::STATS_LATENCY;
use crate::models::StatsSnapshot;
use crate::state::AppState;

pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    let start_time = Instant::now();
    let stats = state.traffic.compute_stats(&state.countries).await;
    STATS_LATENCY.observe(start_time.elapsed().as_secs_f64());
    Json(stats)
}
