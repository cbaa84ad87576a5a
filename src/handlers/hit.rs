use axum::{Json, extract::State};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;

use crate::guard::ClientIp;
use crate::models::HitResponse;
use crate::state::AppState;

pub async fn hit_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
) -> Json<HitResponse> {
    state.traffic.record_hit(&ip, Utc::now());

    // fire and forget, a pending signal already covers this hit
    if let Err(TrySendError::Closed(())) = state.log_tx.try_send(()) {
        tracing::error!("log writer is gone, visit log no longer persisted");
    }

    Json(state.hit_reply.clone())
}
