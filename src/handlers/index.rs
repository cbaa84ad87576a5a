use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use crate::state::AppState;

// dashboard entry point
pub async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    let path = state.public_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "dashboard not found");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}
