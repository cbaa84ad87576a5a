use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ProxyError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TakePhotoParams {
    url: Option<String>,
}

// Image proxy for the dashboard's screenshot export
pub async fn take_photo_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TakePhotoParams>,
) -> Result<Response, ProxyError> {
    let url = params
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or(ProxyError::MissingUrl)?;

    let res = state.client.get(&url).send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(ProxyError::Upstream {
            status,
            reason: status.canonical_reason().unwrap_or("unknown status").to_string(),
        });
    }

    let content_type = res.headers().get(header::CONTENT_TYPE).cloned();
    let mut response = Body::from_stream(res.bytes_stream()).into_response();
    if let Some(content_type) = content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    Ok(response)
}
