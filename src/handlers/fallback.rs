use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::Rejection;
use crate::guard::{ClientIp, reject};
use crate::state::AppState;

// Unrouted paths: blacklist first, then the protected-path trap
pub async fn fallback_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    uri: Uri,
) -> Response {
    let guard = &state.guard;
    if let Err(rejection) = guard
        .check_blacklist(&ip)
        .and_then(|_| guard.check_protected(uri.path(), &ip))
    {
        if rejection == Rejection::Blacklisted {
            tracing::warn!(%ip, path = %uri.path(), "blacklisted ip refused");
        }
        return reject(rejection);
    }
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}
