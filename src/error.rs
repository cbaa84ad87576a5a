use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// Policy rejections produced by the abuse guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Blacklisted,
    BurstBlocked,
    HitLimit,
    ProtectedPath,
}

impl Rejection {
    pub fn status(self) -> StatusCode {
        match self {
            Rejection::Blacklisted => StatusCode::FORBIDDEN,
            Rejection::BurstBlocked | Rejection::HitLimit => StatusCode::TOO_MANY_REQUESTS,
            Rejection::ProtectedPath => StatusCode::NOT_FOUND,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Rejection::Blacklisted => "Access denied.",
            Rejection::BurstBlocked => "Too many requests. Your IP has been temporarily blocked.",
            Rejection::HitLimit => "Too many requests.",
            Rejection::ProtectedPath => "Not Found",
        }
    }

    // metric label
    pub fn reason(self) -> &'static str {
        match self {
            Rejection::Blacklisted => "blacklist",
            Rejection::BurstBlocked => "burst",
            Rejection::HitLimit => "hit_limit",
            Rejection::ProtectedPath => "protected_path",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status(), self.message()).into_response()
    }
}

// Outbound country lookup failures, always absorbed by the resolver
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("lookup request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("lookup returned status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("log file io: {0}")]
    Io(#[from] std::io::Error),
    #[error("log encoding: {0}")]
    Json(#[from] serde_json::Error),
}

// Image proxy failures
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("URL parameter not found.")]
    MissingUrl,
    #[error("Failed to fetch image: {reason}")]
    Upstream { status: StatusCode, reason: String },
    #[error("Failed to download image.")]
    Fetch(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::MissingUrl => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::Fetch(e) => {
                tracing::error!(error = %e, "image download failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_map_to_policy_statuses() {
        assert_eq!(Rejection::Blacklisted.status(), StatusCode::FORBIDDEN);
        assert_eq!(Rejection::BurstBlocked.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(Rejection::HitLimit.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(Rejection::ProtectedPath.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_error_keeps_status() {
        let resp = ProxyError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            reason: "Bad Gateway".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ProxyError::MissingUrl.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
