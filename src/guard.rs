//! Abuse guard: blacklist, burst limiter, hit-counter limiter and the
//! protected-path trap, plus the axum middleware that runs them.

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{Extensions, HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashSet;
use std::collections::HashSet;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Args;
use crate::error::Rejection;
use crate::metrics::REJECTIONS;
use crate::rate_limit::BurstLimiter;
use crate::state::AppState;
use crate::traffic::TrafficAggregator;

/// Caller identity: first X-Forwarded-For entry, else the peer address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn from_headers(headers: &HeaderMap, extensions: &Extensions) -> Self {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return Self(ip.to_string());
        }

        let peer = extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_default();
        Self(peer)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp::from_headers(&parts.headers, &parts.extensions))
    }
}

pub struct AbuseGuard {
    blacklist: DashSet<String>,
    burst: BurstLimiter,
    protected_paths: HashSet<String>,
    hit_limit: u64,
}

impl AbuseGuard {
    pub fn new(
        blacklist: impl IntoIterator<Item = String>,
        burst: BurstLimiter,
        protected_paths: impl IntoIterator<Item = String>,
        hit_limit: u64,
    ) -> Self {
        Self {
            blacklist: blacklist.into_iter().filter(|ip| !ip.is_empty()).collect(),
            burst,
            protected_paths: protected_paths.into_iter().collect(),
            hit_limit,
        }
    }

    pub fn from_args(args: &Args) -> Self {
        Self::new(
            args.blacklist.iter().map(|ip| ip.trim().to_string()),
            BurstLimiter::new(args.burst_limit, args.burst_window(), args.block_duration()),
            args.protected_paths.iter().cloned(),
            args.hit_limit,
        )
    }

    pub fn check_blacklist(&self, ip: &str) -> Result<(), Rejection> {
        if self.blacklist.contains(ip) {
            return Err(Rejection::Blacklisted);
        }
        Ok(())
    }

    pub fn check_burst(&self, ip: &str) -> Result<(), Rejection> {
        self.burst.check(ip)
    }

    /// Counts the request against the lifetime ceiling. The counter is the
    /// aggregator's, so the increment also stands for the hit itself.
    pub fn check_hit(&self, traffic: &TrafficAggregator, ip: &str) -> Result<(), Rejection> {
        let hits = traffic.count_request(ip);
        if hits > self.hit_limit {
            tracing::warn!(%ip, hits, limit = self.hit_limit, "hit limit exceeded");
            return Err(Rejection::HitLimit);
        }
        Ok(())
    }

    /// Direct access to an internal resource blacklists the caller.
    pub fn check_protected(&self, path: &str, ip: &str) -> Result<(), Rejection> {
        if self.protected_paths.contains(path) {
            tracing::warn!(%ip, %path, "protected path probed, blacklisting ip");
            self.add_to_blacklist(ip);
            return Err(Rejection::ProtectedPath);
        }
        Ok(())
    }

    pub fn add_to_blacklist(&self, ip: &str) {
        self.burst.unblock(ip);
        self.blacklist.insert(ip.to_string());
    }

    pub fn is_blacklisted(&self, ip: &str) -> bool {
        self.blacklist.contains(ip)
    }

    pub fn is_burst_blocked(&self, ip: &str) -> bool {
        self.burst.is_blocked(ip)
    }
}

pub fn reject(rejection: Rejection) -> Response {
    REJECTIONS.with_label_values(&[rejection.reason()]).inc();
    rejection.into_response()
}

pub async fn blacklist_check(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    req: Request,
    next: Next,
) -> Response {
    if let Err(rejection) = state.guard.check_blacklist(&ip) {
        tracing::warn!(%ip, path = %req.uri().path(), "blacklisted ip refused");
        return reject(rejection);
    }
    next.run(req).await
}

pub async fn burst_limit(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    req: Request,
    next: Next,
) -> Response {
    if let Err(rejection) = state.guard.check_burst(&ip) {
        return reject(rejection);
    }
    next.run(req).await
}

pub async fn hit_limit(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    req: Request,
    next: Next,
) -> Response {
    if let Err(rejection) = state.guard.check_hit(&state.traffic, &ip) {
        return reject(rejection);
    }
    next.run(req).await
}
