use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_COUNTRY: &str = "Unknown";

// One accepted hit, as persisted in the visit log
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct VisitEvent {
    #[serde(alias = "ip")]
    pub identifier: String,
    pub timestamp: DateTime<Utc>,
}

impl VisitEvent {
    pub fn new(identifier: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.into(),
            timestamp,
        }
    }
}

// /hit response body
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct HitResponse {
    pub url: String,
    pub message: String,
}

// /stats response body
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total: u64,
    pub rps: u64,
    pub ip_count: usize,
    pub most_country: String,
    pub most_request_identifier: String,
    pub most_frequent_identifier: String,
    pub whois_most_frequent_identifier: String,
}
