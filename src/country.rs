use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::LookupError;
use crate::metrics::{COUNTRY_CACHE_HITS, COUNTRY_CACHE_MISSES};
use crate::models::UNKNOWN_COUNTRY;

/// Outbound IP-to-country lookup.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// `Ok(None)` when the service answered without a country.
    async fn lookup(&self, ip: &str) -> Result<Option<String>, LookupError>;
}

// ipwhois-style JSON body, only the field we need
#[derive(Deserialize)]
struct WhoisBody {
    country: Option<String>,
}

pub struct WhoisClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl WhoisClient {
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl GeoLookup for WhoisClient {
    async fn lookup(&self, ip: &str) -> Result<Option<String>, LookupError> {
        let url = format!("{}/{}", self.base_url, ip);
        let res = self.client.get(&url).timeout(self.timeout).send().await?;
        if !res.status().is_success() {
            return Err(LookupError::Status(res.status()));
        }
        let body = res.json::<WhoisBody>().await?;
        Ok(body.country.filter(|c| !c.is_empty()))
    }
}

/// Cached country resolution. Entries are never evicted; failures are
/// cached as "Unknown" too.
pub struct CountryResolver {
    lookup: Arc<dyn GeoLookup>,
    cache: DashMap<String, String>,
}

impl CountryResolver {
    pub fn new(lookup: Arc<dyn GeoLookup>) -> Self {
        Self {
            lookup,
            cache: DashMap::new(),
        }
    }

    pub async fn resolve(&self, ip: &str) -> String {
        if ip.is_empty() {
            return UNKNOWN_COUNTRY.to_string();
        }

        // check cache first
        if let Some(country) = self.cache.get(ip) {
            COUNTRY_CACHE_HITS.inc();
            return country.clone();
        }
        COUNTRY_CACHE_MISSES.inc();

        let country = match self.lookup.lookup(ip).await {
            Ok(Some(country)) => country,
            Ok(None) => UNKNOWN_COUNTRY.to_string(),
            Err(e) => {
                tracing::error!(%ip, error = %e, "country lookup failed");
                UNKNOWN_COUNTRY.to_string()
            }
        };
        self.cache.insert(ip.to_string(), country.clone());
        country
    }

    pub fn cached(&self, ip: &str) -> Option<String> {
        self.cache.get(ip).map(|c| c.clone())
    }
}
