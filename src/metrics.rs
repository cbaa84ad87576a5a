use lazy_static::lazy_static;
use prometheus::{
    Histogram, IntCounter, IntCounterVec, IntGauge, register_histogram, register_int_counter,
    register_int_counter_vec, register_int_gauge,
};


lazy_static! {
    pub static ref HITS_TOTAL: IntCounter =
        register_int_counter!("visit_hits_total", "Total accepted hits").unwrap();
    pub static ref REJECTIONS: IntCounterVec = register_int_counter_vec!(
        "visit_rejections_total",
        "Requests rejected by the abuse guard",
        &["reason"]
    )
    .unwrap();
    pub static ref DISTINCT_IPS: IntGauge =
        register_int_gauge!("visit_distinct_ips", "Distinct identifiers seen since start").unwrap();
    pub static ref COUNTRY_CACHE_HITS: IntCounter =
        register_int_counter!("visit_country_cache_hits_total", "Country cache hits").unwrap();
    pub static ref COUNTRY_CACHE_MISSES: IntCounter =
        register_int_counter!("visit_country_cache_misses_total", "Country cache misses").unwrap();
    pub static ref LOG_WRITE_FAILURES: IntCounter =
        register_int_counter!("visit_log_write_failures_total", "Failed visit log writes").unwrap();
    pub static ref STATS_LATENCY: Histogram = register_histogram!(
        "visit_stats_latency_seconds",
        "Stats computation latency in seconds"
    )
    .unwrap();
}
