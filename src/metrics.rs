use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Gauge, Histogram, TextEncoder, register_counter, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("portfolio_client_requests_total", "Total number of API requests").unwrap();
    pub static ref REQUEST_FAILURES: Counter =
        register_counter!("portfolio_client_request_failures_total", "API requests that failed").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("portfolio_client_cache_hits_total", "Like-status cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("portfolio_client_cache_misses_total", "Like-status cache misses").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "portfolio_client_request_latency_seconds",
        "API request latency in seconds"
    )
    .unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("portfolio_client_cache_size", "Current number of cached batch lookups").unwrap();
    pub static ref OPTIMISTIC_ROLLBACKS: Counter = register_counter!(
        "portfolio_client_optimistic_rollbacks_total",
        "Optimistic updates rolled back after a failed request"
    )
    .unwrap();
}

// Text exposition of everything registered in the default registry
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
