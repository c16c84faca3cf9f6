use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, register_counter, register_counter_vec, register_gauge,
    register_histogram,
};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("notify_requests_total", "Total number of admission checks").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("notify_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref AUTH_FAILURES: CounterVec = register_counter_vec!(
        "notify_auth_failures_total",
        "Requests rejected by the bearer token gate",
        &["reason"]
    )
    .unwrap();
    pub static ref TOKENS_ISSUED: Counter =
        register_counter!("notify_tokens_issued_total", "Bearer tokens issued").unwrap();
    pub static ref RATE_LIMIT_KEYS: Gauge =
        register_gauge!("notify_rate_limit_keys", "Client keys with a live window counter").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "notify_request_latency_seconds",
        "Latency of admitted requests in seconds"
    )
    .unwrap();
}
