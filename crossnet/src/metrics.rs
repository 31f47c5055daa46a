//! Prometheus metrics for cross-network messaging

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static! {
    /// Total cross-network requests by outcome
    pub static ref NET_REQUEST_TOTAL: CounterVec = register_counter_vec!(
        "crossnet_request_total",
        "Total cross-network requests",
        &["network", "status"]
    )
    .unwrap();

    /// Cross-network request duration
    pub static ref NET_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "crossnet_request_duration_seconds",
        "Cross-network request duration in seconds",
        &["network"]
    )
    .unwrap();
}
