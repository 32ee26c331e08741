//! Prometheus metrics for the beacon rendezvous relay
//!
//! Provides centralized metrics collection for monitoring:
//! - Submission traffic by write mode
//! - Fetch traffic by outcome
//! - Store failures and timeouts
//! - Undecodable stored values
//!
//! The relay never surfaces internal failures to callers (every relay
//! response is 200), so these counters and the logs are the only place
//! anomalies are observable.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, IntCounter, IntCounterVec, TextEncoder, opts, register_int_counter,
    register_int_counter_vec,
};

// ============================================================================
// Relay Traffic Metrics
// ============================================================================

/// Total number of envelope submissions, labeled by write mode
/// ("replace", "append", "ignored")
pub static SUBMITS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "rendezvous_submits_total",
            "Total number of envelope submissions by write mode"
        ),
        &["mode"]
    )
    .expect("Failed to register SUBMITS_TOTAL metric")
});

/// Total number of fetches, labeled by outcome ("hit", "miss", "liveness")
pub static FETCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "rendezvous_fetches_total",
            "Total number of fetches by outcome"
        ),
        &["outcome"]
    )
    .expect("Failed to register FETCHES_TOTAL metric")
});

// ============================================================================
// Anomaly Metrics
// ============================================================================

/// Store operations that failed or timed out, labeled by operation
/// ("get", "put")
pub static STORE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "rendezvous_store_failures_total",
            "Store operations that failed or timed out, by operation"
        ),
        &["op"]
    )
    .expect("Failed to register STORE_FAILURES_TOTAL metric")
});

/// Stored values that could not be decoded and were treated as absent
pub static DECODE_ANOMALIES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "rendezvous_decode_anomalies_total",
        "Stored values that could not be decoded and were treated as absent"
    ))
    .expect("Failed to register DECODE_ANOMALIES_TOTAL metric")
});

// ============================================================================
// Exposition
// ============================================================================

/// Gather all registered metrics in the Prometheus text format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
