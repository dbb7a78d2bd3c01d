//! Metrics and observability utilities
//!
//! Provides Prometheus metric descriptions with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Newsboard metrics
pub const METRICS_PREFIX: &str = "newsboard";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 50ms, P99 < 150ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms - P50 target
    0.075,  // 75ms
    0.100,  // 100ms
    0.150,  // 150ms - P99 target
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Storage metrics
    describe_counter!(
        format!("{}_storage_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Storage errors by SQLSTATE"
    );

    // Domain metrics
    describe_counter!(
        format!("{}_mutations_total", METRICS_PREFIX),
        Unit::Count,
        "Writes by entity and operation"
    );

    describe_histogram!(
        format!("{}_listing_rows", METRICS_PREFIX),
        Unit::Count,
        "Rows returned per listing page"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Count a storage error by its SQLSTATE
pub fn record_storage_error(sqlstate: &str) {
    counter!(
        format!("{}_storage_errors_total", METRICS_PREFIX),
        "sqlstate" => sqlstate.to_string()
    )
    .increment(1);
}

/// Count a successful write
pub fn record_mutation(entity: &'static str, operation: &'static str) {
    counter!(
        format!("{}_mutations_total", METRICS_PREFIX),
        "entity" => entity,
        "operation" => operation
    )
    .increment(1);
}

/// Record how many rows a listing page returned
pub fn record_listing(entity: &'static str, rows: usize) {
    histogram!(
        format!("{}_listing_rows", METRICS_PREFIX),
        "entity" => entity
    )
    .record(rows as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        // Verify buckets are sorted and contain SLO targets
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        assert!(LATENCY_BUCKETS.contains(&0.050));
        assert!(LATENCY_BUCKETS.contains(&0.150));
    }

    #[test]
    fn test_recorders_without_exporter() {
        let metrics = RequestMetrics::start("GET", "/api/articles");
        metrics.finish(200);
        record_storage_error("23505");
        record_mutation("article", "create");
        record_listing("article", 10);
    }
}
