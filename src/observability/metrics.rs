//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by method, status
//! - `dispatch_request_duration_seconds` (histogram): latency by method
//! - `dispatch_unmatched_total` (counter): paths no resource matched
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; nothing is kept until a
//!   recorder is installed
//! - Histogram buckets tuned for in-process handlers (sub-millisecond up)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

const REQUESTS_TOTAL: &str = "dispatch_requests_total";
const REQUEST_DURATION: &str = "dispatch_request_duration_seconds";
const UNMATCHED_TOTAL: &str = "dispatch_unmatched_total";

const DURATION_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0,
];

/// Install the Prometheus recorder with an HTTP scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), DURATION_BUCKETS)?
        .install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(REQUESTS_TOTAL, "method" => method.to_string(), "status" => status.to_string())
        .increment(1);
    histogram!(REQUEST_DURATION, "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_unmatched() {
    counter!(UNMATCHED_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recorded() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            record_request("GET", 200, Instant::now());
            record_request("GET", 200, Instant::now());
            record_unmatched();
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"dispatch_requests_total{method="GET",status="200"} 2"#));
        assert!(rendered.contains("dispatch_unmatched_total 1"));
        assert!(rendered.contains("dispatch_request_duration_seconds"));
    }
}
