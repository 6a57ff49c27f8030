use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: HTTP queries served. Labels: mode.
pub const QUERIES_TOTAL: &str = "roombook_queries_total";

/// Counter: engine mutations. Labels: op, outcome.
pub const BOOKING_REQUESTS_TOTAL: &str = "roombook_booking_requests_total";

/// Histogram: engine mutation latency in seconds. Labels: op.
pub const BOOKING_DURATION_SECONDS: &str = "roombook_booking_duration_seconds";

// ── Data quality and access ─────────────────────────────────────

/// Counter: requests carrying the wrong shared secret.
pub const AUTH_FAILURES_TOTAL: &str = "roombook_auth_failures_total";

/// Counter: stored rows that could not be fully interpreted.
pub const INTEGRITY_WARNINGS_TOTAL: &str = "roombook_integrity_warnings_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
