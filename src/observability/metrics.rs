//! Metrics collection and exposition.
//!
//! # Metrics
//! - `traefik_fed_cycles_total` (counter): completed aggregation cycles
//! - `traefik_fed_cycle_duration_seconds` (histogram): cycle latency
//! - `traefik_fed_upstream_fetch_total` (counter): fetches by upstream, result
//! - `traefik_fed_published_routers` / `traefik_fed_published_services` (gauges)
//! - `traefik_fed_file_writes_total` (counter): file sink writes by result
//! - `traefik_fed_queries_total` (counter): query interface hits by format
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_cycle(start: Instant, routers: usize, services: usize) {
    counter!("traefik_fed_cycles_total").increment(1);
    histogram!("traefik_fed_cycle_duration_seconds").record(start.elapsed().as_secs_f64());
    gauge!("traefik_fed_published_routers").set(routers as f64);
    gauge!("traefik_fed_published_services").set(services as f64);
}

pub fn record_upstream_fetch(upstream: &str, result: &'static str) {
    counter!(
        "traefik_fed_upstream_fetch_total",
        "upstream" => upstream.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_file_write(success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!("traefik_fed_file_writes_total", "result" => result).increment(1);
}

pub fn record_query(format: &'static str) {
    counter!("traefik_fed_queries_total", "format" => format).increment(1);
}
