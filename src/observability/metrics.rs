//! Metrics collection and exposition.
//!
//! # Metrics
//! - `settings_reads_total` (counter): effective-config reads
//! - `settings_writes_total` (counter): writes by `outcome`
//! - `settings_keys_applied_total` (counter): keys written to the live environment
//! - `settings_restart_pending` (gauge): 1 when the last write needs a restart
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_settings_read() {
    metrics::counter!("settings_reads_total").increment(1);
}

pub fn record_settings_write(outcome: &'static str) {
    metrics::counter!("settings_writes_total", "outcome" => outcome).increment(1);
}

pub fn record_keys_applied(count: usize) {
    metrics::counter!("settings_keys_applied_total").increment(count as u64);
}

pub fn record_restart_pending(pending: bool) {
    metrics::gauge!("settings_restart_pending").set(if pending { 1.0 } else { 0.0 });
}
