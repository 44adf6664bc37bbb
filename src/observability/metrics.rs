//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cidrd_queries_total` (counter): queries answered, by `result` (found / not_found)
//! - `cidrd_reloads_total` (counter): load attempts, by `outcome` (success / failure)
//! - `cidrd_connections_total` (counter): accepted connections
//! - `cidrd_active_connections` (gauge): open connections
//! - `cidrd_index_prefixes` (gauge): effective prefixes in the published index, by `family`
//!
//! Recording is a no-op until a recorder is installed, so the core never
//! depends on the exporter being enabled.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::index::PrefixIndex;

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_query(found: bool) {
    let result = if found { "found" } else { "not_found" };
    counter!("cidrd_queries_total", "result" => result).increment(1);
}

pub fn record_reload(outcome: &'static str) {
    counter!("cidrd_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_index_size(index: &PrefixIndex) {
    gauge!("cidrd_index_prefixes", "family" => "v4").set(index.v4_len() as f64);
    gauge!("cidrd_index_prefixes", "family" => "v6").set(index.v6_len() as f64);
}

pub fn record_connection_opened() {
    counter!("cidrd_connections_total").increment(1);
    gauge!("cidrd_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    gauge!("cidrd_active_connections").decrement(1.0);
}
