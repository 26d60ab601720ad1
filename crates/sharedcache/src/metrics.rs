//! Prometheus metrics for the shared cache.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed with [`init_metrics`].

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names as constants for consistency.
pub mod names {
    pub const CACHE_HITS_TOTAL: &str = "sharedcache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "sharedcache_misses_total";
    pub const CACHE_PROMOTIONS_TOTAL: &str = "sharedcache_promotions_total";
    pub const CACHE_EVICTIONS_TOTAL: &str = "sharedcache_evictions_total";
    pub const CACHE_LOCAL_ENTRIES: &str = "sharedcache_local_entries";
    pub const REMOTE_ERRORS_TOTAL: &str = "sharedcache_remote_errors_total";
    pub const LOADER_INVOCATIONS_TOTAL: &str = "sharedcache_loader_invocations_total";
    pub const LOADER_FAILURES_TOTAL: &str = "sharedcache_loader_failures_total";
    pub const IN_FLIGHT_JOINS_TOTAL: &str = "sharedcache_in_flight_joins_total";
}

/// Initialize the Prometheus metrics exporter.
///
/// Returns `true` if initialization succeeded, `false` if already initialized
/// or another recorder is installed.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        tracing::debug!("Prometheus metrics already initialized");
        return false;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROMETHEUS_HANDLE.set(handle).is_err() {
                tracing::warn!("Failed to store Prometheus handle (already set)");
                return false;
            }

            tracing::info!("Prometheus metrics initialized");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus recorder");
            false
        }
    }
}

/// Render all metrics in Prometheus text format.
///
/// Returns `None` if metrics were not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|handle| handle.render())
}

/// Record a cache hit on `tier` ("L1" or "L2").
pub fn record_cache_hit(tier: &'static str) {
    counter!(names::CACHE_HITS_TOTAL, "tier" => tier).increment(1);
}

/// Record a full miss (neither tier had the key).
pub fn record_cache_miss() {
    counter!(names::CACHE_MISSES_TOTAL).increment(1);
}

pub fn record_promotion() {
    counter!(names::CACHE_PROMOTIONS_TOTAL).increment(1);
}

/// Record entries removed from the local tier, by reason ("expired" or "capacity").
pub fn record_evictions(reason: &'static str, count: usize) {
    if count > 0 {
        counter!(names::CACHE_EVICTIONS_TOTAL, "reason" => reason).increment(count as u64);
    }
}

pub fn set_local_entries(count: usize) {
    gauge!(names::CACHE_LOCAL_ENTRIES).set(count as f64);
}

/// Record an absorbed remote failure.
pub fn record_remote_error(op: &'static str, kind: &'static str) {
    counter!(names::REMOTE_ERRORS_TOTAL, "op" => op, "kind" => kind).increment(1);
}

pub fn record_loader_invocation() {
    counter!(names::LOADER_INVOCATIONS_TOTAL).increment(1);
}

pub fn record_loader_failure() {
    counter!(names::LOADER_FAILURES_TOTAL).increment(1);
}

/// Record a `get_or_set` call that attached to a computation already in flight.
pub fn record_in_flight_join() {
    counter!(names::IN_FLIGHT_JOINS_TOTAL).increment(1);
}
