// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the object storage operator.
//!
//! All metric names carry the `object_storage_operator_` prefix.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - outcome and duration of every reconciliation
//! - **Provider Metrics** - calls made to the cloud adapters
//! - **Bucket Deletion** - teardowns performed on provider buckets
//! - **Leader Election Metrics** - leadership state changes
//!
//! # Example
//!
//! ```rust,no_run
//! use object_storage_operator::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success(std::time::Duration::from_secs(1));
//! ```

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all operator metrics
const METRICS_NAMESPACE: &str = "object_storage_operator";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry, exposed on `/metrics`.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

fn register<C>(collector: C) -> C
where
    C: prometheus::core::Collector + Clone + 'static,
{
    METRICS_REGISTRY
        .register(Box::new(collector.clone()))
        .expect("metric registered twice");
    collector
}

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of bucket reconciliations by status",
    );
    register(CounterVec::new(opts, &["status"]).expect("valid reconciliations_total metric"))
});

/// Duration of reconciliations in seconds
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of bucket reconciliations in seconds",
    )
    .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]);
    register(
        HistogramVec::new(opts, &["status"]).expect("valid reconciliation_duration metric"),
    )
});

/// Total number of failed reconciliations by error category
///
/// Labels:
/// - `error_type`: Category of error (e.g. `provider_error`, `resolution_error`)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of reconciliation errors by type",
    );
    register(CounterVec::new(opts, &["error_type"]).expect("valid errors_total metric"))
});

// ============================================================================
// Provider Metrics
// ============================================================================

/// Total number of cloud adapter calls
///
/// Labels:
/// - `provider`: `aws` or `azure`
/// - `operation`: Adapter operation (e.g. `create_bucket`, `configure_role`)
/// - `status`: Outcome (`success`, `error`)
pub static PROVIDER_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_provider_operations_total"),
        "Total number of cloud provider operations by provider, operation and status",
    );
    register(
        CounterVec::new(opts, &["provider", "operation", "status"])
            .expect("valid provider_operations_total metric"),
    )
});

/// Duration of cloud adapter calls in seconds
///
/// Labels:
/// - `provider`: `aws` or `azure`
/// - `operation`: Adapter operation
pub static PROVIDER_OPERATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_provider_operation_duration_seconds"),
        "Duration of cloud provider operations in seconds",
    )
    .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 120.0, 600.0]);
    register(
        HistogramVec::new(opts, &["provider", "operation"])
            .expect("valid provider_operation_duration metric"),
    )
});

// ============================================================================
// Bucket Deletion
// ============================================================================

/// Set to 1 for every bucket whose provider-side teardown ran
///
/// Labels:
/// - `bucket_name`: Provider bucket name
pub static BUCKET_RECONCILE_DELETE: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_bucket_reconcile_delete_total"),
        "Buckets deleted on the provider by the operator",
    );
    register(GaugeVec::new(opts, &["bucket_name"]).expect("valid bucket delete metric"))
});

// ============================================================================
// Leader Election Metrics
// ============================================================================

/// Total number of leader election transitions
///
/// Labels:
/// - `status`: `acquired` or `lost`
pub static LEADER_ELECTIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_leader_elections_total"),
        "Total number of leader election transitions by status",
    );
    register(CounterVec::new(opts, &["status"]).expect("valid leader_elections metric"))
});

/// Whether this replica currently holds the lease (1) or not (0)
///
/// Labels:
/// - `pod_name`: Name of the replica
pub static LEADER_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_leader_status"),
        "Current leader election status of this replica",
    );
    register(GaugeVec::new(opts, &["pod_name"]).expect("valid leader_status metric"))
});

// ============================================================================
// Recording helpers
// ============================================================================

fn status_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

/// Record a successful reconciliation.
pub fn record_reconciliation_success(duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["success"]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&["success"])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation and its error category.
pub fn record_reconciliation_error(error_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["error"]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&["error"])
        .observe(duration.as_secs_f64());
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

/// Record one call to a cloud adapter.
pub fn record_provider_operation(provider: &str, operation: &str, success: bool, duration: Duration) {
    PROVIDER_OPERATIONS_TOTAL
        .with_label_values(&[provider, operation, status_label(success)])
        .inc();
    PROVIDER_OPERATION_DURATION_SECONDS
        .with_label_values(&[provider, operation])
        .observe(duration.as_secs_f64());
}

/// Record that the provider bucket `bucket_name` was torn down.
pub fn record_bucket_delete(bucket_name: &str) {
    BUCKET_RECONCILE_DELETE
        .with_label_values(&[bucket_name])
        .set(1.0);
}

/// Record that this replica acquired the lease.
pub fn record_leader_elected(pod_name: &str) {
    LEADER_ELECTIONS_TOTAL.with_label_values(&["acquired"]).inc();
    LEADER_STATUS.with_label_values(&[pod_name]).set(1.0);
}

/// Record that this replica lost the lease.
pub fn record_leader_lost(pod_name: &str) {
    LEADER_ELECTIONS_TOTAL.with_label_values(&["lost"]).inc();
    LEADER_STATUS.with_label_values(&[pod_name]).set(0.0);
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
