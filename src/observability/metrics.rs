//! # Metrics
//!
//! Prometheus metrics for monitoring reconciliation runs.
//!
//! ## Metrics Exposed
//!
//! - `isc_reconciliations_total` - Total number of reconciliation runs
//! - `isc_reconciliation_errors_total` - Runs aborted by a fatal error
//! - `isc_reconciliation_duration_seconds` - Duration of reconciliation runs
//! - `isc_secrets_created_total` - Secrets created
//! - `isc_secrets_deleted_total` - Stale secrets deleted
//! - `isc_tokens_created_total` - InfluxDB tokens created
//! - `isc_tokens_reused_total` - Existing InfluxDB tokens reused
//! - `isc_entry_failures_total` - Per-entry failures, labeled by error kind
//! - `isc_entries_skipped_total` - Entries left without a Secret because the
//!   reused token's value was not disclosed
//! - `isc_directory_operations_total` - InfluxDB API calls, labeled by operation
//! - `isc_directory_operation_duration_seconds` - Duration of InfluxDB API calls
//! - `isc_directory_operation_errors_total` - Failed InfluxDB API calls
//!
//! Runs are one-shot, so instead of serving `/metrics` the registry can be
//! written in text format for the node-exporter textfile collector.

use anyhow::{Context, Result};
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::path::Path;
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("isc_reconciliations_total", "Total number of reconciliation runs")
        .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "isc_reconciliation_errors_total",
        "Total number of reconciliation runs aborted by a fatal error",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "isc_reconciliation_duration_seconds",
            "Duration of reconciliation runs in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static SECRETS_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("isc_secrets_created_total", "Total number of secrets created")
        .expect("Failed to create SECRETS_CREATED_TOTAL metric - this should never happen")
});

static SECRETS_DELETED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("isc_secrets_deleted_total", "Total number of stale secrets deleted")
        .expect("Failed to create SECRETS_DELETED_TOTAL metric - this should never happen")
});

static TOKENS_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("isc_tokens_created_total", "Total number of InfluxDB tokens created")
        .expect("Failed to create TOKENS_CREATED_TOTAL metric - this should never happen")
});

static TOKENS_REUSED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "isc_tokens_reused_total",
        "Total number of existing InfluxDB tokens reused",
    )
    .expect("Failed to create TOKENS_REUSED_TOTAL metric - this should never happen")
});

static ENTRY_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("isc_entry_failures_total", "Total number of per-entry failures"),
        &["kind"],
    )
    .expect("Failed to create ENTRY_FAILURES_TOTAL metric - this should never happen")
});

static ENTRIES_SKIPPED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "isc_entries_skipped_total",
        "Total number of entries skipped because a reused token's value was not disclosed",
    )
    .expect("Failed to create ENTRIES_SKIPPED_TOTAL metric - this should never happen")
});

static DIRECTORY_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "isc_directory_operations_total",
            "Total number of InfluxDB API operations",
        ),
        &["operation"],
    )
    .expect("Failed to create DIRECTORY_OPERATIONS_TOTAL metric - this should never happen")
});

static DIRECTORY_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "isc_directory_operation_duration_seconds",
            "Duration of InfluxDB API operations in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["operation"],
    )
    .expect("Failed to create DIRECTORY_OPERATION_DURATION metric - this should never happen")
});

static DIRECTORY_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "isc_directory_operation_errors_total",
            "Total number of failed InfluxDB API operations",
        ),
        &["operation"],
    )
    .expect("Failed to create DIRECTORY_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
/// Register all metrics with the registry. Fails if called twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(SECRETS_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_DELETED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TOKENS_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TOKENS_REUSED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ENTRY_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ENTRIES_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DIRECTORY_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DIRECTORY_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(DIRECTORY_OPERATION_ERRORS_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_secrets_created() {
    SECRETS_CREATED_TOTAL.inc();
}

pub fn increment_secrets_deleted() {
    SECRETS_DELETED_TOTAL.inc();
}

pub fn increment_tokens_created() {
    TOKENS_CREATED_TOTAL.inc();
}

pub fn increment_tokens_reused() {
    TOKENS_REUSED_TOTAL.inc();
}

pub fn increment_entry_failures(kind: &str) {
    ENTRY_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_entries_skipped() {
    ENTRIES_SKIPPED_TOTAL.inc();
}

pub fn record_directory_operation(operation: &str, duration: f64) {
    DIRECTORY_OPERATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
    DIRECTORY_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_directory_operation_errors(operation: &str) {
    DIRECTORY_OPERATION_ERRORS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

/// Render every registered metric in the Prometheus text format
pub fn render() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics output is not valid UTF-8")
}

/// Write the text format to `path` for the node-exporter textfile collector
///
/// Written to a sibling temp file first so the collector never reads a
/// partial file.
pub fn write_textfile(path: &Path) -> Result<()> {
    let rendered = render()?;
    let tmp_path = path.with_extension("prom.tmp");
    std::fs::write(&tmp_path, rendered)
        .with_context(|| format!("Failed to write metrics to {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move metrics into {}", path.display()))?;
    Ok(())
}
