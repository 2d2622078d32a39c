//! Prometheus metrics for invoicing-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Completed invoice operations by kind (create, edit, delete).
pub static INVOICE_OPERATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoicing_invoice_operations_total",
        "Total number of committed invoice operations",
        &["operation"]
    )
    .expect("Failed to register invoice_operations_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoicing_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "invoicing_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&INVOICE_OPERATIONS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
