//! Prometheus metrics for the invoicing engine.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Engine operation counter by operation and outcome.
pub static ENGINE_OPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "engine_ops_total",
        "Total number of engine operations",
        &["operation", "status"]
    )
    .expect("Failed to register engine_ops_total")
});

/// Engine operation duration histogram.
pub static OP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "engine_op_duration_seconds",
        "Engine operation duration in seconds",
        &["operation"],
        vec![0.000001, 0.00001, 0.0001, 0.001, 0.005, 0.01, 0.05, 0.1]
    )
    .expect("Failed to register engine_op_duration")
});

/// Invoice counter by status.
pub static INVOICES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "engine_invoices_total",
        "Total number of invoices by status",
        &["status"] // draft, sent, paid, cancelled
    )
    .expect("Failed to register engine_invoices_total")
});

/// Payment counter by method.
pub static PAYMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "engine_payments_total",
        "Total number of payments by method",
        &["method"]
    )
    .expect("Failed to register engine_payments_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "engine_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register engine_errors_total")
});

/// Invoiced amount counter by currency.
pub static INVOICE_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "engine_invoice_amount_total",
        "Total invoiced amount by currency",
        &["currency"]
    )
    .expect("Failed to register engine_invoice_amount_total")
});

/// Payment amount counter by currency.
pub static PAYMENT_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "engine_payment_amount_total",
        "Total payment amount by currency",
        &["currency"]
    )
    .expect("Failed to register engine_payment_amount_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&ENGINE_OPS_TOTAL);
    Lazy::force(&OP_DURATION);
    Lazy::force(&INVOICES_TOTAL);
    Lazy::force(&PAYMENTS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&INVOICE_AMOUNT_TOTAL);
    Lazy::force(&PAYMENT_AMOUNT_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
