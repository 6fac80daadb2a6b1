//! Prometheus metrics for the fraud check service

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static! {
    /// Total fraud checks by action type and decision
    pub static ref FRAUD_CHECK_TOTAL: CounterVec = register_counter_vec!(
        "trustgate_checks_total",
        "Total fraud checks",
        &["action_type", "action"]
    )
    .unwrap();

    /// Fraud check duration
    pub static ref FRAUD_CHECK_DURATION: HistogramVec = register_histogram_vec!(
        "trustgate_check_duration_seconds",
        "Fraud check duration in seconds",
        &["action_type"]
    )
    .unwrap();

    /// Requests rejected before any analyzer ran
    pub static ref CHECK_REJECTED_TOTAL: CounterVec = register_counter_vec!(
        "trustgate_checks_rejected_total",
        "Requests rejected at validation",
        &["reason"]
    )
    .unwrap();

    /// Audit write outcomes (written, duplicate, dropped, failed)
    pub static ref AUDIT_WRITE_TOTAL: CounterVec = register_counter_vec!(
        "trustgate_audit_writes_total",
        "Audit write outcomes",
        &["status"]
    )
    .unwrap();
}
