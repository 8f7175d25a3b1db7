//! Metrics module
//!
//! Prometheus counters and histograms for upload attempts.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};
use thiserror::Error;

lazy_static! {
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "http_uploadr_uploads_total",
        "Total number of upload attempts by outcome",
        &["status"]  // "succeeded", "failed", "cancelled" or "skipped"
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "http_uploadr_upload_bytes_total",
        "Total multipart body bytes accepted by servers"
    ).unwrap();

    pub static ref UPLOAD_DURATION: Histogram = register_histogram!(
        "http_uploadr_upload_duration_seconds",
        "Upload duration in seconds",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 60.0]
    ).unwrap();

    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "http_uploadr_errors_total",
        "Total errors",
        &["type"]
    ).unwrap();
}

/// Metrics errors
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),

    #[error("Metrics are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Record a successful upload
pub fn record_upload_success(bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&["succeeded"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
}

/// Record a failed upload
pub fn record_upload_failure() {
    UPLOADS_TOTAL.with_label_values(&["failed"]).inc();
}

/// Record an upload stopped by cancellation
pub fn record_upload_cancelled() {
    UPLOADS_TOTAL.with_label_values(&["cancelled"]).inc();
}

/// Record a directory that was not uploaded
pub fn record_upload_skipped() {
    UPLOADS_TOTAL.with_label_values(&["skipped"]).inc();
}

/// Record upload duration
pub fn record_upload_duration(duration_secs: f64) {
    UPLOAD_DURATION.observe(duration_secs);
}

/// Record an error
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

/// Render the default registry in the Prometheus text format
pub fn encode_text() -> Result<String, MetricsError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
