//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all AskGate metrics
pub const METRICS_PREFIX: &str = "askgate";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_ask_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of /ask requests"
    );

    describe_histogram!(
        format!("{}_ask_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end /ask latency in seconds"
    );

    describe_counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total generation API attempts"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Generation call latency in seconds"
    );

    describe_counter!(
        format!("{}_attachment_rejected_total", METRICS_PREFIX),
        Unit::Count,
        "Attachments rejected before extraction"
    );

    tracing::info!("Metrics registered");
}

/// Record a completed /ask request
pub fn record_ask(duration_secs: f64, backend: &str, status: u16) {
    counter!(
        format!("{}_ask_requests_total", METRICS_PREFIX),
        "backend" => backend.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_ask_duration_seconds", METRICS_PREFIX),
        "backend" => backend.to_string()
    )
    .record(duration_secs);
}

/// Record a single generation API attempt
pub fn record_generation(duration_secs: f64, model: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        "model" => model.to_string()
    )
    .record(duration_secs);
}

/// Record an attachment rejection
pub fn record_attachment_rejected(reason: &str) {
    counter!(
        format!("{}_attachment_rejected_total", METRICS_PREFIX),
        "reason" => reason.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_helpers_do_not_panic() {
        record_ask(0.2, "gemini", 200);
        record_generation(1.5, "gemini-2.0-flash", true);
        record_attachment_rejected("too_large");
    }
}
