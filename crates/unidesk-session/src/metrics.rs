// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. With no recorder installed the calls are
//! no-ops, so library users pay nothing.

use metrics::{describe_counter, describe_histogram};

/// Register all Unidesk metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("unidesk_exchanges_total", "Chat exchanges persisted");
    describe_counter!(
        "unidesk_exchanges_degraded_total",
        "Exchanges that fell back to a default at one stage"
    );
    describe_counter!(
        "unidesk_submissions_ignored_total",
        "Query submissions ignored without side effects"
    );
    describe_histogram!(
        "unidesk_exchange_duration_seconds",
        "Time from accepted query to persisted conversation"
    );
}

/// Record a persisted exchange.
pub fn record_exchange(platform: &str, mode: &str) {
    metrics::counter!("unidesk_exchanges_total", "platform" => platform.to_string(), "mode" => mode.to_string())
        .increment(1);
}

/// Record a stage that degraded to its documented default.
pub fn record_degraded(stage: &'static str) {
    metrics::counter!("unidesk_exchanges_degraded_total", "stage" => stage).increment(1);
}

/// Record an ignored submission.
pub fn record_ignored(reason: &'static str) {
    metrics::counter!("unidesk_submissions_ignored_total", "reason" => reason).increment(1);
}

/// Record end-to-end exchange latency.
pub fn record_exchange_duration(seconds: f64) {
    metrics::histogram!("unidesk_exchange_duration_seconds").record(seconds);
}
