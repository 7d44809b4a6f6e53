// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Larkrelay metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "larkrelay_events_received_total",
        "Total webhook deliveries received"
    );
    describe_counter!(
        "larkrelay_admission_total",
        "Admission decisions by outcome"
    );
    describe_counter!(
        "larkrelay_events_dropped_total",
        "Accepted events dropped because the dispatcher was saturated"
    );
    describe_counter!("larkrelay_replies_total", "Replies sent by outcome");
    describe_counter!(
        "larkrelay_backend_invocations_total",
        "Reply backend invocations by backend"
    );
    describe_counter!(
        "larkrelay_backend_failures_total",
        "Reply backend failures by backend"
    );
    describe_counter!(
        "larkrelay_doc_searches_total",
        "Document searches by strategy"
    );
    describe_gauge!(
        "larkrelay_dispatch_in_flight",
        "Reply pipelines currently running"
    );
    describe_histogram!(
        "larkrelay_dispatch_latency_seconds",
        "End-to-end reply pipeline latency in seconds"
    );
}

/// Record one received webhook delivery.
pub fn record_event_received() {
    metrics::counter!("larkrelay_events_received_total").increment(1);
}

/// Record an admission decision.
pub fn record_admission(decision: &str) {
    metrics::counter!("larkrelay_admission_total", "decision" => decision.to_string()).increment(1);
}

/// Record an accepted event dropped at dispatch.
pub fn record_event_dropped() {
    metrics::counter!("larkrelay_events_dropped_total").increment(1);
}

/// Record a reply send attempt outcome (`sent` or `failed`).
pub fn record_reply(outcome: &str) {
    metrics::counter!("larkrelay_replies_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record one reply backend invocation.
pub fn record_backend_invocation(backend: &str) {
    metrics::counter!("larkrelay_backend_invocations_total", "backend" => backend.to_string())
        .increment(1);
}

/// Record one reply backend failure.
pub fn record_backend_failure(backend: &str) {
    metrics::counter!("larkrelay_backend_failures_total", "backend" => backend.to_string())
        .increment(1);
}

/// Record one document search.
pub fn record_doc_search(strategy: &str) {
    metrics::counter!("larkrelay_doc_searches_total", "strategy" => strategy.to_string())
        .increment(1);
}

/// Set the number of reply pipelines currently running.
pub fn set_dispatch_in_flight(count: f64) {
    metrics::gauge!("larkrelay_dispatch_in_flight").set(count);
}

/// Record end-to-end pipeline latency.
pub fn record_dispatch_latency(seconds: f64) {
    metrics::histogram!("larkrelay_dispatch_latency_seconds").record(seconds);
}
