// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics recorder for the Larkrelay bridge.
//!
//! Uses the metrics-rs facade with the Prometheus exporter.
//! Metrics are rendered as Prometheus text format via the `render()` method,
//! which is exposed through the gateway's /metrics endpoint.

pub mod recording;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use larkrelay_core::RelayError;

pub use recording::{
    record_admission, record_backend_failure, record_backend_invocation, record_dispatch_latency,
    record_doc_search, record_event_dropped, record_event_received, record_reply,
    set_dispatch_in_flight,
};

/// Prometheus metrics recorder.
///
/// Installs the Prometheus recorder and exposes a handle for rendering
/// metrics in Prometheus text format.
pub struct PrometheusRecorder {
    handle: PrometheusHandle,
}

impl PrometheusRecorder {
    /// Create a new PrometheusRecorder.
    ///
    /// Installs the Prometheus recorder globally. Only one recorder can be
    /// installed per process. Returns an error if a recorder is already installed.
    pub fn new() -> Result<Self, RelayError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            RelayError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Get a reference to the Prometheus handle for rendering.
    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_helpers_are_nops_without_a_recorder() {
        // We can't call new() in tests because the recorder can only be
        // installed once per process. The facade no-ops without one, so the
        // helpers must not panic.
        record_event_received();
        record_admission("accept");
        record_event_dropped();
        record_reply("sent");
        record_backend_invocation("primary");
        record_backend_failure("primary");
        record_doc_search("offline");
        record_dispatch_latency(0.25);
        set_dispatch_in_flight(3.0);
    }
}
