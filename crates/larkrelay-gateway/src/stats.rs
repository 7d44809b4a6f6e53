// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-lifetime counters behind the stats endpoint.
//!
//! Mirrors the Prometheus counters so the numbers stay available as plain
//! JSON even when no metrics recorder is installed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

use larkrelay_core::AdmissionDecision;

/// Atomic processing counters shared across the gateway.
#[derive(Debug)]
pub struct RelayStats {
    started_at: Instant,
    events_received: AtomicU64,
    events_accepted: AtomicU64,
    events_duplicate: AtomicU64,
    events_stale: AtomicU64,
    events_unverified: AtomicU64,
    events_dropped: AtomicU64,
    replies_sent: AtomicU64,
    replies_failed: AtomicU64,
}

/// Point-in-time copy of the counters, as reported by the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub events_received: u64,
    pub events_accepted: u64,
    pub events_duplicate: u64,
    pub events_stale: u64,
    pub events_unverified: u64,
    pub events_dropped: u64,
    pub replies_sent: u64,
    pub replies_failed: u64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            events_received: AtomicU64::new(0),
            events_accepted: AtomicU64::new(0),
            events_duplicate: AtomicU64::new(0),
            events_stale: AtomicU64::new(0),
            events_unverified: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            replies_sent: AtomicU64::new(0),
            replies_failed: AtomicU64::new(0),
        }
    }

    /// Record one received webhook delivery.
    pub fn record_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
        larkrelay_prometheus::record_event_received();
    }

    /// Record an admission decision.
    pub fn record_admission(&self, decision: AdmissionDecision) {
        let counter = match decision {
            AdmissionDecision::Accept => &self.events_accepted,
            AdmissionDecision::Duplicate => &self.events_duplicate,
            AdmissionDecision::Stale => &self.events_stale,
            AdmissionDecision::Unverified => &self.events_unverified,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        larkrelay_prometheus::record_admission(&decision.to_string());
    }

    /// Record an accepted event dropped because the dispatcher was full.
    pub fn record_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
        larkrelay_prometheus::record_event_dropped();
    }

    /// Record the outcome of one reply send.
    pub fn record_reply(&self, sent: bool) {
        if sent {
            self.replies_sent.fetch_add(1, Ordering::Relaxed);
            larkrelay_prometheus::record_reply("sent");
        } else {
            self.replies_failed.fetch_add(1, Ordering::Relaxed);
            larkrelay_prometheus::record_reply("failed");
        }
    }

    /// Seconds since the stats were created at process start.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_accepted: self.events_accepted.load(Ordering::Relaxed),
            events_duplicate: self.events_duplicate.load(Ordering::Relaxed),
            events_stale: self.events_stale.load(Ordering::Relaxed),
            events_unverified: self.events_unverified.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            replies_failed: self.replies_failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}
