// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook gateway for the Larkrelay bridge.
//!
//! Receives platform event deliveries, answers the synchronous webhook
//! contract (challenge echo, admission acknowledgments), and hands admitted
//! text messages to a bounded background reply pipeline. The same server
//! carries the operator surface: health, stats, Prometheus metrics, the OAuth
//! handshake endpoints, and search strategy administration.

pub mod admission;
pub mod dispatch;
pub mod event;
pub mod handlers;
pub mod ledger;
pub mod server;
pub mod shutdown;
pub mod stats;

pub use admission::{AdmissionFilter, Verifier};
pub use dispatch::Dispatcher;
pub use ledger::DedupeLedger;
pub use server::{build_router, start_server, GatewayState, ServerConfig};
pub use shutdown::install_signal_handler;
pub use stats::RelayStats;
