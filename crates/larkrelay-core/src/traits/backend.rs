// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply backend trait for interchangeable AI reply services.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::RelayError;
use crate::types::ReplyRequest;

/// A service that produces a reply to an inbound chat message.
///
/// The router holds backends in priority order and tries each in turn. An
/// implementation returns `Err` for transport failures, bad statuses, and
/// unusable response bodies so the router can fall through to the next
/// backend in the cascade.
#[async_trait]
pub trait ReplyBackend: Send + Sync {
    /// Short name used in logs, metrics labels, and the stats report.
    fn name(&self) -> &str;

    /// Upper bound the router applies to a single invocation.
    fn timeout(&self) -> Duration;

    /// Produces a reply for the request.
    async fn invoke(&self, request: &ReplyRequest) -> Result<String, RelayError>;
}
