// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document search strategy trait for retrieval augmentation.

use async_trait::async_trait;

use crate::error::RelayError;

/// A strategy for retrieving document context for a knowledge-seeking query.
///
/// Strategies differ in which credential they need: drive search needs a user
/// OAuth token, tenant search needs app credentials, and the offline strategy
/// needs nothing. The registry selects the highest-priority strategy whose
/// prerequisites hold.
#[async_trait]
pub trait DocSearch: Send + Sync {
    /// Stable name used for config overrides, the admin endpoint, and logs.
    fn name(&self) -> &str;

    /// Selection priority. Lower values are preferred.
    fn priority(&self) -> u8;

    /// Whether the strategy's prerequisites currently hold.
    async fn ready(&self) -> bool;

    /// Runs the search and returns a formatted context block.
    async fn search(&self, query: &str, count: u32) -> Result<String, RelayError>;
}
