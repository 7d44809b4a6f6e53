// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal no-op strategy. Always ready, never fails.

use async_trait::async_trait;

use larkrelay_core::{DocSearch, RelayError};

pub struct OfflineSearch;

#[async_trait]
impl DocSearch for OfflineSearch {
    fn name(&self) -> &str {
        "offline"
    }

    fn priority(&self) -> u8 {
        3
    }

    async fn ready(&self) -> bool {
        true
    }

    async fn search(&self, query: &str, _count: u32) -> Result<String, RelayError> {
        Ok(format!(
            "Document search is currently unavailable; no sources were consulted for '{query}'."
        ))
    }
}
