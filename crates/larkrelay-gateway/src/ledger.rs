// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded deduplication ledger for webhook event and message ids.
//!
//! The platform redelivers events whenever it does not receive a timely
//! acknowledgment, so every delivery id is remembered here and checked
//! before dispatch. Capacity is fixed: once full, the oldest remembered
//! id is evicted to make room, keeping memory bounded under any delivery
//! volume.

use std::collections::{HashSet, VecDeque};

/// Remembers recently seen ids, evicting the oldest first when full.
#[derive(Debug)]
pub struct DedupeLedger {
    capacity: usize,
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl DedupeLedger {
    /// Create a ledger remembering at most `capacity` ids.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            seen: HashSet::with_capacity(capacity.max(1)),
            order: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Record `id` as seen. Returns `true` if it was new, `false` if the
    /// ledger already held it.
    pub fn check_and_insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }

        self.seen.insert(id.to_string());
        self.order.push_back(id.to_string());

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }

        true
    }

    /// Whether `id` is currently remembered.
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Number of ids currently remembered.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether the ledger holds no ids.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
