// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Larkrelay bridge.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Larkrelay workspace. The webhook gateway,
//! the credential manager, and every reply backend build on what is defined
//! here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RelayError;
pub use types::{
    AdmissionDecision, ConversationId, ConversationTurn, EventId, InboundEvent, MessageId,
    ReplyRequest, Role, SenderId,
};

// Re-export the pipeline traits at crate root.
pub use traits::{DocSearch, ReplyBackend};
