// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Larkrelay webhook, dispatch, and reply crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a chat conversation on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

/// Identifier of a single message within a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Webhook delivery identifier. Not present on every delivery, and redeliveries
/// of one message can arrive under distinct event ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Platform identifier of a message author.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenderId(pub String);

/// Outcome of webhook admission control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AdmissionDecision {
    /// New, fresh, verified event. Dispatch it.
    Accept,
    /// Event id or message id already processed.
    Duplicate,
    /// Event older than the freshness window.
    Stale,
    /// Verification token or signature did not match.
    Unverified,
}

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior message in a conversation. Transcripts are ordered oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

/// A normalized inbound message event extracted from a webhook delivery.
///
/// Optional fields reflect the wire format: deliveries may omit the event id,
/// the message id, or the creation timestamp, and admission control degrades
/// gracefully for each.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub event_id: Option<EventId>,
    pub conversation_id: ConversationId,
    pub message_id: Option<MessageId>,
    pub sender_id: SenderId,
    /// Platform message type (`text`, `image`, `file`, `audio`, ...).
    pub message_type: String,
    /// Raw serialized content payload as delivered by the platform.
    pub content: String,
    /// Creation time in epoch milliseconds, when the delivery carried one.
    pub created_at_ms: Option<i64>,
}

/// Input to one reply backend invocation.
#[derive(Debug, Clone)]
pub struct ReplyRequest {
    /// The user's message text.
    pub message: String,
    pub sender_id: Option<String>,
    pub conversation_id: Option<String>,
    /// Prior turns, oldest first, excluding the message itself.
    pub history: Vec<ConversationTurn>,
}
