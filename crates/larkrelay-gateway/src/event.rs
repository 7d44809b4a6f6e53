// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook payload classification and field extraction.
//!
//! Deliveries arrive in two schema generations: the 1.0 layout keeps the
//! verification token at the body root, the 2.0 layout nests it together with
//! the event type and event id under `header`. Both are accepted here, and
//! message contents stay in their raw serialized form until a consumer asks
//! for a specific field.

use serde_json::Value;

use larkrelay_core::{ConversationId, EventId, InboundEvent, MessageId, SenderId};

/// One classified webhook delivery.
#[derive(Debug)]
pub enum WebhookPayload {
    /// URL verification handshake sent when the webhook address is first
    /// registered. Answered directly, before any verification.
    Challenge { challenge: String },
    /// A new-message event.
    Message {
        token: Option<String>,
        event: InboundEvent,
    },
    /// Any other event type the bridge does not handle.
    Other { token: Option<String> },
}

/// Classify a parsed delivery body.
pub fn parse_payload(value: &Value) -> WebhookPayload {
    if value.get("type").and_then(Value::as_str) == Some("url_verification")
        && let Some(challenge) = value.get("challenge").and_then(Value::as_str)
    {
        return WebhookPayload::Challenge {
            challenge: challenge.to_string(),
        };
    }

    let token = value
        .get("token")
        .and_then(Value::as_str)
        .or_else(|| value.pointer("/header/token").and_then(Value::as_str))
        .map(str::to_string);

    if value.pointer("/header/event_type").and_then(Value::as_str)
        == Some("im.message.receive_v1")
        && let Some(event) = message_event(value)
    {
        return WebhookPayload::Message { token, event };
    }

    WebhookPayload::Other { token }
}

fn message_event(value: &Value) -> Option<InboundEvent> {
    let message = value.pointer("/event/message")?;
    // Without a chat id there is nowhere to reply; treat as unhandled.
    let conversation_id = message.get("chat_id").and_then(Value::as_str)?;

    // Group chats carry open_id, direct chats user_id; fall back to the
    // conversation itself so the allow-list check always has something.
    let sender = value.pointer("/event/sender/sender_id");
    let sender_id = sender
        .and_then(|s| s.get("open_id").and_then(Value::as_str))
        .or_else(|| sender.and_then(|s| s.get("user_id").and_then(Value::as_str)))
        .unwrap_or(conversation_id);

    Some(InboundEvent {
        event_id: value
            .pointer("/header/event_id")
            .and_then(Value::as_str)
            .map(|id| EventId(id.to_string())),
        conversation_id: ConversationId(conversation_id.to_string()),
        message_id: message
            .get("message_id")
            .and_then(Value::as_str)
            .map(|id| MessageId(id.to_string())),
        sender_id: SenderId(sender_id.to_string()),
        message_type: message
            .get("message_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        content: message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("{}")
            .to_string(),
        created_at_ms: message.get("create_time").and_then(parse_epoch_ms),
    })
}

// The platform serializes create_time as a decimal string of epoch
// milliseconds; bare numbers are accepted too.
fn parse_epoch_ms(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

/// Text of a text message, if non-empty after trimming.
pub fn extract_text(event: &InboundEvent) -> Option<String> {
    let content: Value = serde_json::from_str(&event.content).ok()?;
    let text = content.get("text")?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// A named string field of the serialized content payload, such as the
/// `file_name` of a file message.
pub fn content_field(event: &InboundEvent, key: &str) -> Option<String> {
    let content: Value = serde_json::from_str(&event.content).ok()?;
    content.get(key)?.as_str().map(str::to_string)
}
