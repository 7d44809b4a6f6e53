// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook admission control.
//!
//! Every message event passes through [`AdmissionFilter::admit`] before a reply
//! pipeline is started: verification first, then event-id dedup, then a
//! freshness check, then message-id dedup. Only `Accept` leads to dispatch;
//! every other decision is acknowledged to the platform without side effects.
//!
//! Dedup runs at two levels because the platform redelivers one message both
//! under the same event id (timeout retries) and under fresh event ids
//! (backlog replays after a restart), and some deliveries omit the event id
//! entirely.

use std::sync::Mutex;
use std::sync::PoisonError;

use sha2::{Digest, Sha256};
use tracing::warn;

use larkrelay_core::{AdmissionDecision, InboundEvent};

use crate::ledger::DedupeLedger;

/// How inbound deliveries prove they came from the platform.
#[derive(Debug, Clone)]
pub enum Verifier {
    /// Plaintext verification token carried in the delivery body. An empty
    /// expected token disables verification.
    Token(String),
    /// Encrypt-key signature scheme: deliveries carry a SHA-256 signature
    /// over timestamp, nonce, key, and raw body in the request headers.
    Signature(String),
}

/// Admission filter holding the verifier and both dedup ledgers.
#[derive(Debug)]
pub struct AdmissionFilter {
    verifier: Verifier,
    event_ledger: Mutex<DedupeLedger>,
    message_ledger: Mutex<DedupeLedger>,
    freshness_window_secs: u64,
}

impl AdmissionFilter {
    pub fn new(verifier: Verifier, ledger_capacity: usize, freshness_window_secs: u64) -> Self {
        Self {
            verifier,
            event_ledger: Mutex::new(DedupeLedger::new(ledger_capacity)),
            message_ledger: Mutex::new(DedupeLedger::new(ledger_capacity)),
            freshness_window_secs,
        }
    }

    /// Decide whether `event` enters the reply pipeline.
    ///
    /// `supplied_token` is the verification token found in the delivery body,
    /// if any. `now_ms` is the admission clock in epoch milliseconds; message
    /// age is measured against it.
    pub fn admit(
        &self,
        event: &InboundEvent,
        supplied_token: Option<&str>,
        now_ms: i64,
    ) -> AdmissionDecision {
        if !self.token_accepted(supplied_token) {
            warn!(
                supplied = supplied_token.unwrap_or("<none>"),
                "verification token mismatch"
            );
            return AdmissionDecision::Unverified;
        }

        if let Some(event_id) = &event.event_id {
            let mut ledger = self
                .event_ledger
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !ledger.check_and_insert(&event_id.0) {
                warn!(event_id = %event_id.0, "duplicate event id, ignoring redelivery");
                return AdmissionDecision::Duplicate;
            }
        }

        if let Some(created_at_ms) = event.created_at_ms {
            let age_ms = now_ms.saturating_sub(created_at_ms);
            if age_ms > (self.freshness_window_secs as i64).saturating_mul(1000) {
                warn!(
                    age_secs = age_ms / 1000,
                    "message predates the freshness window, ignoring"
                );
                return AdmissionDecision::Stale;
            }
        }

        if let Some(message_id) = &event.message_id {
            let mut ledger = self
                .message_ledger
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !ledger.check_and_insert(&message_id.0) {
                warn!(message_id = %message_id.0, "duplicate message id, ignoring redelivery");
                return AdmissionDecision::Duplicate;
            }
        }

        AdmissionDecision::Accept
    }

    /// Token check for deliveries that carry no message event (event types
    /// the bridge does not handle still get verified before the ack).
    pub fn token_accepted(&self, supplied: Option<&str>) -> bool {
        match &self.verifier {
            Verifier::Token(expected) if expected.is_empty() => true,
            Verifier::Token(expected) => supplied == Some(expected.as_str()),
            // Signature deliveries were already checked against the raw body.
            Verifier::Signature(_) => true,
        }
    }

    /// Whether deliveries must carry signature headers.
    pub fn requires_signature(&self) -> bool {
        matches!(self.verifier, Verifier::Signature(_))
    }

    /// Check a delivery signature against the raw request body.
    ///
    /// Always true in token mode; signature deliveries are verified as
    /// hex(sha256(timestamp + nonce + key + body)).
    pub fn signature_matches(
        &self,
        timestamp: &str,
        nonce: &str,
        candidate: &str,
        body: &[u8],
    ) -> bool {
        match &self.verifier {
            Verifier::Signature(key) => compute_signature(key, timestamp, nonce, body) == candidate,
            Verifier::Token(_) => true,
        }
    }

    /// Current (event, message) ledger sizes, for the stats report.
    pub fn ledger_sizes(&self) -> (usize, usize) {
        let events = self
            .event_ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        let messages = self
            .message_ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        (events, messages)
    }
}

/// Signature over one delivery as the platform computes it.
pub fn compute_signature(encrypt_key: &str, timestamp: &str, nonce: &str, body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(timestamp.as_bytes());
    hasher.update(nonce.as_bytes());
    hasher.update(encrypt_key.as_bytes());
    hasher.update(body);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use larkrelay_core::{ConversationId, EventId, MessageId, SenderId};

    use super::*;

    const NOW_MS: i64 = 1_700_000_000_000;

    fn event(
        event_id: Option<&str>,
        message_id: Option<&str>,
        created_at_ms: Option<i64>,
    ) -> InboundEvent {
        InboundEvent {
            event_id: event_id.map(|id| EventId(id.to_string())),
            conversation_id: ConversationId("oc_test".to_string()),
            message_id: message_id.map(|id| MessageId(id.to_string())),
            sender_id: SenderId("ou_test".to_string()),
            message_type: "text".to_string(),
            content: r#"{"text":"hi"}"#.to_string(),
            created_at_ms,
        }
    }

    fn filter(token: &str) -> AdmissionFilter {
        AdmissionFilter::new(Verifier::Token(token.to_string()), 100, 120)
    }

    #[test]
    fn fresh_verified_event_is_accepted() {
        let filter = filter("tok");
        let decision = filter.admit(
            &event(Some("ev_1"), Some("om_1"), Some(NOW_MS - 5_000)),
            Some("tok"),
            NOW_MS,
        );
        assert_eq!(decision, AdmissionDecision::Accept);
    }

    #[test]
    fn token_mismatch_is_unverified() {
        let filter = filter("tok");
        let decision = filter.admit(&event(Some("ev_1"), Some("om_1"), None), Some("bad"), NOW_MS);
        assert_eq!(decision, AdmissionDecision::Unverified);
    }

    #[test]
    fn missing_token_is_unverified_when_one_is_configured() {
        let filter = filter("tok");
        let decision = filter.admit(&event(Some("ev_1"), Some("om_1"), None), None, NOW_MS);
        assert_eq!(decision, AdmissionDecision::Unverified);
    }

    #[test]
    fn empty_configured_token_accepts_anything() {
        let filter = filter("");
        assert_eq!(
            filter.admit(&event(Some("ev_1"), Some("om_1"), None), None, NOW_MS),
            AdmissionDecision::Accept
        );
        assert_eq!(
            filter.admit(&event(Some("ev_2"), Some("om_2"), None), Some("junk"), NOW_MS),
            AdmissionDecision::Accept
        );
    }

    #[test]
    fn rejected_delivery_does_not_consume_its_ids() {
        let filter = filter("tok");
        let delivery = event(Some("ev_1"), Some("om_1"), None);

        assert_eq!(
            filter.admit(&delivery, Some("bad"), NOW_MS),
            AdmissionDecision::Unverified
        );
        // The retry with the right token must still be new.
        assert_eq!(
            filter.admit(&delivery, Some("tok"), NOW_MS),
            AdmissionDecision::Accept
        );
    }

    #[test]
    fn second_delivery_of_an_event_id_is_duplicate() {
        let filter = filter("tok");
        let delivery = event(Some("ev_1"), Some("om_1"), None);

        assert_eq!(
            filter.admit(&delivery, Some("tok"), NOW_MS),
            AdmissionDecision::Accept
        );
        assert_eq!(
            filter.admit(&delivery, Some("tok"), NOW_MS),
            AdmissionDecision::Duplicate
        );
    }

    #[test]
    fn same_message_under_a_fresh_event_id_is_duplicate() {
        let filter = filter("tok");

        assert_eq!(
            filter.admit(&event(Some("ev_1"), Some("om_1"), None), Some("tok"), NOW_MS),
            AdmissionDecision::Accept
        );
        // Backlog replays arrive under distinct event ids.
        assert_eq!(
            filter.admit(&event(Some("ev_2"), Some("om_1"), None), Some("tok"), NOW_MS),
            AdmissionDecision::Duplicate
        );
    }

    #[test]
    fn event_over_the_freshness_window_is_stale() {
        let filter = filter("tok");
        let decision = filter.admit(
            &event(Some("ev_1"), Some("om_1"), Some(NOW_MS - 200_000)),
            Some("tok"),
            NOW_MS,
        );
        assert_eq!(decision, AdmissionDecision::Stale);
    }

    #[test]
    fn event_exactly_at_the_window_boundary_is_fresh() {
        let filter = filter("tok");
        let decision = filter.admit(
            &event(Some("ev_1"), Some("om_1"), Some(NOW_MS - 120_000)),
            Some("tok"),
            NOW_MS,
        );
        assert_eq!(decision, AdmissionDecision::Accept);
    }

    #[test]
    fn missing_ids_and_timestamp_skip_their_checks() {
        let filter = filter("tok");
        // Nothing to dedup on, nothing to age: both pass.
        assert_eq!(
            filter.admit(&event(None, None, None), Some("tok"), NOW_MS),
            AdmissionDecision::Accept
        );
        assert_eq!(
            filter.admit(&event(None, None, None), Some("tok"), NOW_MS),
            AdmissionDecision::Accept
        );
    }

    #[test]
    fn concurrent_admissions_of_one_message_accept_exactly_once() {
        let filter = Arc::new(filter(""));
        let mut handles = Vec::new();

        for worker in 0..8 {
            let filter = Arc::clone(&filter);
            handles.push(std::thread::spawn(move || {
                // Distinct event ids, shared message id, as redeliveries look.
                let delivery = event(
                    Some(&format!("ev_{worker}")),
                    Some("om_contended"),
                    Some(NOW_MS - 1_000),
                );
                filter.admit(&delivery, None, NOW_MS)
            }));
        }

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|d| *d == AdmissionDecision::Accept)
            .count();
        assert_eq!(accepted, 1);
    }

    #[test]
    fn signature_round_trip_matches() {
        let filter = AdmissionFilter::new(Verifier::Signature("secret".to_string()), 100, 120);
        let body = br#"{"header":{"event_type":"im.message.receive_v1"}}"#;
        let signature = compute_signature("secret", "1700000000", "nonce-1", body);

        assert!(filter.requires_signature());
        assert!(filter.signature_matches("1700000000", "nonce-1", &signature, body));
        assert!(!filter.signature_matches("1700000000", "nonce-2", &signature, body));
        assert!(!filter.signature_matches("1700000000", "nonce-1", &signature, b"tampered"));
    }

    #[test]
    fn token_mode_does_not_demand_signatures() {
        let filter = filter("tok");
        assert!(!filter.requires_signature());
        assert!(filter.signature_matches("ts", "nonce", "anything", b"body"));
    }

    #[test]
    fn ledger_sizes_track_both_levels() {
        let filter = filter("");
        filter.admit(&event(Some("ev_1"), Some("om_1"), None), None, NOW_MS);
        filter.admit(&event(Some("ev_2"), None, None), None, NOW_MS);
        assert_eq!(filter.ledger_sizes(), (2, 1));
    }
}
