// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the webhook and the operator API.
//!
//! The webhook contract is deliberately forgiving: apart from verification
//! failures (401), every delivered payload is acknowledged with HTTP 200 so
//! the platform never retries a delivery we have already seen. Reply work
//! happens strictly after the acknowledgment, in the dispatcher.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use larkrelay_core::{AdmissionDecision, ConversationId, InboundEvent};

use crate::event::{self, WebhookPayload};
use crate::server::GatewayState;

/// Acknowledgment body the platform expects on `/callback`.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    /// 0 for success, 1 for any rejection.
    pub code: i64,
    /// Human-readable outcome.
    pub msg: String,
}

/// Echo body for the URL verification handshake. Must carry exactly this
/// one field.
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub challenge: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Seconds since process start.
    pub uptime_seconds: u64,
    /// Current epoch seconds.
    pub timestamp: i64,
}

/// Request body for POST /test/send.
#[derive(Debug, Deserialize)]
pub struct TestSendRequest {
    /// Conversation to deliver into.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Message text; a fixed test message when omitted.
    #[serde(default)]
    pub message: Option<String>,
}

/// Response body for a successful POST /test/send.
#[derive(Debug, Serialize)]
pub struct TestSendResponse {
    pub status: String,
}

/// Response body for GET /stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Seconds since process start.
    pub uptime_seconds: u64,
    /// Processing counters.
    pub events: crate::stats::StatsSnapshot,
    /// Dedup ledger occupancy.
    pub ledgers: LedgerSizes,
    /// Configured reply backends, in cascade order.
    pub backends: Vec<String>,
    /// Active document search strategy.
    pub search_strategy: String,
}

/// Dedup ledger occupancy inside the stats report.
#[derive(Debug, Serialize)]
pub struct LedgerSizes {
    pub events: usize,
    pub messages: usize,
}

/// Query parameters for GET /auth/url.
#[derive(Debug, Deserialize)]
pub struct AuthUrlQuery {
    /// Opaque state carried through the authorization round trip.
    #[serde(default)]
    pub state: Option<String>,
}

/// Response body for GET /auth/url.
#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    pub url: String,
}

/// Query parameters for GET /auth/exchange.
#[derive(Debug, Deserialize)]
pub struct AuthExchangeQuery {
    /// Authorization code handed back by the platform redirect.
    #[serde(default)]
    pub code: Option<String>,
}

/// Request body for POST /strategy.
#[derive(Debug, Deserialize)]
pub struct StrategyRequest {
    /// Name of the strategy to activate.
    pub strategy: String,
}

/// Response body for a successful POST /strategy.
#[derive(Debug, Serialize)]
pub struct StrategySwitchResponse {
    pub status: String,
    pub strategy: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// POST /callback
///
/// Webhook intake. Echoes verification challenges, runs admission on message
/// events, and hands accepted text messages to the dispatcher. The response
/// is produced before any reply work starts.
pub async fn post_callback(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.stats.record_received();

    if state.admission.requires_signature() && !signature_verified(&state, &headers, &body) {
        state.stats.record_admission(AdmissionDecision::Unverified);
        return rejected(StatusCode::UNAUTHORIZED, "invalid signature");
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "unparseable webhook body, acknowledging");
            return rejected(StatusCode::OK, "invalid payload");
        }
    };

    match event::parse_payload(&payload) {
        WebhookPayload::Challenge { challenge } => {
            info!("answering webhook address verification handshake");
            (StatusCode::OK, Json(ChallengeResponse { challenge })).into_response()
        }
        WebhookPayload::Message { token, event } => {
            let now_ms = chrono::Utc::now().timestamp_millis();
            let decision = state.admission.admit(&event, token.as_deref(), now_ms);
            state.stats.record_admission(decision);

            match decision {
                AdmissionDecision::Unverified => rejected(StatusCode::UNAUTHORIZED, "invalid token"),
                AdmissionDecision::Duplicate | AdmissionDecision::Stale => success(),
                AdmissionDecision::Accept => handle_admitted(&state, event),
            }
        }
        WebhookPayload::Other { token } => {
            if state.admission.token_accepted(token.as_deref()) {
                success()
            } else {
                state.stats.record_admission(AdmissionDecision::Unverified);
                rejected(StatusCode::UNAUTHORIZED, "invalid token")
            }
        }
    }
}

fn handle_admitted(state: &GatewayState, event: InboundEvent) -> Response {
    if !state.allowed_senders.is_empty() && !state.allowed_senders.contains(&event.sender_id.0) {
        warn!(sender = %event.sender_id.0, "sender not on the allow-list, declining");
        state.dispatcher.dispatch_notice(
            event.conversation_id.clone(),
            "Sorry, you are not authorized to use this assistant. Please contact an administrator for access.".to_string(),
            event.message_id.clone(),
        );
        return success();
    }

    if let Some(notice) = courtesy_for(&event) {
        state.dispatcher.dispatch_notice(
            event.conversation_id.clone(),
            notice,
            event.message_id.clone(),
        );
        return success();
    }

    if let Some(text) = event::extract_text(&event) {
        // A false return means the dispatcher was saturated; the drop is
        // already counted and the delivery is still acknowledged.
        state.dispatcher.dispatch(event, text);
    }
    success()
}

// Fixed replies for message types the pipeline does not handle.
fn courtesy_for(event: &InboundEvent) -> Option<String> {
    match event.message_type.as_str() {
        "text" => None,
        "image" => Some(
            "I received your image, but image analysis isn't supported yet. Please describe your question in text."
                .to_string(),
        ),
        "file" => {
            let file_name = event::content_field(event, "file_name")
                .unwrap_or_else(|| "unknown file".to_string());
            Some(format!(
                "I received your file \"{file_name}\", but file analysis isn't supported yet."
            ))
        }
        "audio" => Some(
            "I received your audio, but speech recognition isn't supported yet. Please type your question instead."
                .to_string(),
        ),
        other => {
            let kind = if other.is_empty() { "unsupported" } else { other };
            Some(format!(
                "I received your {kind} message, but only text messages are supported right now."
            ))
        }
    }
}

fn signature_verified(state: &GatewayState, headers: &HeaderMap, body: &[u8]) -> bool {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

    match (
        header("x-lark-request-timestamp"),
        header("x-lark-request-nonce"),
        header("x-lark-signature"),
    ) {
        (Some(timestamp), Some(nonce), Some(signature)) => {
            state
                .admission
                .signature_matches(timestamp, nonce, signature, body)
        }
        _ => {
            warn!("delivery is missing signature headers");
            false
        }
    }
}

fn success() -> Response {
    (
        StatusCode::OK,
        Json(AckResponse {
            code: 0,
            msg: "success".to_string(),
        }),
    )
        .into_response()
}

fn rejected(status: StatusCode, msg: &str) -> Response {
    (
        status,
        Json(AckResponse {
            code: 1,
            msg: msg.to_string(),
        }),
    )
        .into_response()
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "larkrelay".to_string(),
        uptime_seconds: state.stats.uptime_secs(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

/// GET /metrics
///
/// Prometheus exposition text, when a recorder is installed.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.prometheus_render {
        Some(render) => (StatusCode::OK, render()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed\n",
        )
            .into_response(),
    }
}

/// POST /test/send
///
/// Operator utility: deliver a plain message into a conversation, bypassing
/// the reply pipeline.
pub async fn post_test_send(
    State(state): State<GatewayState>,
    Json(body): Json<TestSendRequest>,
) -> Response {
    let Some(conversation_id) = body.conversation_id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "missing conversation_id".to_string(),
            }),
        )
            .into_response();
    };
    let message = body
        .message
        .unwrap_or_else(|| "Test message from larkrelay".to_string());

    let sent = state
        .platform
        .send_reply(&ConversationId(conversation_id), &message, None)
        .await;
    if sent {
        (
            StatusCode::OK,
            Json(TestSendResponse {
                status: "sent".to_string(),
            }),
        )
            .into_response()
    } else {
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: "delivery failed".to_string(),
            }),
        )
            .into_response()
    }
}

/// GET /stats
pub async fn get_stats(State(state): State<GatewayState>) -> Json<StatsResponse> {
    let (events, messages) = state.admission.ledger_sizes();
    Json(StatsResponse {
        uptime_seconds: state.stats.uptime_secs(),
        events: state.stats.snapshot(),
        ledgers: LedgerSizes { events, messages },
        backends: state.router.backend_names(),
        search_strategy: state.docs.current().await,
    })
}

/// GET /auth/status
pub async fn get_auth_status(State(state): State<GatewayState>) -> Response {
    Json(state.user_auth.status().await).into_response()
}

/// GET /auth/url
pub async fn get_auth_url(
    State(state): State<GatewayState>,
    Query(query): Query<AuthUrlQuery>,
) -> Response {
    match state.user_auth.authorize_url(query.state.as_deref()) {
        Ok(url) => (StatusCode::OK, Json(AuthUrlResponse { url })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /auth/exchange
///
/// Completes the authorization-code handshake. This is the redirect target
/// the operator lands on after consenting in the browser.
pub async fn get_auth_exchange(
    State(state): State<GatewayState>,
    Query(query): Query<AuthExchangeQuery>,
) -> Response {
    let Some(code) = query.code else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "missing code parameter".to_string(),
            }),
        )
            .into_response();
    };

    match state.user_auth.exchange_code(&code).await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => {
            warn!(error = %e, "authorization code exchange failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /strategy
pub async fn get_strategy(State(state): State<GatewayState>) -> Response {
    Json(state.docs.info().await).into_response()
}

/// POST /strategy
///
/// Rebind the active search strategy after validating the target is known
/// and ready.
pub async fn post_strategy(
    State(state): State<GatewayState>,
    Json(body): Json<StrategyRequest>,
) -> Response {
    match state.docs.switch(&body.strategy).await {
        Ok(()) => (
            StatusCode::OK,
            Json(StrategySwitchResponse {
                status: "switched".to_string(),
                strategy: body.strategy,
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
