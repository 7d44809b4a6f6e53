// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Larkrelay bridge.

use thiserror::Error;

/// The primary error type used across all Larkrelay crates.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Webhook verification errors (token mismatch, bad signature headers).
    #[error("verification failed: {0}")]
    Verification(String),

    /// Platform API errors (token exchange, history fetch, message send).
    #[error("platform error: {message}")]
    Platform {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Credential lifecycle errors (code exchange, refresh, token persistence).
    #[error("auth error: {message}")]
    Auth {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reply backend errors (connection failure, bad status, unusable body).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Document search errors (search API failure, malformed results).
    #[error("document search error: {message}")]
    Docs {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A user-level credential is required but absent or beyond refresh.
    #[error("user authorization missing: {0}")]
    AuthorizationMissing(String),

    /// Every configured reply backend failed for a single message.
    #[error("all {attempted} reply backends failed")]
    BackendExhausted { attempted: usize },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
