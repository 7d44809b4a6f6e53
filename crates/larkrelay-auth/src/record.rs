// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted user credential record and its derived status report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access tokens within this many seconds of expiry are refreshed before use.
pub const REFRESH_BUFFER_SECS: u64 = 600;

pub(crate) fn default_expires_in() -> u64 {
    7200
}

pub(crate) fn default_refresh_expires_in() -> u64 {
    2_592_000 // 30 days
}

/// A user OAuth credential as persisted between restarts.
///
/// `obtained_at` is stamped by the manager when the tokens are issued, so all
/// expiry arithmetic derives from one clock reading. App access tokens are
/// never written here; only the user grant survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds when the tokens were issued.
    pub obtained_at: u64,
    /// Access token lifetime in seconds.
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    /// Refresh token lifetime in seconds.
    #[serde(default = "default_refresh_expires_in")]
    pub refresh_expires_in: u64,
}

impl CredentialRecord {
    /// Seconds of access-token validity left at `now`.
    pub fn remaining_at(&self, now: u64) -> u64 {
        (self.obtained_at + self.expires_in).saturating_sub(now)
    }

    /// Whether the access token is inside the refresh buffer at `now`.
    pub fn is_expiring_soon_at(&self, now: u64) -> bool {
        self.remaining_at(now) < REFRESH_BUFFER_SECS
    }

    /// Whether the refresh token is still usable at `now`.
    pub fn refresh_usable_at(&self, now: u64) -> bool {
        now < self.obtained_at + self.refresh_expires_in
    }
}

/// Credential status as reported by the status endpoint and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct TokenStatus {
    pub authorized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obtained_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_expires_in_days: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_expiring_soon: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TokenStatus {
    /// Status for a missing or unusable credential.
    pub fn unauthorized() -> Self {
        Self {
            authorized: false,
            obtained_at: None,
            expires_in_seconds: None,
            expires_in_minutes: None,
            refresh_expires_in_days: None,
            is_expiring_soon: None,
            message: Some("not authorized; visit /auth/url to begin authorization".to_string()),
        }
    }

    /// Status derived from a persisted record at `now`.
    pub fn from_record(record: &CredentialRecord, now: u64) -> Self {
        let remaining = record.remaining_at(now);
        let refresh_remaining =
            (record.obtained_at + record.refresh_expires_in).saturating_sub(now);
        let obtained_at = DateTime::<Utc>::from_timestamp(record.obtained_at as i64, 0)
            .map(|t| t.to_rfc3339());

        Self {
            authorized: true,
            obtained_at,
            expires_in_seconds: Some(remaining),
            expires_in_minutes: Some(remaining / 60),
            refresh_expires_in_days: Some(refresh_remaining / 86_400),
            is_expiring_soon: Some(record.is_expiring_soon_at(now)),
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CredentialRecord {
        CredentialRecord {
            access_token: "u-access".into(),
            refresh_token: "u-refresh".into(),
            obtained_at: 1_000,
            expires_in: 1_000,
            refresh_expires_in: 10_000,
        }
    }

    #[test]
    fn json_round_trip_preserves_every_field() {
        let original = record();
        let json = serde_json::to_string(&original).unwrap();
        let parsed: CredentialRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn lifetime_fields_default_when_absent() {
        let parsed: CredentialRecord = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","obtained_at":5}"#,
        )
        .unwrap();
        assert_eq!(parsed.expires_in, 7200);
        assert_eq!(parsed.refresh_expires_in, 2_592_000);
    }

    #[test]
    fn expiring_soon_flips_exactly_at_the_buffer() {
        let record = record();
        // Expires at 2000; the buffer is 600 seconds.
        assert!(!record.is_expiring_soon_at(1_400)); // 600 left, not yet inside
        assert!(record.is_expiring_soon_at(1_401)); // 599 left
        assert!(record.is_expiring_soon_at(2_500)); // already expired
    }

    #[test]
    fn remaining_saturates_at_zero_after_expiry() {
        let record = record();
        assert_eq!(record.remaining_at(9_999), 0);
    }

    #[test]
    fn refresh_usable_until_its_own_expiry() {
        let record = record();
        assert!(record.refresh_usable_at(10_999));
        assert!(!record.refresh_usable_at(11_000));
    }

    #[test]
    fn status_from_record_reports_consistent_windows() {
        let record = record();
        let status = TokenStatus::from_record(&record, 1_100);
        assert!(status.authorized);
        assert_eq!(status.expires_in_seconds, Some(900));
        assert_eq!(status.expires_in_minutes, Some(15));
        assert_eq!(status.refresh_expires_in_days, Some(0));
        assert_eq!(status.is_expiring_soon, Some(false));
        assert!(status.obtained_at.is_some());
        assert!(status.message.is_none());
    }

    #[test]
    fn unauthorized_status_omits_expiry_fields() {
        let status = TokenStatus::unauthorized();
        assert!(!status.authorized);
        let json = serde_json::to_value(&status).unwrap();
        assert!(json.get("expires_in_seconds").is_none());
        assert!(json.get("message").is_some());
    }
}
