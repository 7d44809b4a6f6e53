// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON file persistence for the user credential record.

use std::path::{Path, PathBuf};

use tracing::warn;

use larkrelay_core::RelayError;

use crate::record::CredentialRecord;

/// Stores the user credential record as pretty-printed JSON at a fixed path.
///
/// A missing or unreadable file is treated as "not authorized" rather than
/// an error, so a corrupted store degrades to requiring re-authorization.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record, if a readable one exists.
    pub fn load(&self) -> Option<CredentialRecord> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read credential store");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "credential store is corrupted; treating as unauthorized"
                );
                None
            }
        }
    }

    /// Persist the record, creating parent directories as needed.
    pub fn save(&self, record: &CredentialRecord) -> Result<(), RelayError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| RelayError::Auth {
                message: format!(
                    "failed to create credential store directory {}: {e}",
                    parent.display()
                ),
                source: Some(Box::new(e)),
            })?;
        }

        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&self.path, json).map_err(|e| RelayError::Auth {
            message: format!("failed to write credential store {}: {e}", self.path.display()),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CredentialRecord {
        CredentialRecord {
            access_token: "u-access".into(),
            refresh_token: "u-refresh".into(),
            obtained_at: 1_700_000_000,
            expires_in: 7200,
            refresh_expires_in: 2_592_000,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("user_token.json"));

        store.save(&record()).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, record());

        // A reloaded record reports the same expiry verdict at the same clock.
        let before_buffer = record().obtained_at + record().expires_in - 601;
        let inside_buffer = record().obtained_at + record().expires_in - 599;
        assert_eq!(
            loaded.is_expiring_soon_at(before_buffer),
            record().is_expiring_soon_at(before_buffer)
        );
        assert!(loaded.is_expiring_soon_at(inside_buffer));
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested/deeper/user_token.json"));

        store.save(&record()).unwrap();
        assert!(store.load().is_some());
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("absent.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn corrupted_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_token.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = TokenStore::new(path);
        assert!(store.load().is_none());
    }
}
