// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential lifecycle for the chat platform.
//!
//! Two credential kinds with different lifetimes live here. The app access
//! token ([`AppTokenCache`]) is exchanged from static app credentials, cached
//! in memory with a safety margin, and never persisted. The user credential
//! ([`UserTokenManager`]) comes from an OAuth authorization-code flow, is
//! persisted across restarts via [`TokenStore`], and refreshes itself ahead
//! of expiry.

pub mod app;
pub mod record;
pub mod store;
pub mod user;

pub use app::AppTokenCache;
pub use record::{CredentialRecord, REFRESH_BUFFER_SECS, TokenStatus};
pub use store::TokenStore;
pub use user::UserTokenManager;
