// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat platform message API client.
//!
//! [`PlatformClient`] covers the two message operations the relay needs:
//! fetching recent conversation history for reply context and delivering
//! text replies. Both are deliberately forgiving, a platform hiccup never
//! takes the pipeline down with it.

pub mod client;
pub mod history;
pub mod messenger;

pub use client::PlatformClient;
