// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document search strategies for reply augmentation.
//!
//! Three interchangeable [`DocSearch`] implementations cover the same drive
//! search endpoint with different credentials: [`DriveSearch`] uses the user
//! OAuth grant, [`TenantSearch`] the app token, and [`OfflineSearch`] is the
//! terminal stand-in when neither works. [`StrategyRegistry`] owns the set,
//! picks the active one, and exposes the single infallible `search` the
//! reply router calls.
//!
//! [`DocSearch`]: larkrelay_core::DocSearch

pub mod drive;
pub mod format;
pub mod offline;
pub mod registry;
pub mod tenant;

mod wire;

pub use drive::DriveSearch;
pub use format::{DocHit, format_results, no_results_message, normalize_query};
pub use offline::OfflineSearch;
pub use registry::{StrategyEntry, StrategyInfo, StrategyRegistry};
pub use tenant::TenantSearch;
