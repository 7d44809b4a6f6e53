// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply backend routing.
//!
//! [`BackendRouter`] turns an inbound message into reply text: optional
//! document augmentation via the strategy registry, then a priority-ordered
//! cascade over [`HttpBackend`]s, then the deterministic [`LocalResponder`]
//! when everything configured has failed.

pub mod http;
pub mod local;
pub mod predicate;
pub mod router;

pub use http::HttpBackend;
pub use local::LocalResponder;
pub use predicate::{SearchPredicate, keyword_trigger};
pub use router::BackendRouter;
