// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the interchangeable pieces of the reply pipeline.
//!
//! Reply backends and document search strategies are held behind trait
//! objects, so both use `#[async_trait]` for dynamic dispatch compatibility.

pub mod backend;
pub mod search;

// Re-export both traits at the traits module level for convenience.
pub use backend::ReplyBackend;
pub use search::DocSearch;
