// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge-seeking message classification.
//!
//! The router treats classification as a pluggable predicate: given the
//! message text, return the query to search for, or `None` to skip
//! augmentation. [`keyword_trigger`] is the stock implementation.

use std::sync::Arc;

/// Classifier deciding whether a message warrants document augmentation.
pub type SearchPredicate = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

const TRIGGER_KEYWORDS: [&str; 16] = [
    "文档",
    "知识库",
    "资料",
    "手册",
    "教程",
    "查一下",
    "找一下",
    "帮我查",
    "wiki",
    "docs",
    "document",
    "knowledge base",
    "runbook",
    "manual",
    "look up",
    "search",
];

const QUERY_PREFIXES: [&str; 10] = [
    "帮我查一下",
    "帮我查",
    "查一下",
    "找一下",
    "帮我",
    "查找",
    "搜索",
    "请",
    "look up",
    "search for",
];

const QUERY_SUFFIXES: [&str; 6] = [
    "的文档", "的资料", "相关信息", "怎么做", "docs", "documentation",
];

/// Stock classifier: any document-related keyword triggers a search, with
/// conversational framing stripped from the extracted query.
pub fn keyword_trigger() -> SearchPredicate {
    Arc::new(|message: &str| {
        let lowered = message.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }
        if !TRIGGER_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            return None;
        }
        Some(extract_query(&lowered))
    })
}

fn extract_query(text: &str) -> String {
    let mut query = text.to_string();

    for prefix in QUERY_PREFIXES {
        if let Some(rest) = query.strip_prefix(prefix) {
            query = rest.trim().to_string();
            break;
        }
    }
    for suffix in QUERY_SUFFIXES {
        if let Some(rest) = query.strip_suffix(suffix) {
            query = rest.trim().to_string();
            break;
        }
    }

    if query.is_empty() {
        text.trim().to_string()
    } else {
        query
    }
}
