// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search result shaping.
//!
//! Every strategy reduces its raw response to [`DocHit`]s and renders them
//! with [`format_results`], so backends always see the same context block
//! regardless of which transport found the documents.

/// One document surfaced by a search strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocHit {
    pub title: String,
    pub doc_type: String,
    pub url: String,
    pub owner: Option<String>,
}

/// Prefixes users habitually put in front of the actual search terms.
const SEARCH_PREFIXES: [&str; 8] = [
    "搜索", "查找", "查询", "帮我查", "找一下", "search for", "search", "find",
];

/// Trim conversational framing off a query before it hits the search API.
pub fn normalize_query(query: &str) -> String {
    let mut normalized = query.trim().to_lowercase();
    for prefix in SEARCH_PREFIXES {
        if let Some(rest) = normalized.strip_prefix(prefix) {
            normalized = rest.trim().to_string();
            break;
        }
    }
    normalized
}

/// Message used whenever a search produced nothing usable.
pub fn no_results_message(query: &str) -> String {
    format!("No documents matched '{query}'.")
}

/// Render hits as the context block handed to a reply backend.
pub fn format_results(query: &str, hits: &[DocHit]) -> String {
    if hits.is_empty() {
        return no_results_message(query);
    }

    let mut out = String::from("**Retrieved documents:**\n\n");
    out.push_str(&format!("Found {} matching documents:\n\n", hits.len()));

    for (i, hit) in hits.iter().enumerate() {
        out.push_str("---\n");
        out.push_str(&format!("### Document {}: {}\n", i + 1, hit.title));
        out.push_str(&format!("- type: {}\n", hit.doc_type));
        out.push_str(&format!("- link: {}\n", hit.url));
        if let Some(owner) = &hit.owner {
            out.push_str(&format!("- owner: {owner}\n"));
        }
        out.push('\n');
    }

    out.push_str("---\nUse the documents above to answer the user's question.");
    out
}

/// Pull the hit list out of a search response `data` object.
///
/// The platform has shipped the list under several keys over time; the
/// first non-empty one wins.
pub(crate) fn parse_hits(data: &serde_json::Value) -> Vec<DocHit> {
    let hits = ["files", "docs_entities", "docs"]
        .iter()
        .find_map(|key| {
            data.get(*key)
                .and_then(|v| v.as_array())
                .filter(|a| !a.is_empty())
        })
        .cloned()
        .unwrap_or_default();

    hits.iter().map(doc_hit).collect()
}

fn doc_hit(value: &serde_json::Value) -> DocHit {
    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| {
                value
                    .get(*k)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
            })
            .map(ToOwned::to_owned)
    };

    let title = text(&["title", "name", "docs_token"]).unwrap_or_else(|| "Untitled".to_string());
    let doc_type = text(&["type", "docs_type", "doc_type"]).unwrap_or_else(|| "docx".to_string());
    let url = text(&["url"])
        .or_else(|| text(&["token", "docs_token"]))
        .unwrap_or_default();
    let owner = match value.get("owner") {
        Some(serde_json::Value::Object(obj)) => obj
            .get("name")
            .and_then(|v| v.as_str())
            .map(ToOwned::to_owned),
        _ => text(&["owner_name"]),
    };

    DocHit {
        title,
        doc_type,
        url,
        owner,
    }
}
