//! Human-readable renderings of store outcomes.


use std::fmt::Write as _;

use crate::database::{ChatMessage, SearchResult, StoredDocument, StoredItem};

/// Longest content preview shown per document search hit, in characters
pub const PREVIEW_CHARS: usize = 100;

pub const UNTITLED: &str = "Untitled Document";
pub const NO_HISTORY: &str = "No conversation history.";

#[inline]
pub fn stored_document(document: &StoredDocument) -> String {
    let body = serde_json::to_string_pretty(document).unwrap_or_else(|_| format!("{:?}", document));
    format!("STORED DOCUMENT:\n\n{}", body)
}

/// First [`PREVIEW_CHARS`] characters of `content`, with `...` appended when
/// anything was cut
#[inline]
pub fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[inline]
pub fn document_results(results: &[StoredDocument], query: &str) -> String {
    if results.is_empty() {
        return format!("No documents found for: '{}'", query);
    }

    let mut lines = vec![format!("Found {} results for: '{}'\n", results.len(), query)];
    for (i, document) in results.iter().enumerate() {
        let mut heading = format!("{}. {}", i + 1, document.title().unwrap_or(UNTITLED));
        if let Some(language) = document.language().filter(|l| !l.is_empty()) {
            let _ = write!(heading, " [{}]", language);
        }
        lines.push(heading);

        if !document.content.is_empty() {
            lines.push(format!("   {}", preview(&document.content)));
        }

        let tags = document.tags();
        if !tags.is_empty() {
            let rendered: Vec<String> = tags.iter().map(|t| format!("#{}", t)).collect();
            lines.push(format!("   {}", rendered.join(" ")));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

#[inline]
pub fn similarity_results(results: &[SearchResult], query: &str) -> String {
    if results.is_empty() {
        return format!("No similar documents found for: '{}'", query);
    }

    let mut out = format!("Found {} results for query: '{}'\n", results.len(), query);
    for (i, result) in results.iter().enumerate() {
        let _ = write!(
            out,
            "\n{}. (distance {:.4}) {}",
            i + 1,
            result.distance,
            result.content
        );
    }
    out
}

/// Listing shown when the vector component is run without a query
#[inline]
pub fn document_listing(items: &[StoredItem]) -> String {
    let mut out = format!("Retrieved {} documents (no search query provided)", items.len());
    for item in items {
        let _ = write!(out, "\n{}. {}", item.id, preview(&item.content));
    }
    out
}

#[inline]
pub fn vector_stored(id: i64, documents_table: &str, embeddings_table: &str) -> String {
    format!(
        "Stored document {} in {}/{}",
        id, documents_table, embeddings_table
    )
}

#[inline]
pub fn chat_history(messages: &[ChatMessage]) -> String {
    if messages.is_empty() {
        return NO_HISTORY.to_string();
    }

    messages
        .iter()
        .map(|m| format!("{}: {}", m.sender.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}
