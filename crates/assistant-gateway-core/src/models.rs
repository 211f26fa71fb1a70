//! Core data models for the retrieval pipeline.
//!
//! [`ContentItem`] is what a content source hands us; [`IndexedItem`] is
//! the filtered, tag-stripped form the searcher scores; [`SearchResult`]
//! pairs an indexed item with its relevance score.

use serde::{Deserialize, Serialize};

/// Raw content record produced by a [`ContentSource`](crate::source::ContentSource).
///
/// `body` may contain markup; it is stripped during indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: u64,
    /// Content type name (e.g. `"post"`, `"page"`).
    #[serde(rename = "type")]
    pub content_type: String,
    /// Publication status (e.g. `"publish"`, `"draft"`).
    pub status: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub permalink: String,
}

/// An item that passed the index filters.
///
/// Produced fresh on every indexing pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedItem {
    pub id: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub title: String,
    /// Tag-stripped plain text.
    pub body: String,
    /// Present only when excerpts are enabled and the source excerpt is non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub url: String,
}

/// An indexed item together with its lexical relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub item: IndexedItem,
    pub relevance_score: u32,
}
