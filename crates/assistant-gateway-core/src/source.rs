//! Content source abstraction.
//!
//! The [`ContentSource`] trait is the read-only boundary between the
//! retrieval pipeline and whatever holds the site content (a CMS export,
//! a directory of documents, a test fixture). Implementations hand out a
//! snapshot; the pipeline never writes back.

use std::collections::HashSet;

use crate::models::ContentItem;

/// Status value of publicly visible content.
pub const PUBLISHED: &str = "publish";

/// Filter passed to [`ContentSource::list`].
#[derive(Debug, Clone, Default)]
pub struct ContentQuery {
    /// Only items of these content types. Empty matches nothing.
    pub types: Vec<String>,
    /// Only items with this status.
    pub status: String,
    /// Items with these ids are skipped.
    pub exclude_ids: HashSet<u64>,
}

impl ContentQuery {
    /// Query for published items of the given types.
    pub fn published(types: Vec<String>) -> Self {
        Self {
            types,
            status: PUBLISHED.to_string(),
            exclude_ids: HashSet::new(),
        }
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.exclude_ids.extend(ids);
        self
    }

    fn matches(&self, item: &ContentItem) -> bool {
        self.types.iter().any(|t| *t == item.content_type)
            && item.status == self.status
            && !self.exclude_ids.contains(&item.id)
    }
}

/// Read-only listing of content items.
///
/// Listing order must be stable across calls against an unchanged
/// snapshot; the indexer relies on it for deterministic output.
pub trait ContentSource: Send + Sync {
    /// Content types visible to the public.
    fn public_types(&self) -> Vec<String>;

    /// Items matching `query`, in source order.
    fn list(&self, query: &ContentQuery) -> Vec<ContentItem>;

    /// Single item lookup by id, regardless of status.
    fn get(&self, id: u64) -> Option<ContentItem>;
}

/// A [`ContentSource`] backed by an in-memory vector.
///
/// Public types default to every type present in the snapshot, in first-seen
/// order. Use [`with_public_types`](InMemorySource::with_public_types) to
/// model hidden types.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    items: Vec<ContentItem>,
    public_types: Option<Vec<String>>,
}

impl InMemorySource {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self {
            items,
            public_types: None,
        }
    }

    pub fn with_public_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ContentSource for InMemorySource {
    fn public_types(&self) -> Vec<String> {
        if let Some(types) = &self.public_types {
            return types.clone();
        }
        let mut seen = Vec::new();
        for item in &self.items {
            if !seen.contains(&item.content_type) {
                seen.push(item.content_type.clone());
            }
        }
        seen
    }

    fn list(&self, query: &ContentQuery) -> Vec<ContentItem> {
        self.items
            .iter()
            .filter(|item| query.matches(item))
            .cloned()
            .collect()
    }

    fn get(&self, id: u64) -> Option<ContentItem> {
        self.items.iter().find(|item| item.id == id).cloned()
    }
}
