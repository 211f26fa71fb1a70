//! Content indexing: source snapshot → filtered, tag-stripped items.
//!
//! # Filter order
//!
//! 1. Take the source's public types, minus `excluded_types`.
//! 2. List published items of those types, minus `excluded_ids`.
//! 3. Skip items whose status is in `excluded_statuses`.
//! 4. Strip markup from the body; skip if shorter than `min_body_length`
//!    characters.
//! 5. Attach the excerpt only when `include_excerpts` is set and the
//!    source excerpt is non-empty.
//!
//! Output order is source order. Nothing is cached: every call re-reads
//! the source.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::models::{ContentItem, IndexedItem};
use crate::settings::IndexSettings;
use crate::source::{ContentQuery, ContentSource, PUBLISHED};
use crate::text::strip_tags;

/// Builds [`IndexedItem`]s from a [`ContentSource`] under [`IndexSettings`].
pub struct ContentIndexer<'a> {
    source: &'a dyn ContentSource,
    settings: &'a IndexSettings,
}

/// Summary of one indexing pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub items: usize,
    pub content_types: BTreeSet<String>,
}

impl<'a> ContentIndexer<'a> {
    pub fn new(source: &'a dyn ContentSource, settings: &'a IndexSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &IndexSettings {
        self.settings
    }

    /// Run one indexing pass.
    pub fn index(&self) -> Vec<IndexedItem> {
        let types: Vec<String> = self
            .source
            .public_types()
            .into_iter()
            .filter(|t| !self.settings.is_type_excluded(t))
            .collect();

        if types.is_empty() {
            return Vec::new();
        }

        let query = ContentQuery::published(types)
            .excluding(self.settings.excluded_ids.iter().copied());

        let candidates = self.source.list(&query);
        let total = candidates.len();

        let items: Vec<IndexedItem> = candidates
            .into_iter()
            .filter_map(|item| self.to_indexed(item))
            .collect();

        debug!(candidates = total, indexed = items.len(), "content indexed");
        items
    }

    /// Look up a single published item by id.
    ///
    /// Unlike [`index`](Self::index), the excerpt is returned as stored and
    /// no exclusion rules apply.
    pub fn get_content(&self, id: u64) -> Option<IndexedItem> {
        let item = self.source.get(id)?;
        if item.status != PUBLISHED {
            return None;
        }
        Some(IndexedItem {
            id: item.id,
            content_type: item.content_type,
            title: item.title,
            body: strip_tags(&item.body),
            excerpt: Some(item.excerpt),
            url: item.permalink,
        })
    }

    /// Index and summarize.
    pub fn stats(&self) -> IndexStats {
        let items = self.index();
        IndexStats {
            items: items.len(),
            content_types: items.into_iter().map(|i| i.content_type).collect(),
        }
    }

    fn to_indexed(&self, item: ContentItem) -> Option<IndexedItem> {
        if self.settings.is_id_excluded(item.id) || self.settings.is_status_excluded(&item.status)
        {
            return None;
        }

        let body = strip_tags(&item.body);
        if self.settings.is_too_short(&body) {
            return None;
        }

        let excerpt = if self.settings.include_excerpts && !item.excerpt.is_empty() {
            Some(item.excerpt)
        } else {
            None
        };

        Some(IndexedItem {
            id: item.id,
            content_type: item.content_type,
            title: item.title,
            body,
            excerpt,
            url: item.permalink,
        })
    }
}
