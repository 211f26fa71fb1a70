//! Index exclusion rules.
//!
//! [`IndexSettings`] is plain configuration: it is deserialized from the
//! `[index]` table of the application config and borrowed immutably for the
//! whole of an indexing or search pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSettings {
    #[serde(default = "default_excluded_types")]
    pub excluded_types: BTreeSet<String>,
    #[serde(default = "default_excluded_statuses")]
    pub excluded_statuses: BTreeSet<String>,
    #[serde(default)]
    pub excluded_ids: BTreeSet<u64>,
    /// Minimum stripped body length, in characters.
    #[serde(default = "default_min_body_length")]
    pub min_body_length: usize,
    #[serde(default = "default_include_excerpts")]
    pub include_excerpts: bool,
}

fn default_excluded_types() -> BTreeSet<String> {
    ["attachment", "revision", "nav_menu_item"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_excluded_statuses() -> BTreeSet<String> {
    ["draft", "private", "trash", "auto-draft"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_min_body_length() -> usize {
    50
}

fn default_include_excerpts() -> bool {
    true
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            excluded_types: default_excluded_types(),
            excluded_statuses: default_excluded_statuses(),
            excluded_ids: BTreeSet::new(),
            min_body_length: default_min_body_length(),
            include_excerpts: default_include_excerpts(),
        }
    }
}

impl IndexSettings {
    pub fn is_type_excluded(&self, content_type: &str) -> bool {
        self.excluded_types.contains(content_type)
    }

    pub fn is_status_excluded(&self, status: &str) -> bool {
        self.excluded_statuses.contains(status)
    }

    pub fn is_id_excluded(&self, id: u64) -> bool {
        self.excluded_ids.contains(&id)
    }

    /// True if already-stripped `text` is shorter than `min_body_length` characters.
    pub fn is_too_short(&self, text: &str) -> bool {
        text.chars().count() < self.min_body_length
    }
}
