//! Lexical relevance scoring over indexed content.
//!
//! # Scoring
//!
//! The query is lower-cased and split on whitespace. For every term of at
//! least three characters, against an item's lower-cased
//! `title + " " + body + " " + excerpt`:
//!
//! | Signal | Points |
//! |--------|--------|
//! | term occurs in the title | +10 |
//! | each non-overlapping occurrence of the term in the text | +2 |
//! | the whole lower-cased query occurs in the text | +20 |
//!
//! The phrase bonus is evaluated inside the term loop, so an item that
//! contains the full query earns it once per qualifying term. Existing
//! rankings depend on this; changing it reorders results.
//!
//! Scores saturate at `u32::MAX` rather than wrapping, so a long query
//! against a large page cannot reorder results by overflow.
//!
//! Items scoring zero are dropped. The rest are sorted by score
//! descending with a stable sort (ties keep index order) and truncated.

use tracing::debug;

use crate::indexer::ContentIndexer;
use crate::models::{IndexedItem, SearchResult};

/// Terms shorter than this many characters are ignored.
pub const MIN_TERM_CHARS: usize = 3;
pub const TITLE_MATCH_POINTS: u32 = 10;
pub const OCCURRENCE_POINTS: u32 = 2;
pub const PHRASE_MATCH_POINTS: u32 = 20;

/// Scores a fresh index pass against a query.
pub struct ContentSearcher<'a> {
    indexer: ContentIndexer<'a>,
}

impl<'a> ContentSearcher<'a> {
    pub fn new(indexer: ContentIndexer<'a>) -> Self {
        Self { indexer }
    }

    pub fn indexer(&self) -> &ContentIndexer<'a> {
        &self.indexer
    }

    /// Return at most `limit` items relevant to `query`, best first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        if limit == 0 {
            return Vec::new();
        }
        let results = rank(self.indexer.index(), query, limit);
        debug!(query, results = results.len(), "content searched");
        results
    }
}

/// Score, filter, sort, and truncate an already-built index.
pub fn rank(items: Vec<IndexedItem>, query: &str, limit: usize) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = items
        .into_iter()
        .filter_map(|item| {
            let score = score_item(&item, query);
            (score > 0).then_some(SearchResult {
                item,
                relevance_score: score,
            })
        })
        .collect();

    // `sort_by` is stable: equal scores keep index order.
    results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    results.truncate(limit);
    results
}

/// Relevance score of a single item for `query`.
pub fn score_item(item: &IndexedItem, query: &str) -> u32 {
    let query_lower = query.to_lowercase();
    let title_lower = item.title.to_lowercase();
    let text = format!(
        "{} {} {}",
        item.title,
        item.body,
        item.excerpt.as_deref().unwrap_or("")
    )
    .to_lowercase();

    let phrase_match = text.contains(&query_lower);

    query_lower
        .split_whitespace()
        .filter(|term| term.chars().count() >= MIN_TERM_CHARS)
        .fold(0u32, |score, term| {
            score.saturating_add(term_points(
                title_lower.contains(term),
                text.matches(term).count(),
                phrase_match,
            ))
        })
}

fn term_points(in_title: bool, occurrences: usize, phrase_match: bool) -> u32 {
    let occurrences = u32::try_from(occurrences).unwrap_or(u32::MAX);
    let mut points = occurrences.saturating_mul(OCCURRENCE_POINTS);
    if in_title {
        points = points.saturating_add(TITLE_MATCH_POINTS);
    }
    if phrase_match {
        points = points.saturating_add(PHRASE_MATCH_POINTS);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed(id: u64, title: &str, body: &str) -> IndexedItem {
        IndexedItem {
            id,
            content_type: "post".to_string(),
            title: title.to_string(),
            body: body.to_string(),
            excerpt: None,
            url: format!("https://example.com/{}", id),
        }
    }

    #[test]
    fn test_refund_policy_scenario() {
        let refund = indexed(
            1,
            "Refund Policy",
            "Customers may request a refund within 30 days of purchase.",
        );
        let unrelated = indexed(2, "Our Team", "Meet the people who build the product.");

        // "refund": title +10, occurrences in "refund policy customers may request a refund ..." = 2 → +4
        // "policy": title +10, occurrences = 1 → +2
        // phrase "refund policy" occurs in text → +20 per term → +40
        assert_eq!(score_item(&refund, "refund policy"), 66);
        assert_eq!(score_item(&unrelated, "refund policy"), 0);

        let results = rank(vec![unrelated, refund], "refund policy", 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.id, 1);
        assert!(results[0].relevance_score >= 10);
    }

    #[test]
    fn test_phrase_bonus_counted_per_term() {
        let item = indexed(1, "Nothing here", "alpha beta");
        // Each of the two terms: +2 occurrence, +20 phrase.
        assert_eq!(score_item(&item, "alpha beta"), 44);
    }

    #[test]
    fn test_short_terms_ignored() {
        let item = indexed(1, "An FAQ", "to be or not to be");
        assert_eq!(score_item(&item, "to be or"), 0);
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let items = vec![indexed(1, "Anything", "at all")];
        assert!(rank(items.clone(), "", 10).is_empty());
        assert!(rank(items, "   ", 10).is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let item = indexed(1, "SHIPPING", "Shipping takes two days.");
        assert_eq!(score_item(&item, "shipping"), 10 + 2 * 2 + 20);
        assert_eq!(score_item(&item, "ShIpPiNg"), 10 + 2 * 2 + 20);
    }

    #[test]
    fn test_occurrences_do_not_overlap() {
        let item = indexed(1, "x", "aaaa");
        // "aaa" occurs once without overlap; phrase bonus also applies.
        assert_eq!(score_item(&item, "aaa"), 2 + 20);
    }

    #[test]
    fn test_excerpt_contributes() {
        let mut item = indexed(1, "Title", "Body");
        assert_eq!(score_item(&item, "warranty"), 0);
        item.excerpt = Some("Two year warranty".to_string());
        assert_eq!(score_item(&item, "warranty"), 2 + 20);
    }

    #[test]
    fn test_term_points_saturate() {
        assert_eq!(term_points(true, 3, true), 10 + 6 + 20);
        assert_eq!(term_points(false, u32::MAX as usize / 2 + 1, false), u32::MAX);
        assert_eq!(term_points(true, usize::MAX, true), u32::MAX);
    }

    #[test]
    fn test_long_repetitive_query() {
        let item = indexed(1, "abc", &"abc ".repeat(2_000));
        let query = vec!["abc"; 500].join(" ");
        // Per term: title +10, 2_001 occurrences +4_002, no phrase match.
        assert_eq!(score_item(&item, &query), 500 * 4_012);
    }

    #[test]
    fn test_sorted_desc_and_stable_on_ties() {
        let items = vec![
            indexed(1, "a", "deploy"),
            indexed(2, "deploy", "deploy"),
            indexed(3, "b", "deploy"),
            indexed(4, "c", "nothing"),
            indexed(5, "d", "deploy"),
        ];
        let results = rank(items, "deploy", 10);
        let ids: Vec<u64> = results.iter().map(|r| r.item.id).collect();
        assert_eq!(ids, vec![2, 1, 3, 5]);
        for pair in results.windows(2) {
            assert!(pair[0].relevance_score >= pair[1].relevance_score);
        }
    }

    #[test]
    fn test_limit_respected() {
        let items: Vec<IndexedItem> = (0..10).map(|i| indexed(i, "cache", "cache")).collect();
        assert_eq!(rank(items.clone(), "cache", 3).len(), 3);
        assert!(rank(items, "cache", 0).is_empty());
    }
}
