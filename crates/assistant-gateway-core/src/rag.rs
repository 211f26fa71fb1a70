//! Retrieval-augmented prompt assembly.
//!
//! [`RetrievalEngine`] turns the top search hits for a message into a
//! plain-text context block and prepends it to the message:
//!
//! ```text
//! Relevant information from website:
//!
//! Title: Refund Policy
//! URL: https://example.com/refunds
//! Content: Customers may request a refund within 30 days of purchase.
//!
//!
//!
//! Based on the above information, answer the following question:
//! Can I get my money back?
//! ```
//!
//! Pure text composition; the only input is the searcher's index pass.

use crate::search::ContentSearcher;
use crate::text::trim_words;

/// Number of search hits rendered into the context block.
pub const DEFAULT_TOP_K: usize = 3;
/// Word limit for each hit's body in the context block.
pub const DEFAULT_CONTEXT_WORDS: usize = 100;

pub const CONTEXT_HEADER: &str = "Relevant information from website:";
pub const ANSWER_INSTRUCTION: &str =
    "Based on the above information, answer the following question:";

pub struct RetrievalEngine<'a> {
    searcher: ContentSearcher<'a>,
    top_k: usize,
    context_words: usize,
}

impl<'a> RetrievalEngine<'a> {
    pub fn new(searcher: ContentSearcher<'a>) -> Self {
        Self {
            searcher,
            top_k: DEFAULT_TOP_K,
            context_words: DEFAULT_CONTEXT_WORDS,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_context_words(mut self, words: usize) -> Self {
        self.context_words = words;
        self
    }

    pub fn searcher(&self) -> &ContentSearcher<'a> {
        &self.searcher
    }

    /// Render the context block for `query`, or an empty string if nothing matched.
    pub fn build_context(&self, query: &str) -> String {
        let results = self.searcher.search(query, self.top_k);
        if results.is_empty() {
            return String::new();
        }

        let mut context = format!("{}\n\n", CONTEXT_HEADER);
        for result in &results {
            context.push_str(&format!(
                "Title: {}\nURL: {}\nContent: {}\n\n",
                result.item.title,
                result.item.url,
                trim_words(&result.item.body, self.context_words)
            ));
        }
        context
    }

    /// Prefix `message` with retrieved context.
    ///
    /// Returns `message` unchanged when there is no context; otherwise the
    /// result always ends with `message`.
    pub fn augment(&self, message: &str) -> String {
        let context = self.build_context(message);
        if context.is_empty() {
            return message.to_string();
        }
        format!("{}\n\n{}\n{}", context, ANSWER_INSTRUCTION, message)
    }
}
