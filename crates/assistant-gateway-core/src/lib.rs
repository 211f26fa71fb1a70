//! # Assistant Gateway Core
//!
//! Shared, I/O-free logic for Assistant Gateway: content models, the
//! content source trait, index settings, the indexer, the lexical
//! searcher, and retrieval context assembly.
//!
//! This crate contains no HTTP client, tokio, or filesystem access. The
//! application crate supplies a [`source::ContentSource`] snapshot and
//! forwards the augmented message to a provider.
//!
//! ## Pipeline
//!
//! ```text
//! ContentSource ──▶ ContentIndexer ──▶ ContentSearcher ──▶ RetrievalEngine
//!  (snapshot)        (filter+strip)     (score+rank)        (context+augment)
//! ```

pub mod indexer;
pub mod models;
pub mod rag;
pub mod search;
pub mod settings;
pub mod source;
pub mod text;

pub use indexer::{ContentIndexer, IndexStats};
pub use models::{ContentItem, IndexedItem, SearchResult};
pub use rag::RetrievalEngine;
pub use search::ContentSearcher;
pub use settings::IndexSettings;
pub use source::{ContentQuery, ContentSource, InMemorySource};
