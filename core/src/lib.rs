//! In-memory TF-IDF search over short documents.
//!
//! [`SearchEngine`] owns the document store together with a forward index
//! (document -> term -> frequency) and an inverted index (term -> document ->
//! frequency). Queries are flat sets of plus and minus words; ranking and
//! matching run either sequentially or data-parallel on the rayon pool.

pub mod batch;
pub(crate) mod concurrent_map;
pub mod document;
pub mod error;
pub mod index;
pub mod matcher;
pub mod query;
pub mod ranking;
pub mod tokenizer;

pub use batch::{process_queries, process_queries_joined};
pub use document::{Document, DocumentStatus, ExecutionMode};
pub use error::{Result, SearchError};
pub use index::SearchEngine;
pub use ranking::{MAX_RESULT_DOCUMENT_COUNT, RELEVANCE_EPSILON};

pub type DocId = i32;
pub type Rating = i32;
