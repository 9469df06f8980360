use thiserror::Error;

use crate::DocId;

/// Errors raised by [`SearchEngine`](crate::SearchEngine) operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Invalid document id: {0}")]
    InvalidDocumentId(DocId),

    #[error("Word {0:?} is invalid")]
    InvalidWord(String),

    #[error("Query word {0:?} is invalid")]
    InvalidQueryWord(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(DocId),
}

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// True for errors caused by malformed caller input: bad ids, words or queries.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidDocumentId(_)
                | SearchError::InvalidWord(_)
                | SearchError::InvalidQueryWord(_)
        )
    }
}
