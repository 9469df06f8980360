use rayon::prelude::*;

use crate::document::{DocumentStatus, ExecutionMode};
use crate::error::{Result, SearchError};
use crate::index::SearchEngine;
use crate::DocId;

impl SearchEngine {
    pub fn match_document<'q>(
        &self,
        raw_query: &'q str,
        document_id: DocId,
    ) -> Result<(Vec<&'q str>, DocumentStatus)> {
        self.match_document_with(ExecutionMode::Sequential, raw_query, document_id)
    }

    /// Plus words of the query present in the document, sorted, plus its status.
    ///
    /// Any minus word present in the document empties the list. Fails with
    /// [`SearchError::DocumentNotFound`] for an unknown id.
    pub fn match_document_with<'q>(
        &self,
        mode: ExecutionMode,
        raw_query: &'q str,
        document_id: DocId,
    ) -> Result<(Vec<&'q str>, DocumentStatus)> {
        let data = self
            .document_data(document_id)
            .ok_or(SearchError::DocumentNotFound(document_id))?;
        let query = self.parse_query(raw_query)?;
        let contains = |word: &str| {
            self.word_to_document_freqs
                .get(word)
                .is_some_and(|row| row.contains_key(&document_id))
        };

        let mut matched_words: Vec<&'q str> = match mode {
            ExecutionMode::Sequential => {
                if query.minus_words.iter().any(|word| contains(*word)) {
                    return Ok((Vec::new(), data.status));
                }
                query.plus_words.iter().copied().filter(|word| contains(*word)).collect()
            }
            ExecutionMode::Parallel => {
                if query.minus_words.par_iter().any(|word| contains(*word)) {
                    return Ok((Vec::new(), data.status));
                }
                let mut words: Vec<&'q str> =
                    query.plus_words.par_iter().copied().filter(|word| contains(*word)).collect();
                words.par_sort_unstable();
                words
            }
        };
        matched_words.dedup();
        matched_words.retain(|word| !word.is_empty());

        Ok((matched_words, data.status))
    }
}
