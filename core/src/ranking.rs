use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::concurrent_map::ConcurrentMap;
use crate::document::{Document, DocumentStatus, ExecutionMode};
use crate::error::Result;
use crate::index::SearchEngine;
use crate::query::Query;
use crate::{DocId, Rating};

pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;
/// Relevances closer than this are ranked by rating instead.
pub const RELEVANCE_EPSILON: f64 = 1e-6;

const PLUS_PART_COUNT: usize = 4;
const MINUS_SHARD_COUNT: usize = 8;
const RELEVANCE_SHARD_COUNT: usize = 100;

impl SearchEngine {
    /// Top documents with status `Actual`.
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_by_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_by(raw_query, move |_, document_status, _| {
            document_status == status
        })
    }

    pub fn find_top_documents_by<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, Rating) -> bool + Sync,
    {
        self.find_top_documents_with(ExecutionMode::Sequential, raw_query, predicate)
    }

    /// Rank documents accepted by `predicate` against the query.
    ///
    /// Returns at most [`MAX_RESULT_DOCUMENT_COUNT`] documents, most relevant
    /// first. Both modes produce the same documents; relevances may differ in
    /// the last bits because summation order differs.
    pub fn find_top_documents_with<P>(
        &self,
        mode: ExecutionMode,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, Rating) -> bool + Sync,
    {
        let query = self.parse_query(raw_query)?;
        let relevances = match mode {
            ExecutionMode::Sequential => self.relevances_sequential(&query, &predicate),
            ExecutionMode::Parallel => self.relevances_parallel(&query, &predicate),
        };
        let candidates = relevances.len();
        let matched: Vec<Document> = relevances
            .into_iter()
            .filter_map(|(id, relevance)| {
                self.document_data(id).map(|data| Document::new(id, relevance, data.rating))
            })
            .collect();
        let top = select_top(matched, mode);

        tracing::debug!(
            plus_words = query.plus_words.len(),
            minus_words = query.minus_words.len(),
            candidates,
            returned = top.len(),
            ?mode,
            "ranked query"
        );
        Ok(top)
    }

    fn relevances_sequential<P>(&self, query: &Query<'_>, predicate: &P) -> BTreeMap<DocId, f64>
    where
        P: Fn(DocId, DocumentStatus, Rating) -> bool,
    {
        let mut document_to_relevance: BTreeMap<DocId, f64> = BTreeMap::new();
        for word in &query.plus_words {
            let Some(row) = self.word_to_document_freqs.get(*word) else {
                continue;
            };
            let idf = self.inverse_document_freq(row);
            for (&id, &term_freq) in row {
                let Some(data) = self.document_data(id) else {
                    continue;
                };
                if predicate(id, data.status, data.rating) {
                    *document_to_relevance.entry(id).or_insert(0.0) += term_freq * idf;
                }
            }
        }
        for word in &query.minus_words {
            if let Some(row) = self.word_to_document_freqs.get(*word) {
                for id in row.keys() {
                    document_to_relevance.remove(id);
                }
            }
        }
        document_to_relevance
    }

    fn relevances_parallel<P>(&self, query: &Query<'_>, predicate: &P) -> BTreeMap<DocId, f64>
    where
        P: Fn(DocId, DocumentStatus, Rating) -> bool + Sync,
    {
        let minus_ids: ConcurrentMap<DocId, ()> = ConcurrentMap::new(MINUS_SHARD_COUNT);
        query.minus_words.par_iter().for_each(|word| {
            if let Some(row) = self.word_to_document_freqs.get(*word) {
                for &id in row.keys() {
                    drop(minus_ids.access(id));
                }
            }
        });
        let excluded: BTreeSet<DocId> = minus_ids.drain().into_keys().collect();

        let plus_words: Vec<&str> = query.plus_words.iter().copied().collect();
        let part_len = plus_words.len().div_ceil(PLUS_PART_COUNT).max(1);
        let document_to_relevance: ConcurrentMap<DocId, f64> =
            ConcurrentMap::new(RELEVANCE_SHARD_COUNT);
        plus_words.par_chunks(part_len).for_each(|part| {
            tracing::trace!(words = part.len(), "ranking plus-word part");
            for word in part {
                let Some(row) = self.word_to_document_freqs.get(*word) else {
                    continue;
                };
                let idf = self.inverse_document_freq(row);
                for (&id, &term_freq) in row {
                    if excluded.contains(&id) {
                        continue;
                    }
                    let Some(data) = self.document_data(id) else {
                        continue;
                    };
                    if predicate(id, data.status, data.rating) {
                        *document_to_relevance.access(id) += term_freq * idf;
                    }
                }
            }
        });
        document_to_relevance.drain()
    }
}

/// Order by relevance descending, break near-ties by rating, keep the top few.
///
/// Each group starts at its most relevant document and takes every following
/// document less than [`RELEVANCE_EPSILON`] below it, so all pairs in a group
/// are ties. A group is reordered by rating descending.
pub(crate) fn select_top(mut documents: Vec<Document>, mode: ExecutionMode) -> Vec<Document> {
    let by_relevance = |lhs: &Document, rhs: &Document| rhs.relevance.total_cmp(&lhs.relevance);
    match mode {
        ExecutionMode::Sequential => documents.sort_by(by_relevance),
        ExecutionMode::Parallel => documents.par_sort_by(by_relevance),
    }

    let mut start = 0;
    while start < documents.len() {
        let mut end = start + 1;
        while end < documents.len()
            && documents[start].relevance - documents[end].relevance < RELEVANCE_EPSILON
        {
            end += 1;
        }
        documents[start..end].sort_by(|lhs, rhs| {
            rhs.rating.cmp(&lhs.rating).then_with(|| rhs.relevance.total_cmp(&lhs.relevance))
        });
        start = end;
    }

    documents.truncate(MAX_RESULT_DOCUMENT_COUNT);
    documents
}
