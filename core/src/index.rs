use rayon::prelude::*;
use std::collections::{btree_set, BTreeMap, BTreeSet};

use crate::document::{DocumentStatus, ExecutionMode};
use crate::error::{Result, SearchError};
use crate::query::{parse_query, Query};
use crate::tokenizer::{is_valid_word, split_into_words};
use crate::{DocId, Rating};

#[derive(Debug, Clone, Copy)]
pub(crate) struct DocumentData {
    pub(crate) rating: Rating,
    pub(crate) status: DocumentStatus,
}

/// Document store with a forward and an inverted index kept in lockstep.
///
/// The maps are not internally synchronized: `add_document` and
/// `remove_document` take `&mut self`, so the borrow checker keeps them from
/// overlapping with readers.
#[derive(Debug, Default)]
pub struct SearchEngine {
    stop_words: BTreeSet<String>,
    pub(crate) word_to_document_freqs: BTreeMap<String, BTreeMap<DocId, f64>>,
    pub(crate) document_to_word_freqs: BTreeMap<DocId, BTreeMap<String, f64>>,
    pub(crate) documents: BTreeMap<DocId, DocumentData>,
    document_ids: BTreeSet<DocId>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine with a fixed stop-word set. Empty words are skipped.
    pub fn with_stop_words<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words = BTreeSet::new();
        for word in stop_words {
            let word = word.as_ref();
            if word.is_empty() {
                continue;
            }
            if !is_valid_word(word) {
                return Err(SearchError::InvalidWord(word.to_string()));
            }
            words.insert(word.to_string());
        }
        Ok(Self { stop_words: words, ..Self::default() })
    }

    /// Build an engine from space-separated stop words.
    pub fn with_stop_words_text(text: &str) -> Result<Self> {
        Self::with_stop_words(split_into_words(text))
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    pub fn parse_query<'a>(&self, text: &'a str) -> Result<Query<'a>> {
        parse_query(text, &self.stop_words)
    }

    fn split_into_words_no_stop<'a>(&self, text: &'a str) -> Result<Vec<&'a str>> {
        let mut words = Vec::new();
        for word in split_into_words(text) {
            if !is_valid_word(word) {
                return Err(SearchError::InvalidWord(word.to_string()));
            }
            if !self.is_stop_word(word) {
                words.push(word);
            }
        }
        Ok(words)
    }

    /// Index a document. Nothing is written unless every word is valid.
    pub fn add_document(
        &mut self,
        document_id: DocId,
        document: &str,
        status: DocumentStatus,
        ratings: &[Rating],
    ) -> Result<()> {
        if document_id < 0 || self.documents.contains_key(&document_id) {
            return Err(SearchError::InvalidDocumentId(document_id));
        }
        let words = self.split_into_words_no_stop(document)?;

        let mut word_freqs: BTreeMap<String, f64> = BTreeMap::new();
        if !words.is_empty() {
            let inv_word_count = 1.0 / words.len() as f64;
            for word in &words {
                *word_freqs.entry(word.to_string()).or_insert(0.0) += inv_word_count;
            }
        }
        for (word, freq) in &word_freqs {
            self.word_to_document_freqs
                .entry(word.clone())
                .or_default()
                .insert(document_id, *freq);
        }
        let unique_words = word_freqs.len();
        self.document_to_word_freqs.insert(document_id, word_freqs);
        let rating = compute_average_rating(ratings);
        self.documents.insert(document_id, DocumentData { rating, status });
        self.document_ids.insert(document_id);

        tracing::debug!(document_id, words = words.len(), unique_words, rating, "document added");
        Ok(())
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Ids of all indexed documents in ascending order.
    pub fn iter(&self) -> btree_set::Iter<'_, DocId> {
        self.document_ids.iter()
    }

    /// Term frequencies of one document, or an empty map for an unknown id.
    pub fn word_frequencies(&self, document_id: DocId) -> BTreeMap<String, f64> {
        self.document_to_word_freqs.get(&document_id).cloned().unwrap_or_default()
    }

    pub fn remove_document(&mut self, document_id: DocId) {
        self.remove_document_with(ExecutionMode::Sequential, document_id)
    }

    /// Drop a document from both indexes. Unknown ids are ignored.
    pub fn remove_document_with(&mut self, mode: ExecutionMode, document_id: DocId) {
        let Some(word_freqs) = self.document_to_word_freqs.remove(&document_id) else {
            return;
        };
        let word_count = word_freqs.len();
        match mode {
            ExecutionMode::Sequential => {
                for word in word_freqs.keys() {
                    if let Some(row) = self.word_to_document_freqs.get_mut(word) {
                        row.remove(&document_id);
                        if row.is_empty() {
                            self.word_to_document_freqs.remove(word);
                        }
                    }
                }
            }
            ExecutionMode::Parallel => {
                // Rows are independent: detach, prune in parallel, reinsert the non-empty ones.
                let rows: Vec<(String, BTreeMap<DocId, f64>)> = word_freqs
                    .into_keys()
                    .filter_map(|word| self.word_to_document_freqs.remove_entry(&word))
                    .collect();
                let rows: Vec<(String, BTreeMap<DocId, f64>)> = rows
                    .into_par_iter()
                    .filter_map(|(word, mut row)| {
                        row.remove(&document_id);
                        (!row.is_empty()).then_some((word, row))
                    })
                    .collect();
                self.word_to_document_freqs.extend(rows);
            }
        }
        self.documents.remove(&document_id);
        self.document_ids.remove(&document_id);

        tracing::debug!(document_id, words = word_count, ?mode, "document removed");
    }

    pub(crate) fn document_data(&self, document_id: DocId) -> Option<DocumentData> {
        self.documents.get(&document_id).copied()
    }

    pub(crate) fn inverse_document_freq(&self, row: &BTreeMap<DocId, f64>) -> f64 {
        (self.document_count() as f64 / row.len() as f64).ln()
    }
}

impl<'a> IntoIterator for &'a SearchEngine {
    type Item = &'a DocId;
    type IntoIter = btree_set::Iter<'a, DocId>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Integer-truncated mean of the ratings, 0 when there are none.
fn compute_average_rating(ratings: &[Rating]) -> Rating {
    if ratings.is_empty() {
        return 0;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    (sum / ratings.len() as i64) as Rating
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SearchEngine {
        let mut engine = SearchEngine::with_stop_words_text("and in on").unwrap();
        engine
            .add_document(1, "white cat and fashionable collar", DocumentStatus::Actual, &[8, -3])
            .unwrap();
        engine
            .add_document(2, "fluffy cat fluffy tail", DocumentStatus::Actual, &[7, 2, 7])
            .unwrap();
        engine
            .add_document(3, "groomed dog expressive eyes", DocumentStatus::Banned, &[5, -12, 2, 1])
            .unwrap();
        engine
    }

    fn assert_indexes_in_sync(engine: &SearchEngine) {
        for (id, words) in &engine.document_to_word_freqs {
            for (word, freq) in words {
                assert_eq!(engine.word_to_document_freqs[word][id], *freq);
            }
        }
        for (word, row) in &engine.word_to_document_freqs {
            assert!(!row.is_empty(), "empty row left for {word}");
            for id in row.keys() {
                assert!(engine.document_to_word_freqs[id].contains_key(word));
            }
        }
    }

    #[test]
    fn frequencies_sum_to_one() {
        let engine = engine();
        let freqs = engine.word_frequencies(2);
        assert_eq!(freqs.len(), 3);
        assert!((freqs["fluffy"] - 0.5).abs() < 1e-12);
        assert!((freqs["cat"] - 0.25).abs() < 1e-12);
        assert!((freqs.values().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(!engine.word_frequencies(1).contains_key("and"));
        assert_indexes_in_sync(&engine);
    }

    #[test]
    fn average_rating_truncates() {
        assert_eq!(compute_average_rating(&[]), 0);
        assert_eq!(compute_average_rating(&[7, 2, 7]), 5);
        assert_eq!(compute_average_rating(&[5, -12, 2, 1]), -1);
        assert_eq!(compute_average_rating(&[i32::MAX, i32::MAX]), i32::MAX);
    }

    #[test]
    fn rejects_bad_ids() {
        let mut engine = engine();
        assert_eq!(
            engine.add_document(-1, "cat", DocumentStatus::Actual, &[]),
            Err(SearchError::InvalidDocumentId(-1))
        );
        assert_eq!(
            engine.add_document(2, "cat", DocumentStatus::Actual, &[]),
            Err(SearchError::InvalidDocumentId(2))
        );
        assert_eq!(engine.document_count(), 3);
    }

    #[test]
    fn invalid_word_leaves_index_untouched() {
        let mut engine = engine();
        let before = engine.word_to_document_freqs.clone();
        let err = engine
            .add_document(4, "brand new\tcat", DocumentStatus::Actual, &[1])
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(engine.word_to_document_freqs, before);
        assert_eq!(engine.document_count(), 3);
        assert!(engine.word_frequencies(4).is_empty());
    }

    #[test]
    fn invalid_stop_word() {
        let err = SearchEngine::with_stop_words(["in", "th\u{1f}e"]).unwrap_err();
        assert_eq!(err, SearchError::InvalidWord("th\u{1f}e".into()));
        let engine = SearchEngine::with_stop_words(vec!["", "in", "in"]).unwrap();
        assert!(engine.is_stop_word("in"));
        assert!(!engine.is_stop_word(""));
    }

    #[test]
    fn empty_document_is_counted() {
        let mut engine = SearchEngine::with_stop_words_text("and").unwrap();
        engine.add_document(0, "  and  ", DocumentStatus::Actual, &[]).unwrap();
        assert_eq!(engine.document_count(), 1);
        assert!(engine.word_frequencies(0).is_empty());
        assert_eq!(engine.iter().copied().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn remove_keeps_shared_rows() {
        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            let mut engine = engine();
            engine.remove_document_with(mode, 2);
            assert_eq!(engine.document_count(), 2);
            assert!(engine.word_frequencies(2).is_empty());
            assert!(!engine.word_to_document_freqs.contains_key("fluffy"));
            let cat_ids: Vec<DocId> =
                engine.word_to_document_freqs["cat"].keys().copied().collect();
            assert_eq!(cat_ids, vec![1]);
            assert_eq!((&engine).into_iter().copied().collect::<Vec<_>>(), vec![1, 3]);
            assert_indexes_in_sync(&engine);
        }
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut engine = engine();
        let before = engine.word_to_document_freqs.clone();
        engine.remove_document(42);
        engine.remove_document_with(ExecutionMode::Parallel, -5);
        assert_eq!(engine.word_to_document_freqs, before);
        assert_eq!(engine.document_count(), 3);
    }

    #[test]
    fn id_can_be_reused_after_removal() {
        let mut engine = engine();
        engine.remove_document(1);
        engine.add_document(1, "black dog", DocumentStatus::Irrelevant, &[]).unwrap();
        let words: Vec<String> = engine.word_frequencies(1).into_keys().collect();
        assert_eq!(words, vec!["black", "dog"]);
        assert_indexes_in_sync(&engine);
    }
}
