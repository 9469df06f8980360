use std::collections::BTreeSet;

use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words};

/// A parsed query: words that add relevance and words that exclude documents.
///
/// Words borrow from the raw query text. Both sets are stop-word filtered and
/// kept sorted, so iteration order is deterministic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Query<'a> {
    pub plus_words: BTreeSet<&'a str>,
    pub minus_words: BTreeSet<&'a str>,
}

struct QueryWord<'a> {
    data: &'a str,
    is_minus: bool,
    is_stop: bool,
}

fn parse_query_word<'a>(text: &'a str, stop_words: &BTreeSet<String>) -> Result<QueryWord<'a>> {
    if text.is_empty() {
        return Err(SearchError::InvalidQueryWord(text.to_string()));
    }
    let (word, is_minus) = match text.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    if word.is_empty() || word.starts_with('-') || !is_valid_word(word) {
        return Err(SearchError::InvalidQueryWord(text.to_string()));
    }
    Ok(QueryWord { data: word, is_minus, is_stop: stop_words.contains(word) })
}

/// Parse raw query text into plus and minus word sets.
///
/// Fails on a bare `-`, a double leading `-` or a word with control characters.
pub fn parse_query<'a>(text: &'a str, stop_words: &BTreeSet<String>) -> Result<Query<'a>> {
    let mut query = Query::default();
    for word in split_into_words(text) {
        let query_word = parse_query_word(word, stop_words)?;
        if query_word.is_stop {
            continue;
        }
        if query_word.is_minus {
            query.minus_words.insert(query_word.data);
        } else {
            query.plus_words.insert(query_word.data);
        }
    }
    Ok(query)
}
