use rayon::prelude::*;

use crate::document::Document;
use crate::error::Result;
use crate::index::SearchEngine;

/// Run independent queries in parallel, one result list per query in input order.
///
/// Each query uses the default `Actual` predicate. The first malformed query
/// fails the whole batch.
pub fn process_queries<S>(engine: &SearchEngine, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    let results = queries
        .par_iter()
        .map(|query| engine.find_top_documents(query.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(queries = queries.len(), "processed query batch");
    Ok(results)
}

/// Like [`process_queries`] but concatenated into one list, query by query.
pub fn process_queries_joined<S>(engine: &SearchEngine, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    Ok(process_queries(engine, queries)?.into_iter().flatten().collect())
}
