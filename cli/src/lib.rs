use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use search_core::{
    process_queries, process_queries_joined, DocId, Document, DocumentStatus, ExecutionMode, Rating,
    SearchEngine,
};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Deserialize)]
pub struct InputDoc {
    pub id: DocId,
    #[serde(alias = "body")]
    pub text: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

impl From<StatusArg> for DocumentStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Actual => DocumentStatus::Actual,
            StatusArg::Irrelevant => DocumentStatus::Irrelevant,
            StatusArg::Banned => DocumentStatus::Banned,
            StatusArg::Removed => DocumentStatus::Removed,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "search")]
#[command(about = "Index JSON/JSONL documents in memory and run TF-IDF queries", long_about = None)]
pub struct Options {
    /// Input path (file or directory of .json/.jsonl documents)
    #[arg(long)]
    pub input: PathBuf,
    /// Space-separated stop words
    #[arg(long, default_value = "")]
    pub stop_words: String,
    /// Query to run (repeatable)
    #[arg(long = "query")]
    pub queries: Vec<String>,
    /// File with one query per line
    #[arg(long)]
    pub queries_file: Option<PathBuf>,
    /// Only rank documents with this status
    #[arg(long, value_enum, default_value_t = StatusArg::Actual)]
    pub status: StatusArg,
    /// Rank, match and remove on the rayon pool
    #[arg(long, default_value_t = false)]
    pub parallel: bool,
    /// Instead of ranking, report which query words match this document
    #[arg(long)]
    pub match_doc: Option<DocId>,
    /// Remove these document ids before querying
    #[arg(long = "remove")]
    pub remove: Vec<DocId>,
    /// Run all queries as one batch and print a single flattened result list
    #[arg(long, default_value_t = false)]
    pub joined: bool,
}

impl Options {
    pub fn mode(&self) -> ExecutionMode {
        if self.parallel {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueryOutput<'a> {
    pub query: &'a str,
    pub results: Vec<Document>,
}

#[derive(Debug, Serialize)]
pub struct MatchOutput<'a> {
    pub query: &'a str,
    pub document_id: DocId,
    pub words: Vec<&'a str>,
    pub status: DocumentStatus,
}

/// Load every document, build the engine, then write one JSON line per query.
pub fn run<W: Write>(opts: &Options, out: &mut W) -> Result<()> {
    let start = Instant::now();
    let docs = load_documents(&opts.input)?;
    let mut engine = build_engine(&opts.stop_words, docs)?;
    tracing::info!(
        num_docs = engine.document_count(),
        took_ms = start.elapsed().as_millis() as u64,
        "index built"
    );

    for id in &opts.remove {
        engine.remove_document_with(opts.mode(), *id);
    }

    let mut queries = opts.queries.clone();
    if let Some(path) = &opts.queries_file {
        queries.extend(read_queries(path)?);
    }

    let start = Instant::now();
    if let Some(document_id) = opts.match_doc {
        for query in &queries {
            let (words, status) = engine.match_document_with(opts.mode(), query, document_id)?;
            let line = MatchOutput { query, document_id, words, status };
            writeln!(out, "{}", serde_json::to_string(&line)?)?;
        }
    } else if opts.joined {
        let results = process_queries_joined(&engine, &queries)?;
        writeln!(out, "{}", serde_json::to_string(&results)?)?;
    } else if opts.parallel && opts.status == StatusArg::Actual {
        for (query, results) in queries.iter().zip(process_queries(&engine, &queries)?) {
            writeln!(out, "{}", serde_json::to_string(&QueryOutput { query, results })?)?;
        }
    } else {
        let status = DocumentStatus::from(opts.status);
        for query in &queries {
            let results = engine
                .find_top_documents_with(opts.mode(), query, |_, document_status, _| {
                    document_status == status
                })?;
            writeln!(out, "{}", serde_json::to_string(&QueryOutput { query, results })?)?;
        }
    }
    tracing::info!(
        queries = queries.len(),
        took_ms = start.elapsed().as_millis() as u64,
        "queries done"
    );
    Ok(())
}

pub fn build_engine(stop_words: &str, docs: Vec<InputDoc>) -> Result<SearchEngine> {
    let mut engine = SearchEngine::with_stop_words_text(stop_words).context("invalid stop words")?;
    for doc in docs {
        engine
            .add_document(doc.id, &doc.text, doc.status, &doc.ratings)
            .with_context(|| format!("failed to index document {}", doc.id))?;
    }
    Ok(engine)
}

pub fn load_documents(input: &Path) -> Result<Vec<InputDoc>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            let ext = p.extension().and_then(|s| s.to_str());
            if p.is_file() && matches!(ext, Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        anyhow::bail!("input path {} does not exist", input.display());
    }

    let mut docs = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
    }
    tracing::debug!(num_docs = docs.len(), "documents loaded");
    Ok(docs)
}

fn read_jsonl(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("bad document in {}", file.display()))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping json file without documents"),
    }
    Ok(())
}

fn read_queries(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(text.lines().filter(|l| !l.trim().is_empty()).map(str::to_string).collect())
}
