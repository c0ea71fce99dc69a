//! Persona/task query types and the accepted query file shapes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of sections returned when a query does not say otherwise.
pub const DEFAULT_TOP_K: usize = 10;

/// A relevance query: who is asking, what they need, and over which documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Free-text description of the reader
    pub persona: String,

    /// Free-text description of the task
    pub job: String,

    /// Document references; `None` means every document in the input directory
    pub documents: Option<Vec<String>>,

    /// Number of sections to return
    pub top_k: usize,
}

impl Query {
    /// Create a query over all documents with the default `top_k`.
    pub fn new(persona: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            job: job.into(),
            documents: None,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Restrict the query to the given documents.
    pub fn with_documents<I, S>(mut self, documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.documents = Some(documents.into_iter().map(Into::into).collect());
        self
    }

    /// Set the number of sections to return.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// The text embedded and matched against sections.
    ///
    /// Empty parts are left out, so a bare task reads `"Task: ..."`.
    pub fn query_text(&self) -> String {
        let persona = self.persona.trim();
        let job = self.job.trim();
        let mut parts = Vec::with_capacity(2);
        if !persona.is_empty() {
            parts.push(format!("Persona: {}.", persona));
        }
        if !job.is_empty() {
            parts.push(format!("Task: {}.", job));
        }
        parts.join(" ")
    }
}

/// Parse a query file in any accepted shape.
///
/// Accepted shapes:
/// - a single object: `{"persona", "job" | "job_to_be_done", "documents"?, "top_k"?}`,
///   where persona may be `{"role": ...}`, the job `{"task": ...}` and documents
///   `{"filename": ...}` objects;
/// - `{"queries": [...]}` holding objects or bare query strings;
/// - a list of `{"query", "top_k"?, "documents"?}` objects.
pub fn parse_queries(json: &str) -> Result<Vec<Query>> {
    let file: QueryFile = serde_json::from_str(json)
        .map_err(|e| Error::InvalidQuery(format!("unrecognized query file: {}", e)))?;

    let items = match file {
        QueryFile::Batch { queries } => queries,
        QueryFile::List(items) => items,
        QueryFile::Single(raw) => vec![QueryItem::Object(raw)],
    };

    items.into_iter().map(QueryItem::into_query).collect()
}

/// Read and parse a query file.
pub fn load_queries<P: AsRef<Path>>(path: P) -> Result<Vec<Query>> {
    let json = fs::read_to_string(path)?;
    parse_queries(&json)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryFile {
    Batch { queries: Vec<QueryItem> },
    List(Vec<QueryItem>),
    Single(RawQuery),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryItem {
    Text(String),
    Object(RawQuery),
}

impl QueryItem {
    fn into_query(self) -> Result<Query> {
        match self {
            QueryItem::Text(text) => RawQuery {
                query: Some(text),
                ..RawQuery::default()
            }
            .into_query(),
            QueryItem::Object(raw) => raw.into_query(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawQuery {
    #[serde(default)]
    persona: Option<Described>,
    #[serde(default, alias = "job_to_be_done")]
    job: Option<Described>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    documents: Option<Vec<DocumentRef>>,
    #[serde(default)]
    top_k: Option<i64>,
}

impl RawQuery {
    fn into_query(self) -> Result<Query> {
        let persona = self.persona.map(Described::into_text).unwrap_or_default();
        let job = self
            .job
            .map(Described::into_text)
            .or(self.query)
            .unwrap_or_default();

        if persona.trim().is_empty() && job.trim().is_empty() {
            return Err(Error::InvalidQuery(
                "query has neither a persona nor a job".to_string(),
            ));
        }

        let top_k = match self.top_k {
            None => DEFAULT_TOP_K,
            Some(k) if k > 0 => k as usize,
            Some(k) => {
                return Err(Error::InvalidQuery(format!(
                    "top_k must be positive, got {}",
                    k
                )))
            }
        };

        Ok(Query {
            persona,
            job,
            documents: self
                .documents
                .map(|docs| docs.into_iter().map(DocumentRef::into_path).collect()),
            top_k,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Described {
    Text(String),
    Role { role: String },
    Task { task: String },
}

impl Described {
    fn into_text(self) -> String {
        match self {
            Described::Text(text) => text,
            Described::Role { role } => role,
            Described::Task { task } => task,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentRef {
    Path(String),
    File { filename: String },
}

impl DocumentRef {
    fn into_path(self) -> String {
        match self {
            DocumentRef::Path(path) => path,
            DocumentRef::File { filename } => filename,
        }
    }
}
