//! Batch processing over a directory of documents.
//!
//! [`OutlinePipeline`] turns document files into outlines, optionally in
//! parallel. [`RelevancePipeline`] adds section segmentation and ranking to
//! produce one [`RelevanceReport`] per query.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::analysis::{segment_sections, OutlineBuilder};
use crate::error::Result;
use crate::model::{DocumentOutline, Query, RelevanceReport, ReportMetadata, Span};
use crate::rank::{CandidateSection, Embedder, RankOptions, RelevanceRanker};
use crate::source::SourceRegistry;

/// Query file names looked up in an input directory, in priority order.
pub const QUERY_FILE_NAMES: [&str; 2] = ["challenge1b_input.json", "queries.json"];

/// File name of the relevance report.
pub const OUTPUT_FILE_NAME: &str = "challenge1b_output.json";

/// Subdirectories searched when an input directory holds no documents itself.
pub const DOCUMENT_SUBDIRS: [&str; 2] = ["PDFs", "pdfs"];

/// Supported document files in a directory, sorted by file name.
///
/// A missing directory yields an empty list.
pub fn list_documents(dir: &Path, registry: &SourceRegistry) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("input directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && registry.supports(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Supported documents of an input directory.
///
/// When the directory itself holds none, the first of its [`DOCUMENT_SUBDIRS`]
/// that does is used instead.
pub fn find_documents(input_dir: &Path, registry: &SourceRegistry) -> Result<Vec<PathBuf>> {
    let paths = list_documents(input_dir, registry)?;
    if !paths.is_empty() {
        return Ok(paths);
    }
    for subdir in DOCUMENT_SUBDIRS {
        let dir = input_dir.join(subdir);
        let nested = list_documents(&dir, registry)?;
        if !nested.is_empty() {
            debug!("using documents from {}", dir.display());
            return Ok(nested);
        }
    }
    Ok(Vec::new())
}

/// Resolve query document references to existing files.
///
/// A reference naming an existing file is kept as is; otherwise it is looked
/// up relative to `input_dir`, then inside its [`DOCUMENT_SUBDIRS`].
/// References that resolve to nothing are dropped.
pub fn resolve_documents<S: AsRef<str>>(input_dir: &Path, refs: &[S]) -> Vec<PathBuf> {
    let mut resolved = Vec::with_capacity(refs.len());
    for reference in refs {
        let reference = reference.as_ref();
        let direct = Path::new(reference);
        let found = if direct.is_file() {
            Some(direct.to_path_buf())
        } else {
            std::iter::once(input_dir.to_path_buf())
                .chain(DOCUMENT_SUBDIRS.iter().map(|sub| input_dir.join(sub)))
                .map(|dir| dir.join(reference))
                .find(|candidate| candidate.is_file())
        };
        match found {
            Some(path) => resolved.push(path),
            None => debug!("dropping unresolved document reference {:?}", reference),
        }
    }
    resolved
}

/// Locate the query file of an input directory.
pub fn find_query_file(dir: &Path) -> Result<Option<PathBuf>> {
    for name in QUERY_FILE_NAMES {
        let path = dir.join(name);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => return Ok(Some(path)),
            Ok(_) => continue,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(None)
}

/// Current UTC time in the report timestamp format.
pub fn timestamp_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// File name used to identify a document in reports.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Spans and outline of one document.
#[derive(Debug, Clone)]
pub struct AnalyzedDocument {
    /// Source file
    pub path: PathBuf,
    /// Extracted spans
    pub spans: Vec<Span>,
    /// Inferred outline
    pub outline: DocumentOutline,
}

impl AnalyzedDocument {
    /// File name of the document.
    pub fn name(&self) -> String {
        document_name(&self.path)
    }
}

/// Extraction and outline building for a set of documents.
#[derive(Debug, Clone)]
pub struct OutlinePipeline {
    registry: SourceRegistry,
    builder: OutlineBuilder,
    parallel: bool,
}

impl OutlinePipeline {
    /// Create a pipeline with the default sources and outline builder.
    pub fn new() -> Self {
        Self {
            registry: SourceRegistry::with_defaults(),
            builder: OutlineBuilder::new(),
            parallel: true,
        }
    }

    /// Use a custom source registry.
    pub fn with_registry(mut self, registry: SourceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Use a custom outline builder.
    pub fn with_builder(mut self, builder: OutlineBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Process documents in parallel (default) or sequentially.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The source registry.
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// The outline builder.
    pub fn builder(&self) -> &OutlineBuilder {
        &self.builder
    }

    /// Extract and outline one document.
    pub fn analyze(&self, path: &Path) -> Result<AnalyzedDocument> {
        let spans = self.registry.extract(path)?;
        let outline = self.builder.build(&spans);
        info!(
            "{}: {} spans, {} headings",
            path.display(),
            spans.len(),
            outline.outline.len()
        );
        Ok(AnalyzedDocument {
            path: path.to_path_buf(),
            spans,
            outline,
        })
    }

    /// Outline every document, keeping input order.
    pub fn build_outlines(&self, paths: &[PathBuf]) -> Vec<(PathBuf, Result<DocumentOutline>)> {
        self.build_outlines_with(paths, |_| {})
    }

    /// Outline every document, calling `on_done` as each one finishes.
    ///
    /// `on_done` runs on the worker that processed the document, failures
    /// included, so completion order is not input order.
    pub fn build_outlines_with<F>(
        &self,
        paths: &[PathBuf],
        on_done: F,
    ) -> Vec<(PathBuf, Result<DocumentOutline>)>
    where
        F: Fn(&Path) + Sync,
    {
        self.map_documents(paths, |path| {
            let outline = self.analyze(path).map(|doc| doc.outline);
            on_done(path);
            (path.to_path_buf(), outline)
        })
    }

    /// Analyze every document, logging and skipping the ones that fail.
    pub fn analyze_all(&self, paths: &[PathBuf]) -> Vec<AnalyzedDocument> {
        self.map_documents(paths, |path| self.analyze(path))
            .into_iter()
            .zip(paths)
            .filter_map(|(result, path)| match result {
                Ok(doc) => Some(doc),
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    None
                }
            })
            .collect()
    }

    fn map_documents<T, F>(&self, paths: &[PathBuf], f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Path) -> T + Sync,
    {
        if self.parallel {
            paths.par_iter().map(|p| f(p.as_path())).collect()
        } else {
            paths.iter().map(|p| f(p.as_path())).collect()
        }
    }
}

impl Default for OutlinePipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Relevance ranking of a directory's sections against a query.
///
/// # Example
///
/// ```no_run
/// use docoutline::collection::RelevancePipeline;
/// use docoutline::rank::HashingEmbedder;
/// use docoutline::Query;
/// use std::path::Path;
///
/// let embedder = HashingEmbedder::new();
/// let pipeline = RelevancePipeline::new(&embedder);
/// let query = Query::new("Travel planner", "Plan a trip of 4 days");
/// let report = pipeline.process(&query, Path::new("input"))?;
/// println!("{} sections", report.extracted_sections.len());
/// # Ok::<(), docoutline::Error>(())
/// ```
pub struct RelevancePipeline<E: Embedder> {
    outlines: OutlinePipeline,
    ranker: RelevanceRanker<E>,
}

impl<E: Embedder> RelevancePipeline<E> {
    /// Create a pipeline with default options.
    pub fn new(embedder: E) -> Self {
        Self::with_options(embedder, RankOptions::default())
    }

    /// Create a pipeline with custom ranking options.
    pub fn with_options(embedder: E, options: RankOptions) -> Self {
        Self {
            outlines: OutlinePipeline::new(),
            ranker: RelevanceRanker::with_options(embedder, options),
        }
    }

    /// Use a custom outline pipeline.
    pub fn with_outline_pipeline(mut self, outlines: OutlinePipeline) -> Self {
        self.outlines = outlines;
        self
    }

    /// The outline pipeline.
    pub fn outlines(&self) -> &OutlinePipeline {
        &self.outlines
    }

    /// Rank the sections of the query's documents, stamped with the current time.
    pub fn process(&self, query: &Query, input_dir: &Path) -> Result<RelevanceReport> {
        self.process_at(query, input_dir, timestamp_now())
    }

    /// Rank the sections of the query's documents with a fixed timestamp.
    ///
    /// Documents come from the query's references, or from [`find_documents`]
    /// when it names none. Documents that fail extraction are skipped.
    /// Embedding failures abort the query.
    pub fn process_at(
        &self,
        query: &Query,
        input_dir: &Path,
        processed_at: impl Into<String>,
    ) -> Result<RelevanceReport> {
        let paths = match &query.documents {
            Some(refs) => resolve_documents(input_dir, refs),
            None => find_documents(input_dir, self.outlines.registry())?,
        };
        info!("ranking {} documents for {:?}", paths.len(), query.job);

        let documents = self.outlines.analyze_all(&paths);
        let candidates: Vec<CandidateSection> = documents
            .iter()
            .flat_map(|doc| {
                let name = doc.name();
                segment_sections(&doc.spans, &doc.outline)
                    .into_iter()
                    .map(move |section| CandidateSection::new(name.clone(), section))
            })
            .collect();

        let ranking = self.ranker.rank(query, &candidates)?;

        Ok(RelevanceReport {
            metadata: ReportMetadata {
                input_documents: paths.iter().map(|p| document_name(p)).collect(),
                persona: query.persona.clone(),
                job_to_be_done: query.job.clone(),
                processed_at: processed_at.into(),
            },
            extracted_sections: ranking.results,
            subsection_analysis: ranking.refined,
        })
    }
}
