//! docoutline CLI - PDF heading outlines and persona-driven section ranking

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docoutline::collection::{document_name, find_documents, find_query_file, OUTPUT_FILE_NAME};
use docoutline::model::load_queries;
use docoutline::rank::DEFAULT_MODEL_ID;
use docoutline::render::{to_json, write_json};
use docoutline::source::PdfSpanExtractor;
use docoutline::{
    Embedder, ExtractOptions, HashingEmbedder, JsonFormat, MiniLmEmbedder, OutlinePipeline,
    Outliner, PageSelection, RelevancePipeline, SourceRegistry,
};

/// Suffixes stripped from document names when naming outline files.
const DOCUMENT_SUFFIXES: [&str; 2] = [".spans.json", ".pdf"];

#[derive(Parser)]
#[command(name = "docoutline")]
#[command(author = "iyulab")]
#[command(version)]
#[command(
    about = "Infer PDF heading outlines and rank sections for a persona and task",
    long_about = None
)]
struct Cli {
    /// Directory holding the documents and the query file
    #[arg(long, env = "INPUT_DIR", default_value = "input", global = true)]
    input_dir: PathBuf,

    /// Directory receiving the JSON output
    #[arg(long, env = "OUTPUT_DIR", default_value = "output", global = true)]
    output_dir: PathBuf,

    /// Embedding model: a Hugging Face model id or a local checkpoint directory
    #[arg(long, env = "DOCOUTLINE_MODEL", default_value = DEFAULT_MODEL_ID, global = true)]
    model: String,

    /// Rank with the offline hashing embedder instead of the model
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer the title and heading outline of a document or directory
    Outline {
        /// Input document or directory
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory (a single file goes to stdout and a directory
        /// to --output-dir if not specified)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Disable the form gate
        #[arg(long)]
        no_forms: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Rank document sections against the query file
    Rank {
        /// Query file (looked up in the input directory if not specified)
        #[arg(short, long, value_name = "FILE")]
        query: Option<PathBuf>,

        /// Override the number of sections per query
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Outline every document, then rank if a query file is present
    Run,

    /// Dump the spans extracted from a document
    Spans {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Outline {
            input,
            output,
            compact,
            no_forms,
            pages,
        }) => cmd_outline(
            &input,
            output.as_deref(),
            &cli.output_dir,
            compact,
            no_forms,
            pages.as_deref(),
        ),
        Some(Commands::Rank { query, top_k }) => {
            let embedder = load_embedder(&cli.model, cli.offline);
            cmd_rank(
                &cli.input_dir,
                &cli.output_dir,
                query.as_deref(),
                top_k,
                embedder.as_ref(),
            )
        }
        Some(Commands::Spans { input, pages }) => cmd_spans(&input, pages.as_deref()),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        Some(Commands::Run) | None => {
            cmd_run(&cli.input_dir, &cli.output_dir, &cli.model, cli.offline)
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn parse_pages(pages: Option<&str>) -> Result<PageSelection, String> {
    match pages {
        Some(p) => PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e)),
        None => Ok(PageSelection::All),
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

/// Outline file name for a document: `report.pdf` becomes `report.json`.
fn outline_file_name(path: &Path) -> String {
    let name = document_name(path);
    let lower = name.to_lowercase();
    let stem = DOCUMENT_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .map(|suffix| &name[..name.len() - suffix.len()])
        .unwrap_or(name.as_str());
    format!("{}.json", stem)
}

fn progress_bar(len: usize) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// The sentence embedding model, or the hashing embedder when it is
/// disabled or cannot be loaded.
fn load_embedder(model: &str, offline: bool) -> Box<dyn Embedder> {
    if offline {
        log::info!("using the hashing embedder");
        return Box::new(HashingEmbedder::new());
    }
    match MiniLmEmbedder::load(model) {
        Ok(embedder) => Box::new(embedder),
        Err(e) => {
            log::warn!("cannot load embedding model {}: {}", model, e);
            eprintln!(
                "{} embedding model unavailable, falling back to the hashing embedder",
                "Warning:".yellow()
            );
            Box::new(HashingEmbedder::new())
        }
    }
}

fn cmd_outline(
    input: &Path,
    output: Option<&Path>,
    default_output_dir: &Path,
    compact: bool,
    no_forms: bool,
    pages: Option<&str>,
) -> CliResult {
    let mut outliner = Outliner::new().lenient().with_pages(parse_pages(pages)?);
    if no_forms {
        outliner = outliner.without_form_detection();
    }
    let format = json_format(compact);

    if input.is_dir() {
        let output_dir = output.unwrap_or(default_output_dir);
        write_outlines(&outliner.pipeline(), input, output_dir, format)?;
        return Ok(());
    }

    let outline = outliner.outline(input)?;
    match output {
        Some(dir) => {
            let path = dir.join(outline_file_name(input));
            write_json(&path, &outline, format)?;
            println!("{} {}", "Saved to".green(), path.display());
        }
        None => println!("{}", to_json(&outline, format)?),
    }

    Ok(())
}

/// Outline every supported document of a directory into `<stem>.json` files.
///
/// Documents that fail extraction are reported and skipped.
fn write_outlines(
    pipeline: &OutlinePipeline,
    input_dir: &Path,
    output_dir: &Path,
    format: JsonFormat,
) -> Result<usize, Box<dyn std::error::Error>> {
    let paths = find_documents(input_dir, pipeline.registry())?;
    if paths.is_empty() {
        println!(
            "{} {}",
            "No documents found in".yellow(),
            input_dir.display()
        );
        return Ok(0);
    }

    fs::create_dir_all(output_dir)?;
    let pb = progress_bar(paths.len())?;
    pb.set_message("Building outlines...");

    let mut written = 0;
    for (path, result) in pipeline.build_outlines_with(&paths, |_| pb.inc(1)) {
        match result {
            Ok(outline) => {
                write_json(&output_dir.join(outline_file_name(&path)), &outline, format)?;
                written += 1;
            }
            Err(e) => pb.println(format!(
                "{} {}: {}",
                "Skipped".yellow(),
                document_name(&path),
                e
            )),
        }
    }

    pb.finish_with_message("Done!");
    println!(
        "{} {} of {} outlines written to {}",
        "Done!".green().bold(),
        written,
        paths.len(),
        output_dir.display()
    );
    Ok(written)
}

/// Report path for the `index`-th of `total` queries.
fn report_path(output_dir: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return output_dir.join(OUTPUT_FILE_NAME);
    }
    let stem = OUTPUT_FILE_NAME.trim_end_matches(".json");
    output_dir.join(format!("{}_{}.json", stem, index + 1))
}

fn cmd_rank(
    input_dir: &Path,
    output_dir: &Path,
    query: Option<&Path>,
    top_k: Option<usize>,
    embedder: &dyn Embedder,
) -> CliResult {
    let query_file = match query {
        Some(path) => Some(path.to_path_buf()),
        None => find_query_file(input_dir)?,
    };
    let Some(query_file) = query_file else {
        log::info!("no query file in {}", input_dir.display());
        println!(
            "{} {}",
            "No query file found in".yellow(),
            input_dir.display()
        );
        return Ok(());
    };

    let mut queries = load_queries(&query_file)?;
    if let Some(k) = top_k.filter(|&k| k > 0) {
        for query in &mut queries {
            query.top_k = k;
        }
    }

    let pipeline = RelevancePipeline::new(embedder);
    fs::create_dir_all(output_dir)?;

    let total = queries.len();
    for (index, query) in queries.iter().enumerate() {
        let report = pipeline.process(query, input_dir)?;
        let path = report_path(output_dir, index, total);
        write_json(&path, &report, JsonFormat::Pretty)?;
        println!(
            "{} {} sections -> {}",
            "Ranked".green(),
            report.extracted_sections.len(),
            path.display()
        );
    }

    Ok(())
}

fn cmd_run(input_dir: &Path, output_dir: &Path, model: &str, offline: bool) -> CliResult {
    write_outlines(&OutlinePipeline::new(), input_dir, output_dir, JsonFormat::Pretty)?;
    if find_query_file(input_dir)?.is_none() {
        println!(
            "{} {}",
            "No query file found in".yellow(),
            input_dir.display()
        );
        return Ok(());
    }
    let embedder = load_embedder(model, offline);
    cmd_rank(input_dir, output_dir, None, None, embedder.as_ref())
}

fn cmd_spans(input: &Path, pages: Option<&str>) -> CliResult {
    let options = ExtractOptions::new().lenient().with_pages(parse_pages(pages)?);
    let mut registry = SourceRegistry::with_defaults();
    registry.register(Arc::new(PdfSpanExtractor::with_options(options)));
    let spans = registry.extract(input)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &spans)?;
    writeln!(out)?;
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docoutline".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF heading outlines and persona-driven section ranking");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/docoutline".dimmed());
    println!("License: MIT");
}
