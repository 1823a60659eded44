mod logging;

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};
use versemap::{BookRegistry, MappingSink, MappingStream, MemoryStore, ParseOptions, ParseSummary};
use walkdir::WalkDir;

use logging::{LogConfig, LogFormat, init_logging};

/// Mappings handed to the store per upsert call.
const BATCH_SIZE: usize = 1000;

/// File extensions picked up when a directory is given.
const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "tsv"];

#[derive(Parser)]
#[command(name = "versemap", about = "Versification mapping document parser")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Disable ANSI colors in log output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(flatten)]
    input: InputArgs,
}

#[derive(Args)]
struct InputArgs {
    /// Book registry JSON (defaults to the built-in 66-book table)
    #[arg(long, global = true)]
    books: Option<PathBuf>,

    /// Parse options JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cell delimiter, overrides the config file
    #[arg(long, global = true)]
    delimiter: Option<char>,

    /// Fallback source tradition when a document names none
    #[arg(long, global = true)]
    source_tradition: Option<String>,

    /// Fallback target tradition when a document names none
    #[arg(long, global = true)]
    target_tradition: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Parse documents → { mappings, summary } JSON
    Parse {
        /// A document, or a directory searched for .txt/.tsv documents
        path: PathBuf,
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse documents and print only the count summaries
    Stats {
        path: PathBuf,
    },
    /// List the active book registry
    Books,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(
        &LogConfig::from_verbosity(cli.verbose)
            .with_format(cli.log_format)
            .with_ansi(!cli.no_color),
    );

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let registry = load_registry(cli.input.books.as_deref())?;
    let options = load_options(&cli.input)?;

    match cli.command {
        Command::Parse { path, output } => run_parse(&path, output.as_deref(), &registry, &options),
        Command::Stats { path } => run_stats(&path, &registry, &options),
        Command::Books => run_books(&registry),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  SETUP
// ═══════════════════════════════════════════════════════════════════════

fn load_registry(path: Option<&Path>) -> Result<BookRegistry> {
    let Some(path) = path else {
        return Ok(BookRegistry::builtin());
    };
    let json = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let registry =
        BookRegistry::from_json(&json).with_context(|| format!("bad book registry {}", path.display()))?;
    info!(books = registry.len(), path = %path.display(), "loaded book registry");
    Ok(registry)
}

fn load_options(input: &InputArgs) -> Result<ParseOptions> {
    let mut options = match &input.config {
        Some(path) => ParseOptions::load(path).with_context(|| format!("bad config {}", path.display()))?,
        None => ParseOptions::default(),
    };
    if let Some(d) = input.delimiter {
        options.delimiter = d;
    }
    if let Some(t) = &input.source_tradition {
        options.default_source_tradition = t.clone();
    }
    if let Some(t) = &input.target_tradition {
        options.default_target_tradition = t.clone();
    }
    Ok(options)
}

/// A single file, or every document under a directory in path order.
fn discover_documents(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| DOCUMENT_EXTENSIONS.contains(&e))
        })
        .collect();
    files.sort();
    files
}

// ═══════════════════════════════════════════════════════════════════════
//  PARSING
// ═══════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct FileSummary {
    file: String,
    summary: ParseSummary,
}

#[derive(Serialize)]
struct ParseReport<'a> {
    files: Vec<FileSummary>,
    total: ParseSummary,
    stored: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    mappings: Option<&'a [versemap::Mapping]>,
}

/// Parse every document into one store. Any structural error aborts.
fn parse_all(
    path: &Path,
    registry: &BookRegistry,
    options: &ParseOptions,
) -> Result<(MemoryStore, Vec<FileSummary>, ParseSummary)> {
    let documents = discover_documents(path);
    if documents.is_empty() {
        anyhow::bail!("no documents found under {}", path.display());
    }

    let mut store = MemoryStore::new();
    let mut files = Vec::new();
    let mut total = ParseSummary::default();

    for doc in &documents {
        let file = File::open(doc).with_context(|| format!("cannot open {}", doc.display()))?;
        let mut stream = MappingStream::new(BufReader::new(file), registry, options.clone());

        let mut batch = Vec::with_capacity(BATCH_SIZE);
        for item in stream.by_ref() {
            batch.push(item.with_context(|| format!("cannot parse {}", doc.display()))?);
            if batch.len() == BATCH_SIZE {
                store.upsert_batch(batch.drain(..));
            }
        }
        store.upsert_batch(batch);

        let summary = stream.summary().clone();
        info!(
            file = %doc.display(),
            emitted = summary.mappings_emitted,
            dropped = summary.rows_dropped(),
            "parsed"
        );
        total.absorb(&summary);
        files.push(FileSummary {
            file: doc.display().to_string(),
            summary,
        });
    }
    Ok((store, files, total))
}

fn run_parse(path: &Path, output: Option<&Path>, registry: &BookRegistry, options: &ParseOptions) -> Result<()> {
    let (store, files, total) = parse_all(path, registry, options)?;
    let report = ParseReport {
        files,
        total,
        stored: store.len(),
        mappings: Some(store.mappings()),
    };
    write_json(output, &report)
}

fn run_stats(path: &Path, registry: &BookRegistry, options: &ParseOptions) -> Result<()> {
    let (store, files, total) = parse_all(path, registry, options)?;
    let report = ParseReport {
        files,
        total,
        stored: store.len(),
        mappings: None,
    };
    write_json(None, &report)
}

fn run_books(registry: &BookRegistry) -> Result<()> {
    let mut out = io::stdout().lock();
    for (name, abbreviations) in registry.books() {
        writeln!(out, "{name}\t{}", abbreviations.join(", "))?;
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  OUTPUT
// ═══════════════════════════════════════════════════════════════════════

fn write_json<T: Serialize>(path: Option<&Path>, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("JSON serialization failed")?;
    match path {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("cannot write {}", path.display()))?;
            info!(path = %path.display(), bytes = json.len(), "wrote report");
        }
        None => writeln!(io::stdout().lock(), "{json}")?,
    }
    Ok(())
}
