//! Build Paper Search Index
//!
//! Indexes every paper in an exported mapping of id -> paper record into the
//! Tantivy full-text search index, replacing the previous index in one commit.
//!
//! Usage:
//!     build_search_index --input papers.json
//!     build_search_index --input papers.yaml --index-path ./data/paper_index --analyzer standard

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use paper_search::search::{remove_index, AnalyzerKind, PaperIndexWriter};
use paper_search::{load_papers, SearchConfig};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Build the paper search index from an exported paper mapping",
    long_about = "Indexes all papers (with their authors) into a Tantivy full-text search index.\n\
                  The new index replaces the old one only once every paper has been written."
)]
struct Args {
    /// JSON or YAML file mapping paper id to paper record
    #[arg(short, long)]
    input: PathBuf,

    /// Path for the index (defaults to PAPER_INDEX_DIR or ./data/paper_index)
    #[arg(long)]
    index_path: Option<PathBuf>,

    /// Analyzer used for every text field (whitespace, standard)
    #[arg(long)]
    analyzer: Option<AnalyzerKind>,

    /// Writer heap size in bytes
    #[arg(long)]
    heap_size: Option<usize>,

    /// Indexing threads (1 keeps document order identical to input order)
    #[arg(long)]
    threads: Option<usize>,

    /// Delete every generation, committed or not, before building (refused while another build runs)
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = SearchConfig::from_env().context("Invalid PAPER_* environment")?;
    if let Some(path) = args.index_path {
        config.index_dir = path;
    }
    if let Some(analyzer) = args.analyzer {
        config.analyzer = analyzer;
    }
    if let Some(heap) = args.heap_size {
        config.writer_heap_bytes = heap;
    }
    if let Some(threads) = args.threads {
        config.writer_threads = threads;
    }

    // Force rebuild if requested
    if args.force {
        remove_index(&config.index_dir)?;
    }

    let papers = load_papers(&args.input)
        .with_context(|| format!("Failed to load papers from {:?}", args.input))?;
    info!("Total papers to index: {}", papers.len());

    let mut writer =
        PaperIndexWriter::open(&config).context("Failed to open index for writing")?;

    for (key, record) in &papers {
        writer
            .add_paper(record)
            .with_context(|| format!("Paper '{}' is invalid; nothing was committed", key))?;
    }

    let indexed = writer.commit().context("Failed to commit index")?;

    info!(
        "Done: {} papers indexed to {:?} using the {} analyzer",
        indexed, config.index_dir, config.analyzer
    );

    Ok(())
}
