//! Search Papers
//!
//! Runs one query against the committed paper index and prints the ranked results.
//!
//! Usage:
//!     search_papers "generalization bounds"
//!     search_papers "author:hinton" --sort year --year-from 2010 --json

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use std::ops::Bound;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use paper_search::search::{
    AnalyzerKind, NumericField, PaperQuery, RecencyRanker, SortKey, SortOrder,
};
use paper_search::{PaperSearcher, ResultKind, SearchConfig, SearchResult};

#[derive(Parser, Debug)]
#[command(author, version, about = "Search the paper index", long_about = None)]
struct Args {
    /// Query string
    query: String,

    /// Kind of result to return (only "papers" is supported)
    #[arg(long, default_value = "papers")]
    result_type: String,

    /// Maximum number of results (defaults to PAPER_RESULT_LIMIT or 50)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Order results by relevance or by a sort field
    #[arg(long, value_enum, default_value = "relevance")]
    sort: SortBy,

    /// Ascending order when sorting by a field
    #[arg(long, default_value_t = false)]
    asc: bool,

    /// Only papers published in or after this year
    #[arg(long)]
    year_from: Option<i64>,

    /// Only papers published in or before this year
    #[arg(long)]
    year_to: Option<i64>,

    /// Boost recent papers: score * (1 + weight / (1 + age)), relative to --latest-year
    #[arg(long)]
    recency_weight: Option<f32>,

    /// Reference year for --recency-weight
    #[arg(long, default_value_t = 2017)]
    latest_year: i64,

    /// Path of the index (defaults to PAPER_INDEX_DIR or ./data/paper_index)
    #[arg(long)]
    index_path: Option<PathBuf>,

    /// Analyzer the index was built with
    #[arg(long)]
    analyzer: Option<AnalyzerKind>,

    /// Print results as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SortBy {
    Relevance,
    Year,
    PaperId,
    Title,
}

fn main() -> Result<()> {
    dotenv().ok();

    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = SearchConfig::from_env().context("Invalid PAPER_* environment")?;
    if let Some(path) = args.index_path.clone() {
        config.index_dir = path;
    }
    if let Some(analyzer) = args.analyzer {
        config.analyzer = analyzer;
    }
    let limit = args.limit.unwrap_or(config.result_limit);

    let mut searcher = PaperSearcher::open(&config)
        .with_context(|| format!("Failed to open index at {:?}", config.index_dir))?;
    if let Some(weight) = args.recency_weight {
        searcher = searcher.with_ranker(Arc::new(RecencyRanker::new(args.latest_year, weight)));
    }

    let kind = match args.result_type.parse::<ResultKind>() {
        Ok(kind) => kind,
        Err(e) => {
            warn!("{}", e);
            return print_results(&[], args.json);
        }
    };

    let results = match kind {
        ResultKind::Papers => {
            let mut query = searcher.query_builder().build(&args.query);
            // A year filter narrows a query; it never turns an empty one into a match-all
            if !query.is_match_none() && (args.year_from.is_some() || args.year_to.is_some()) {
                let range = PaperQuery::Range {
                    field: NumericField::Year,
                    lower: args.year_from.map_or(Bound::Unbounded, Bound::Included),
                    upper: args.year_to.map_or(Bound::Unbounded, Bound::Included),
                };
                query = PaperQuery::and(vec![query, range]);
            }

            let order = if args.asc {
                SortOrder::Asc
            } else {
                SortOrder::Desc
            };
            match args.sort {
                SortBy::Relevance => searcher.search(&query, limit)?,
                SortBy::Year => searcher.search_sorted(&query, limit, SortKey::Year, order)?,
                SortBy::PaperId => searcher.search_sorted(&query, limit, SortKey::PaperId, order)?,
                SortBy::Title => searcher.search_sorted(&query, limit, SortKey::Title, order)?,
            }
        }
    };

    print_results(&results, args.json)
}

fn print_results(results: &[SearchResult], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    println!("{} total matching documents.", results.len());
    for (rank, hit) in results.iter().enumerate() {
        println!(
            "{:>3}. [{:.3}] {} ({}, {})",
            rank + 1,
            hit.score,
            hit.title,
            hit.year,
            hit.event_type
        );
        if !hit.authors.is_empty() {
            println!("     {}", hit.authors.join(", "));
        }
        println!("     {}", hit.pdf_name);
    }
    Ok(())
}
