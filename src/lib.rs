//! Inverted index and ranked search over research papers joined with their authors.
//!
//! Papers are turned into multi-field tantivy documents with a concatenated
//! `content` field that unscoped queries target. Builds always replace the
//! previous index wholesale and become visible atomically at commit.
//!
//! ```no_run
//! use paper_search::{build_index, load_papers, PaperSearcher, SearchConfig};
//!
//! # fn main() -> paper_search::Result<()> {
//! let config = SearchConfig::default().with_index_dir("./data/paper_index");
//! let papers = load_papers("papers.json".as_ref())?;
//! build_index(&config, papers.values())?;
//!
//! let searcher = PaperSearcher::open(&config)?;
//! for hit in searcher.results("generalization bounds", "papers")? {
//!     println!("{} ({})", hit.title, hit.year);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod search;

pub use config::{SearchConfig, DEFAULT_RESULT_LIMIT};
pub use error::{Error, Result};
pub use models::{load_papers, Author, AuthorRecord, IntField, Paper, PaperRecord};
pub use search::{build_index, PaperIndexWriter, PaperQuery, PaperSearcher, ResultKind, SearchResult};
