//! Tantivy full-text search module for papers.

pub mod analyzer;
pub mod document;
pub mod index;
pub mod layout;
pub mod query;
pub mod ranking;
pub mod schema;
pub mod searcher;
pub mod term_vector;

pub use analyzer::{Analyzer, AnalyzerKind};
pub use document::{compose_content, DocumentBuilder, IndexedDocument};
pub use index::{build_index, remove_index, PaperIndexWriter};
pub use query::{NumericField, PaperQuery, QueryBuilder, TextField};
pub use ranking::{Bm25Ranker, Ranker, RecencyRanker};
pub use schema::{create_paper_schema, PaperFields, PaperSchema};
pub use searcher::{PaperSearcher, ResultKind, SearchResult, SortKey, SortOrder};
pub use term_vector::{TermStats, TermVector};
