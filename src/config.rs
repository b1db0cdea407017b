//! Index and search configuration.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::search::analyzer::AnalyzerKind;

/// Number of hits returned when the caller does not ask for a specific limit.
pub const DEFAULT_RESULT_LIMIT: usize = 50;

pub const DEFAULT_INDEX_DIR: &str = "./data/paper_index";

/// 50MB writer heap.
pub const DEFAULT_WRITER_HEAP: usize = 50_000_000;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub index_dir: PathBuf,
    pub analyzer: AnalyzerKind,
    pub writer_heap_bytes: usize,
    /// A single indexing thread keeps document order identical to input order.
    pub writer_threads: usize,
    pub result_limit: usize,
    /// Log indexing progress every this many documents.
    pub progress_interval: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            analyzer: AnalyzerKind::default(),
            writer_heap_bytes: DEFAULT_WRITER_HEAP,
            writer_threads: 1,
            result_limit: DEFAULT_RESULT_LIMIT,
            progress_interval: 10_000,
        }
    }
}

impl SearchConfig {
    /// Build a configuration from `PAPER_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = env::var("PAPER_INDEX_DIR") {
            config.index_dir = PathBuf::from(dir);
        }
        if let Some(analyzer) = env_value::<AnalyzerKind>("PAPER_ANALYZER")? {
            config.analyzer = analyzer;
        }
        if let Some(heap) = env_value("PAPER_WRITER_HEAP")? {
            config.writer_heap_bytes = heap;
        }
        if let Some(threads) = env_value("PAPER_WRITER_THREADS")? {
            config.writer_threads = threads;
        }
        if let Some(limit) = env_value("PAPER_RESULT_LIMIT")? {
            config.result_limit = limit;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_index_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.index_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_analyzer(mut self, analyzer: AnalyzerKind) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.writer_threads == 0 {
            return Err(Error::Config("writer_threads must be at least 1".to_string()));
        }
        if self.progress_interval == 0 {
            return Err(Error::Config("progress_interval must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn env_value<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{}={}: {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}
