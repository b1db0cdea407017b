//! Tantivy index management: the scoped single-writer build session.

use std::path::Path;

use tantivy::directory::{DirectoryLock, MmapDirectory};
use tantivy::{Index, IndexWriter};
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::models::PaperRecord;
use crate::search::analyzer::{Analyzer, AnalyzerKind};
use crate::search::document::DocumentBuilder;
use crate::search::layout::IndexLayout;
use crate::search::schema::{content_tokenizer, PaperFields, PaperSchema};

/// Open the committed index under `index_dir` for reading.
///
/// Registers the configured analyzer and refuses an index whose `content`
/// field was tokenized by a different one.
pub fn open_committed(index_dir: &Path, analyzer: AnalyzerKind) -> Result<(Index, PaperSchema)> {
    let layout = IndexLayout::new(index_dir);
    let dir = layout.committed_dir()?;

    let index = Index::open_in_dir(&dir).map_err(|e| Error::index_io(&dir, e))?;
    let schema = index.schema();

    let found = content_tokenizer(&schema).unwrap_or_default();
    if found != analyzer.tokenizer_name() {
        return Err(Error::AnalyzerMismatch {
            expected: analyzer.to_string(),
            found: AnalyzerKind::from_tokenizer_name(&found)
                .map(|kind| kind.to_string())
                .unwrap_or(found),
        });
    }

    let fields = PaperFields::resolve(&schema).map_err(|e| Error::index_io(&dir, e))?;
    let paper_schema = PaperSchema {
        schema,
        fields,
        analyzer: Analyzer::new(analyzer),
    };
    paper_schema.analyzer.register(&index);

    Ok((index, paper_schema))
}

/// A write session over one index directory.
///
/// Holds the directory's writer lock for its whole life. Documents added here
/// are invisible to readers until [`PaperIndexWriter::commit`]; dropping the
/// session without committing discards them and leaves the previous index in place.
pub struct PaperIndexWriter {
    layout: IndexLayout,
    directory: MmapDirectory,
    generation: u64,
    writer: IndexWriter,
    documents: DocumentBuilder,
    staged: usize,
    progress_interval: usize,
    _lock: DirectoryLock,
}

impl PaperIndexWriter {
    /// Lock the index directory and start a fresh build (create mode).
    pub fn open(config: &SearchConfig) -> Result<Self> {
        config.validate()?;

        let layout = IndexLayout::new(&config.index_dir);
        let directory = layout.directory()?;
        let lock = layout.lock_writer(&directory)?;

        layout.remove_abandoned()?;
        let generation = layout.generations()?.last().copied().unwrap_or(0) + 1;
        let generation_dir = layout.generation_dir(generation);

        std::fs::create_dir_all(&generation_dir)
            .map_err(|e| Error::index_io(&generation_dir, e))?;

        let paper_schema = PaperSchema::new(config.analyzer);
        let index = Index::create_in_dir(&generation_dir, paper_schema.schema.clone())
            .map_err(|e| Error::index_io(&generation_dir, e))?;
        paper_schema.analyzer.register(&index);

        let writer: IndexWriter = index
            .writer_with_num_threads(config.writer_threads, config.writer_heap_bytes)
            .map_err(|e| Error::index_io(&generation_dir, e))?;

        info!(
            "Index writer ready at {:?} (generation {}, analyzer {})",
            config.index_dir, generation, config.analyzer
        );

        Ok(Self {
            layout,
            directory,
            generation,
            writer,
            documents: DocumentBuilder::new(&paper_schema),
            staged: 0,
            progress_interval: config.progress_interval,
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        self.layout.root()
    }

    /// Number of documents staged so far.
    pub fn staged(&self) -> usize {
        self.staged
    }

    /// Validate and stage one paper.
    pub fn add_paper(&mut self, record: &PaperRecord) -> Result<()> {
        let document = self.documents.build(record)?;
        debug!("Staging paper {}", document.paper_id);

        self.writer
            .add_document(document.into_document())
            .map_err(|e| Error::index_io(self.layout.root(), e))?;
        self.staged += 1;

        if self.staged % self.progress_interval == 0 {
            info!("Staged {} documents", self.staged);
        }
        Ok(())
    }

    /// Commit every staged document in one step, publish the new generation
    /// and release the writer lock. Returns the number of documents committed.
    pub fn commit(self) -> Result<usize> {
        let PaperIndexWriter {
            layout,
            directory,
            generation,
            mut writer,
            staged,
            _lock,
            ..
        } = self;
        let generation_dir = layout.generation_dir(generation);

        info!("Final commit...");
        writer
            .commit()
            .map_err(|e| Error::index_io(&generation_dir, e))?;
        writer
            .wait_merging_threads()
            .map_err(|e| Error::index_io(&generation_dir, e))?;

        layout.publish(&directory, generation)?;
        layout.prune()?;

        info!(
            "Indexing complete! {} papers indexed to {:?}",
            staged,
            layout.root()
        );
        Ok(staged)
    }
}

/// Rebuild the index at `config.index_dir` from `papers`, replacing whatever was there.
///
/// Papers are indexed in iteration order. The first invalid record aborts the
/// run and nothing is committed.
pub fn build_index<'a, I>(config: &SearchConfig, papers: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a PaperRecord>,
{
    let mut writer = PaperIndexWriter::open(config)?;
    for record in papers {
        writer.add_paper(record)?;
    }
    writer.commit()
}

/// Delete every generation under `index_dir`, committed or not.
///
/// Takes the writer lock for the duration, so this fails with
/// [`Error::IndexIo`] while a build is running. The directory and its lock
/// file stay behind.
pub fn remove_index(index_dir: &Path) -> Result<()> {
    if !index_dir.exists() {
        return Ok(());
    }

    let layout = IndexLayout::new(index_dir);
    let directory = layout.directory()?;
    let _lock = layout.lock_writer(&directory)?;

    info!("Removing existing index at {:?}", index_dir);
    layout.clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, Paper};

    fn config(dir: &Path) -> SearchConfig {
        SearchConfig::default().with_index_dir(dir)
    }

    fn record(id: i64) -> PaperRecord {
        PaperRecord::from(&Paper {
            id,
            title: format!("Paper {}", id),
            event_type: "Poster".to_string(),
            pdf_name: format!("{}.pdf", id),
            abstract_text: "abstract".to_string(),
            paper_text: "text".to_string(),
            year: 2016,
            authors: vec![Author {
                id: 1,
                name: "Ada".to_string(),
            }],
        })
    }

    #[test]
    fn test_build_publishes_generation() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record(1), record(2)];

        assert_eq!(build_index(&config(dir.path()), &records).unwrap(), 2);

        let layout = IndexLayout::new(dir.path());
        assert_eq!(layout.current_generation().unwrap(), Some(1));

        let (index, _) = open_committed(dir.path(), AnalyzerKind::Whitespace).unwrap();
        let reader = index.reader().unwrap();
        assert_eq!(reader.searcher().num_docs(), 2);
    }

    #[test]
    fn test_rebuild_keeps_only_retained_generations() {
        let dir = tempfile::tempdir().unwrap();
        for _ in 0..4 {
            build_index(&config(dir.path()), &[record(1)]).unwrap();
        }
        let layout = IndexLayout::new(dir.path());
        assert_eq!(layout.current_generation().unwrap(), Some(4));
        assert_eq!(layout.generations().unwrap(), vec![3, 4]);
    }

    #[test]
    fn test_second_writer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let first = PaperIndexWriter::open(&config(dir.path())).unwrap();
        let second = PaperIndexWriter::open(&config(dir.path()));
        assert!(matches!(second, Err(Error::IndexIo { .. })));

        first.commit().unwrap();
        assert!(PaperIndexWriter::open(&config(dir.path())).is_ok());
    }

    #[test]
    fn test_invalid_record_aborts_without_commit() {
        let dir = tempfile::tempdir().unwrap();
        build_index(&config(dir.path()), &[record(1)]).unwrap();

        let mut bad = record(2);
        bad.paper_text = None;
        let result = build_index(&config(dir.path()), &[record(3), bad, record(4)]);
        assert!(matches!(result, Err(Error::Validation { .. })));

        let layout = IndexLayout::new(dir.path());
        assert_eq!(layout.current_generation().unwrap(), Some(1));
        let (index, _) = open_committed(dir.path(), AnalyzerKind::Whitespace).unwrap();
        assert_eq!(index.reader().unwrap().searcher().num_docs(), 1);
    }

    #[test]
    fn test_analyzer_mismatch_detected() {
        let dir = tempfile::tempdir().unwrap();
        build_index(&config(dir.path()), &[record(1)]).unwrap();

        let err = open_committed(dir.path(), AnalyzerKind::Standard).unwrap_err();
        assert!(matches!(err, Error::AnalyzerMismatch { .. }));
    }

    #[test]
    fn test_remove_index() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("idx");
        build_index(&config(&root), &[record(1)]).unwrap();
        remove_index(&root).unwrap();

        let layout = IndexLayout::new(&root);
        assert!(layout.generations().unwrap().is_empty());
        assert!(matches!(
            open_committed(&root, AnalyzerKind::Whitespace),
            Err(Error::IndexNotFound(_))
        ));
        assert!(remove_index(&root).is_ok());
        assert!(remove_index(&dir.path().join("absent")).is_ok());
    }

    #[test]
    fn test_remove_index_refuses_while_writer_active() {
        let dir = tempfile::tempdir().unwrap();
        build_index(&config(dir.path()), &[record(1)]).unwrap();

        let mut writer = PaperIndexWriter::open(&config(dir.path())).unwrap();
        writer.add_paper(&record(2)).unwrap();
        assert!(matches!(
            remove_index(dir.path()),
            Err(Error::IndexIo { .. })
        ));
        assert!(matches!(
            PaperIndexWriter::open(&config(dir.path())),
            Err(Error::IndexIo { .. })
        ));

        assert_eq!(writer.commit().unwrap(), 1);
        let layout = IndexLayout::new(dir.path());
        assert_eq!(layout.current_generation().unwrap(), Some(2));
        assert_eq!(layout.generations().unwrap(), vec![1, 2]);
    }
}
