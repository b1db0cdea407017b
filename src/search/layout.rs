//! On-disk layout of the index directory.
//!
//! ```text
//! <index_dir>/
//!     CURRENT              name of the committed generation
//!     .paper-writer.lock   held by the single active writer
//!     gen-000001/          one complete tantivy index per build
//!     gen-000002/
//! ```
//!
//! A build always writes into a fresh generation and only becomes visible once
//! `CURRENT` is atomically rewritten to name it. Readers resolve `CURRENT` once
//! when they open, so an interrupted build never exposes a partial index.

use std::fs;
use std::path::{Path, PathBuf};

use tantivy::directory::{Directory, DirectoryLock, Lock, MmapDirectory};
use tracing::{debug, warn};

use crate::error::{Error, Result};

const CURRENT_FILE: &str = "CURRENT";
const WRITER_LOCK_FILE: &str = ".paper-writer.lock";
const GENERATION_PREFIX: &str = "gen-";

/// Committed generations kept on disk, the live one included. Older ones are
/// deleted after each commit; the previous one survives for readers still pinned to it.
pub const RETAINED_GENERATIONS: usize = 2;

#[derive(Debug, Clone)]
pub struct IndexLayout {
    root: PathBuf,
}

impl IndexLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn generation_dir(&self, generation: u64) -> PathBuf {
        self.root.join(generation_name(generation))
    }

    /// The committed generation, if any build ever committed.
    pub fn current_generation(&self) -> Result<Option<u64>> {
        let path = self.root.join(CURRENT_FILE);
        match fs::read_to_string(&path) {
            Ok(raw) => parse_generation(raw.trim())
                .map(Some)
                .ok_or_else(|| Error::index_io(&path, format!("corrupt pointer '{}'", raw.trim()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::index_io(&path, e)),
        }
    }

    /// Directory of the committed index, or `IndexNotFound`.
    pub fn committed_dir(&self) -> Result<PathBuf> {
        match self.current_generation()? {
            Some(generation) => {
                let dir = self.generation_dir(generation);
                if dir.join("meta.json").exists() {
                    Ok(dir)
                } else {
                    Err(Error::index_io(&dir, "committed generation is missing"))
                }
            }
            None => Err(Error::IndexNotFound(self.root.clone())),
        }
    }

    /// Every generation directory present on disk, ascending.
    pub fn generations(&self) -> Result<Vec<u64>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::index_io(&self.root, e)),
        };

        let mut generations: Vec<u64> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| parse_generation(&entry.file_name().to_string_lossy()))
            .collect();
        generations.sort_unstable();
        Ok(generations)
    }

    pub(crate) fn directory(&self) -> Result<MmapDirectory> {
        fs::create_dir_all(&self.root).map_err(|e| Error::index_io(&self.root, e))?;
        MmapDirectory::open(&self.root).map_err(|e| Error::index_io(&self.root, e))
    }

    /// Take the single-writer lock. Fails immediately if another writer holds it.
    pub(crate) fn lock_writer(&self, directory: &MmapDirectory) -> Result<DirectoryLock> {
        let lock = Lock {
            filepath: PathBuf::from(WRITER_LOCK_FILE),
            is_blocking: false,
        };
        directory
            .acquire_lock(&lock)
            .map_err(|e| Error::index_io(&self.root, format!("writer lock unavailable: {}", e)))
    }

    /// Atomically point `CURRENT` at `generation`. This is the commit boundary.
    pub(crate) fn publish(&self, directory: &MmapDirectory, generation: u64) -> Result<()> {
        directory
            .atomic_write(Path::new(CURRENT_FILE), generation_name(generation).as_bytes())
            .map_err(|e| Error::index_io(&self.root, e))
    }

    /// Remove abandoned builds newer than the committed generation.
    pub(crate) fn remove_abandoned(&self) -> Result<()> {
        let current = self.current_generation()?.unwrap_or(0);
        for generation in self.generations()? {
            if generation > current {
                debug!("Removing abandoned generation {}", generation);
                self.remove_generation(generation);
            }
        }
        Ok(())
    }

    /// Drop committed generations beyond [`RETAINED_GENERATIONS`].
    pub(crate) fn prune(&self) -> Result<()> {
        let current = self.current_generation()?.unwrap_or(0);
        let committed: Vec<u64> = self
            .generations()?
            .into_iter()
            .filter(|g| *g <= current)
            .collect();
        let excess = committed.len().saturating_sub(RETAINED_GENERATIONS);
        for generation in &committed[..excess] {
            self.remove_generation(*generation);
        }
        Ok(())
    }

    /// Delete `CURRENT` and every generation. The caller must hold the writer lock,
    /// whose file is left in place.
    pub(crate) fn clear(&self) -> Result<()> {
        let current = self.root.join(CURRENT_FILE);
        match fs::remove_file(&current) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::index_io(&current, e)),
        }

        for entry in fs::read_dir(&self.root).map_err(|e| Error::index_io(&self.root, e))? {
            let path = entry.map_err(|e| Error::index_io(&self.root, e))?.path();
            if path.file_name().is_some_and(|name| name == WRITER_LOCK_FILE) {
                continue;
            }
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.map_err(|e| Error::index_io(&path, e))?;
        }
        Ok(())
    }

    fn remove_generation(&self, generation: u64) {
        let dir = self.generation_dir(generation);
        if let Err(e) = fs::remove_dir_all(&dir) {
            warn!("Failed to remove {:?}: {}", dir, e);
        }
    }
}

fn generation_name(generation: u64) -> String {
    format!("{}{:06}", GENERATION_PREFIX, generation)
}

fn parse_generation(name: &str) -> Option<u64> {
    name.strip_prefix(GENERATION_PREFIX)?.parse().ok()
}
