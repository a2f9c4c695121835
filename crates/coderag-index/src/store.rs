//! Per-codebase persistence: a flat vector index plus a JSONL metadata file
//! whose line `i` describes row `i` of the index.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::flat::FlatL2Index;

pub const INDEX_FILE: &str = "faiss.index";
pub const METADATA_FILE: &str = "metadata.jsonl";

/// Persisted description of one indexed unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataRecord {
    Function {
        id: String,
        source: String,
        code: String,
        doc: String,
    },
    File {
        id: String,
        source: String,
    },
}

impl MetadataRecord {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Function { id, .. } | Self::File { id, .. } => id,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Function { source, .. } | Self::File { source, .. } => source,
        }
    }
}

/// Location of one codebase's persisted index.
#[derive(Debug, Clone)]
pub struct IndexStore {
    name: String,
    dir: PathBuf,
}

/// A fully loaded codebase index.
#[derive(Debug)]
pub struct LoadedIndex {
    pub index: FlatL2Index,
    pub records: Vec<MetadataRecord>,
}

impl IndexStore {
    #[must_use]
    pub fn new(vector_root: impl AsRef<Path>, codebase: &str) -> Self {
        Self {
            name: codebase.to_string(),
            dir: vector_root.as_ref().join(codebase),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// Both files are present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.index_path().is_file() && self.metadata_path().is_file()
    }

    /// Start a fresh build. Removes a stale index file and truncates the
    /// metadata file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or metadata file cannot be created.
    pub fn create_writer(&self, dimension: usize) -> Result<IndexWriter> {
        std::fs::create_dir_all(&self.dir)?;
        let index_path = self.index_path();
        match std::fs::remove_file(&index_path) {
            Ok(()) => tracing::debug!("removed stale index {}", index_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let metadata = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.metadata_path())?;

        Ok(IndexWriter {
            index: FlatL2Index::new(dimension),
            metadata,
            committed_bytes: 0,
            index_path,
        })
    }

    /// Load the index and its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] if either file is missing, or a
    /// read/parse error if one is unreadable.
    pub fn load(&self) -> Result<LoadedIndex> {
        let index_path = self.index_path();
        let metadata_path = self.metadata_path();
        for path in [&index_path, &metadata_path] {
            if !path.is_file() {
                return Err(IndexError::NotFound {
                    codebase: self.name.clone(),
                    path: path.clone(),
                });
            }
        }

        let index = FlatL2Index::read_from(&index_path)?;
        let reader = BufReader::new(File::open(&metadata_path)?);
        let mut records = Vec::with_capacity(index.len());
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }

        if records.len() != index.len() {
            tracing::warn!(
                codebase = %self.name,
                rows = index.len(),
                records = records.len(),
                "index and metadata sizes differ"
            );
        }

        Ok(LoadedIndex { index, records })
    }
}

/// Exclusive handle for one build run.
#[derive(Debug)]
pub struct IndexWriter {
    index: FlatL2Index,
    metadata: File,
    committed_bytes: u64,
    index_path: PathBuf,
}

impl IndexWriter {
    /// Rows committed so far.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.index.len()
    }

    /// Commit one batch to both stores, or to neither.
    ///
    /// # Errors
    ///
    /// Returns an error if the counts differ, a vector has the wrong dimension,
    /// or the metadata write fails. In every case nothing is committed.
    pub fn append_batch(&mut self, records: &[MetadataRecord], vectors: &[Vec<f32>]) -> Result<()> {
        if records.len() != vectors.len() {
            return Err(IndexError::BatchMismatch {
                records: records.len(),
                vectors: vectors.len(),
            });
        }
        self.index.validate(vectors)?;

        let mut buf = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }

        if let Err(e) = self.write_metadata(&buf) {
            self.metadata.set_len(self.committed_bytes)?;
            self.metadata.seek(SeekFrom::Start(self.committed_bytes))?;
            return Err(e);
        }

        self.index.add_batch(vectors)?;
        self.committed_bytes += buf.len() as u64;
        Ok(())
    }

    fn write_metadata(&mut self, buf: &[u8]) -> Result<()> {
        self.metadata.write_all(buf)?;
        self.metadata.flush()?;
        Ok(())
    }

    /// Sync the metadata and persist the index. Returns the row count.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be written.
    pub fn finish(self) -> Result<usize> {
        self.metadata.sync_all()?;
        self.index.write_to(&self.index_path)?;
        Ok(self.index.len())
    }
}
