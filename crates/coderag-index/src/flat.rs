//! Exact nearest-neighbour search over a flat array of vectors.
//!
//! # File format
//!
//! - Header (16 bytes): magic `CRFI`, dimension (`u32`), row count (`u64`)
//! - Rows: contiguous little-endian `f32`, `dimension` values per row
//!
//! Row `i` of the file is the `i`-th vector ever added; rows are never
//! reordered or removed.

use std::io::Write;
use std::path::Path;

use crate::error::{IndexError, Result};

const MAGIC_BYTES: &[u8; 4] = b"CRFI";
const HEADER_SIZE: usize = 16;
const BYTES_PER_F32: usize = 4;

/// One search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    /// Squared L2 distance to the query.
    pub distance: f32,
}

/// In-memory flat L2 index.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        let start = row.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Check every vector against the index dimension without adding any.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Dimension`] for the first mismatching vector.
    pub fn validate(&self, vectors: &[Vec<f32>]) -> Result<()> {
        for vector in vectors {
            if vector.len() != self.dimension {
                return Err(IndexError::Dimension {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }
        Ok(())
    }

    /// Append vectors as new rows. All-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Dimension`] if any vector has the wrong length.
    pub fn add_batch(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        self.validate(vectors)?;
        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    /// The `k` rows nearest to `query`, ascending by distance. Ties keep row
    /// order. Returns at most `len()` hits.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Dimension`] if the query has the wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(IndexError::Dimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, vector)| Neighbor {
                row,
                distance: squared_l2(query, vector),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    /// Persist to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let dimension = u32::try_from(self.dimension)
            .map_err(|_| IndexError::CorruptIndex(format!("dimension {} too large", self.dimension)))?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + self.data.len() * BYTES_PER_F32);
        buf.extend_from_slice(MAGIC_BYTES);
        buf.extend_from_slice(&dimension.to_le_bytes());
        buf.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for value in &self.data {
            buf.extend_from_slice(&value.to_le_bytes());
        }

        let tmp = path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&buf)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Load an index written by [`write_to`](Self::write_to).
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] if the file cannot be read and
    /// [`IndexError::CorruptIndex`] if its header or length is inconsistent.
    pub fn read_from(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        if bytes.len() < HEADER_SIZE {
            return Err(IndexError::CorruptIndex(format!(
                "{}: file too short ({} bytes)",
                path.display(),
                bytes.len()
            )));
        }
        if &bytes[0..4] != MAGIC_BYTES {
            return Err(IndexError::CorruptIndex(format!(
                "{}: bad magic bytes",
                path.display()
            )));
        }

        let dimension = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&bytes[8..16]);
        let rows = usize::try_from(u64::from_le_bytes(count_bytes))
            .map_err(|_| IndexError::CorruptIndex(format!("{}: row count overflow", path.display())))?;

        let expected = rows
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(BYTES_PER_F32))
            .and_then(|n| n.checked_add(HEADER_SIZE));
        if expected != Some(bytes.len()) {
            return Err(IndexError::CorruptIndex(format!(
                "{}: {} rows of dimension {} do not match file length {}",
                path.display(),
                rows,
                dimension,
                bytes.len()
            )));
        }

        let data = bytes[HEADER_SIZE..]
            .chunks_exact(BYTES_PER_F32)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self { dimension, data })
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
