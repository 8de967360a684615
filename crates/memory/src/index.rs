//! Flat L2 vector index with a binary snapshot format.
//!
//! Exhaustive nearest-neighbor search over fixed-dimension vectors. Vector
//! `i` is the `i`-th call to [`FlatL2Index::add`]; callers pair it with their
//! own `i`-th payload (document chunk).

use crate::vector::{k_smallest, l2_squared};
use hubblet_core::error::StoreError;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Label returned for result slots with no vector.
pub const MISSING_LABEL: i64 = -1;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatL2Index {
    dimension: usize,
    /// Row-major storage, `len() * dimension` floats
    data: Vec<f32>,
}

/// Result of a k-nearest search: always exactly `k` slots.
///
/// Unused slots carry [`MISSING_LABEL`] and an infinite distance.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHits {
    pub distances: Vec<f32>,
    pub labels: Vec<i64>,
}

impl SearchHits {
    /// Positions of real hits, nearest first.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels
            .iter()
            .filter(|&&label| label != MISSING_LABEL)
            .filter_map(|&label| usize::try_from(label).ok())
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    index: FlatL2Index,
}

impl FlatL2Index {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one vector.
    pub fn add(&mut self, vector: &[f32]) -> Result<(), StoreError> {
        self.check_dimension(vector)?;
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// The `k` nearest vectors by squared L2 distance.
    pub fn search(&self, query: &[f32], k: usize) -> Result<SearchHits, StoreError> {
        self.check_dimension(query)?;

        let distances: Vec<f32> = self
            .data
            .chunks_exact(self.dimension)
            .map(|row| l2_squared(row, query))
            .collect();

        let mut hits = SearchHits {
            distances: Vec::with_capacity(k),
            labels: Vec::with_capacity(k),
        };
        for i in k_smallest(&distances, k) {
            hits.distances.push(distances[i]);
            hits.labels.push(i as i64);
        }
        while hits.labels.len() < k {
            hits.distances.push(f32::INFINITY);
            hits.labels.push(MISSING_LABEL);
        }
        Ok(hits)
    }

    /// Write the index to `path` as one opaque binary file.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let file = std::fs::File::create(path).map_err(|e| StoreError::io(path, e))?;
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            index: self.clone(),
        };
        bincode::serialize_into(BufWriter::new(file), &snapshot)
            .map_err(|e| StoreError::io(path, e))
    }

    /// Read an index written by [`FlatL2Index::save`].
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let file = std::fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
        let snapshot: Snapshot = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| StoreError::corrupt(path, e))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::corrupt(
                path,
                format!("unsupported snapshot version {}", snapshot.version),
            ));
        }
        let index = snapshot.index;
        if index.dimension == 0 || index.data.len() % index.dimension != 0 {
            return Err(StoreError::corrupt(
                path,
                "vector data does not match dimension",
            ));
        }
        Ok(index)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), StoreError> {
        if vector.len() != self.dimension || self.dimension == 0 {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}
