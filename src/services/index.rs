//! In-memory exact nearest-neighbor index over chunk embeddings.

use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::models::DocumentChunk;

/// A stored vector paired with the chunk it was computed from.
///
/// Keeping the two in one structure means a search hit always resolves to
/// the chunk its vector came from; there is no separate chunk list that
/// could drift out of step with the vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: DocumentChunk,
    pub vector: Vec<f32>,
}

/// A nearest-neighbor match: the entry's insertion position and its squared
/// L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub position: usize,
    pub distance: f32,
}

/// Exact brute-force squared-L2 nearest-neighbor index.
///
/// Per-document chunk counts are small (tens to low hundreds), so a linear
/// scan is both exact and fast enough. Append-only or reset-only; there is
/// no deletion of individual entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    /// Build an index from pre-computed entries.
    pub fn from_entries(
        dimension: usize,
        entries: Vec<IndexEntry>,
    ) -> Result<Self, IndexError> {
        let mut index = Self::new(dimension);
        index.add(entries)?;
        Ok(index)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append entries in order; each gets the next insertion position.
    pub fn add(&mut self, entries: Vec<IndexEntry>) -> Result<(), IndexError> {
        for entry in &entries {
            if entry.vector.len() != self.dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: self.dimension,
                    actual: entry.vector.len(),
                });
            }
        }
        self.entries.extend(entries);
        Ok(())
    }

    /// Drop all entries, keeping the configured dimension.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entry(&self, position: usize) -> Option<&IndexEntry> {
        self.entries.get(position)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Entries belonging to a given document, in insertion order.
    pub fn entries_for(&self, document_id: &str) -> Vec<&IndexEntry> {
        self.entries
            .iter()
            .filter(|e| e.chunk.document_id == document_id)
            .collect()
    }

    /// Return the `k` nearest entries to `query` under squared L2 distance,
    /// nearest first. An empty index yields an empty result, not an error;
    /// callers must check for it.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| SearchHit {
                position,
                distance: squared_l2(query, &entry.vector),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    /// Write the index to disk. Round-trips the vector set, chunks, and
    /// insertion order.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously saved index.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let content = std::fs::read_to_string(path)?;
        let index: Self = serde_json::from_str(&content)?;
        Ok(index)
    }
}

/// Squared Euclidean distance. Lengths are validated by the caller.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Process-wide index shared across requests.
///
/// Readers take an `Arc` snapshot and never observe a partially-built
/// index; writers build a complete replacement and swap it in atomically.
/// All mutation funnels through this type, which serializes writers.
#[derive(Debug, Clone)]
pub struct SharedIndex {
    inner: Arc<RwLock<Arc<VectorIndex>>>,
}

impl SharedIndex {
    pub fn new(index: VectorIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, Arc<VectorIndex>> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Arc<VectorIndex>> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// A consistent snapshot; stays valid while the caller holds it, even
    /// across a concurrent rebuild.
    pub fn snapshot(&self) -> Arc<VectorIndex> {
        Arc::clone(&self.read_guard())
    }

    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    /// Replace one document's entries with a fresh set.
    ///
    /// Builds a new index holding every other document's entries plus the
    /// given ones, then swaps it in. Re-ingesting a document therefore
    /// leaves the index with exactly one copy of its chunks. Returns the
    /// new snapshot so callers can persist it.
    pub fn replace_document(
        &self,
        document_id: &str,
        entries: Vec<IndexEntry>,
    ) -> Result<Arc<VectorIndex>, IndexError> {
        let mut guard = self.write_guard();

        let current = Arc::clone(&guard);
        let mut rebuilt = VectorIndex::new(current.dimension());
        let kept: Vec<IndexEntry> = current
            .entries()
            .iter()
            .filter(|e| e.chunk.document_id != document_id)
            .cloned()
            .collect();
        rebuilt.add(kept)?;
        rebuilt.add(entries)?;

        let snapshot = Arc::new(rebuilt);
        *guard = Arc::clone(&snapshot);
        Ok(snapshot)
    }

    /// Swap in a wholly new index (startup load, full reset).
    pub fn swap(&self, index: VectorIndex) {
        *self.write_guard() = Arc::new(index);
    }
}
