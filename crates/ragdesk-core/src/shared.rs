//! Process-wide handle to the vector index for concurrent queries and ingestion.
//!
//! Searches share a read lock and run in parallel. Append, persist and reload take
//! the write lock, so a reader sees the index either before or after a batch, never
//! half of one. Ingestion appends and persists under a single write lock, and reload
//! reads the disk while holding it, so a reload never observes memory ahead of disk.
//! Embedding and completion calls must happen before taking any lock.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::chunks::ChunkRecord;
pub use crate::store::IndexStats;
use crate::store::{SearchHit, StoreError, VectorIndex};

#[derive(Debug, Clone)]
pub struct SharedIndex {
    inner: Arc<RwLock<VectorIndex>>,
}

impl SharedIndex {
    pub fn new(index: VectorIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    pub fn dimension(&self) -> usize {
        self.read().dimension()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        let index = self.read();
        IndexStats {
            entries: index.len(),
            dimension: index.dimension(),
        }
    }

    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, StoreError> {
        self.read().search_scored(query, top_k)
    }

    /// Appends a batch atomically with respect to readers. Returns the new length.
    pub fn append(
        &self,
        records: Vec<ChunkRecord>,
        embeddings: &[Vec<f32>],
    ) -> Result<usize, StoreError> {
        let mut index = self.write();
        index.append(records, embeddings)?;
        Ok(index.len())
    }

    pub fn persist(&self, dir: &Path) -> Result<(), StoreError> {
        self.write().persist(dir)
    }

    /// Appends a batch and persists the index to `dir` without releasing the write
    /// lock in between. If the persist fails the batch is removed again, leaving the
    /// index as it was. Returns the new length.
    pub fn append_and_persist(
        &self,
        records: Vec<ChunkRecord>,
        embeddings: &[Vec<f32>],
        dir: &Path,
    ) -> Result<usize, StoreError> {
        let mut index = self.write();
        let before = index.len();
        index.append(records, embeddings)?;
        if let Err(e) = index.persist(dir) {
            index.truncate(before);
            tracing::warn!(dir = %dir.display(), entries = before, "persist failed, batch rolled back: {e}");
            return Err(e);
        }
        Ok(index.len())
    }

    /// Reloads the persisted index from `dir`, keeping the current dimension. The write
    /// lock is held for the whole read, so no append or persist interleaves with it.
    /// On error the current index is kept.
    pub fn reload(&self, dir: &Path) -> Result<usize, StoreError> {
        let mut index = self.write();
        let restored = VectorIndex::restore(dir, index.dimension())?;
        let entries = restored.len();
        *index = restored;
        Ok(entries)
    }

    /// Poisoning is ignored: `append` validates before it writes, so a panicking
    /// holder cannot leave the index torn.
    fn read(&self) -> RwLockReadGuard<'_, VectorIndex> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VectorIndex> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
