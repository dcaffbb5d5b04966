//! Vector index for note embeddings
//!
//! Kept in memory for the lifetime of the process and rebuilt by the startup
//! backfill. `VectorStore` is the seam for swapping in a real vector database.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::embedding::EMBEDDING_DIM;
use crate::core::note::NoteId;

/// Shared embedding storage keyed by note id.
///
/// Every stored vector has exactly `EMBEDDING_DIM` components.
pub trait VectorStore: Send + Sync {
    /// Store `vector` for `id`. Returns `false` (and stores nothing) when the
    /// dimension is wrong.
    fn put(&self, id: NoteId, vector: Vec<f32>) -> bool;
    /// Idempotent.
    fn remove(&self, id: NoteId);
    fn get(&self, id: NoteId) -> Option<Arc<[f32]>>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: NoteId) -> bool {
        self.get(id).is_some()
    }
}

/// Process-wide map from note id to embedding.
///
/// Entries are whole `Arc<[f32]>` values swapped under a write lock, so a
/// reader sees either the old entry or the new one.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    vectors: RwLock<HashMap<NoteId, Arc<[f32]>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids currently holding a vector, ascending.
    pub fn ids(&self) -> Vec<NoteId> {
        let mut ids: Vec<NoteId> = self.vectors.read().keys().copied().collect();
        ids.sort();
        ids
    }
}

impl VectorStore for InMemoryVectorIndex {
    fn put(&self, id: NoteId, vector: Vec<f32>) -> bool {
        if vector.len() != EMBEDDING_DIM {
            return false;
        }
        self.vectors.write().insert(id, Arc::from(vector));
        true
    }

    fn remove(&self, id: NoteId) {
        self.vectors.write().remove(&id);
    }

    fn get(&self, id: NoteId) -> Option<Arc<[f32]>> {
        self.vectors.read().get(&id).cloned()
    }

    fn len(&self) -> usize {
        self.vectors.read().len()
    }
}
