//! Embedding maintenance
//!
//! Two ways a vector reaches the index:
//! - `backfill`: one provider call at a time over every stored note, with a
//!   fixed pause between calls.
//! - `note_created`: a background task per new note, gated by a semaphore.
//!   The caller gets no completion signal; a failed call leaves the note
//!   without a vector until the next backfill.
//!
//! Updates are not wired here: an edited note keeps its old vector.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use super::embedding::EmbeddingProvider;
use super::vectordb::VectorStore;
use crate::core::config::PipelineConfig;
use crate::core::note::{NoteId, SearchCandidate};

/// Backfill statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillStats {
    pub indexed: usize,
    pub failed: usize,
    pub duration_ms: u128,
}

/// Where a note stands with respect to the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    Indexed,
    Pending,
    Unindexed,
}

/// Counters for creation-time embeddings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PipelineCounters {
    pub in_flight: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Default)]
struct Counters {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

/// Store `vector` for `id`, logging a rejected dimension. Returns whether it
/// was stored.
fn store_vector(index: &dyn VectorStore, id: NoteId, vector: Vec<f32>) -> bool {
    let dims = vector.len();
    if index.put(id, vector) {
        true
    } else {
        warn!(note = %id, dims, "rejected embedding with wrong dimension");
        false
    }
}

pub struct EmbeddingPipeline {
    provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorStore>,
    backfill_delay: Duration,
    runtime: Handle,
    tasks: TaskTracker,
    permits: Arc<Semaphore>,
    pending: Arc<Mutex<HashSet<NoteId>>>,
    counters: Arc<Counters>,
}

impl EmbeddingPipeline {
    /// Background embeddings for new notes are spawned on `runtime`, so
    /// `note_created` works from any thread.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorStore>,
        config: &PipelineConfig,
        runtime: Handle,
    ) -> Self {
        let max_concurrent = config.max_concurrent.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            provider,
            index,
            backfill_delay: config.backfill_delay(),
            runtime,
            tasks: TaskTracker::new(),
            permits: Arc::new(Semaphore::new(max_concurrent)),
            pending: Arc::new(Mutex::new(HashSet::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Embed every note in turn. A failing note is logged and skipped.
    ///
    /// A provider that cannot make calls at all fails every note up front,
    /// without the pauses.
    pub async fn backfill<C: SearchCandidate>(&self, notes: &[C]) -> BackfillStats {
        let start = Instant::now();
        let mut stats = BackfillStats::default();

        if !self.provider.is_enabled() {
            warn!("embedding provider disabled; skipping backfill of {} notes", notes.len());
            stats.failed = notes.len();
            return stats;
        }

        info!("backfilling embeddings for {} notes", notes.len());

        for (i, note) in notes.iter().enumerate() {
            if i > 0 && !self.backfill_delay.is_zero() {
                tokio::time::sleep(self.backfill_delay).await;
            }

            let id = note.note_id();
            match self.provider.embed(&note.embedding_text()).await {
                Ok(vector) => {
                    if store_vector(self.index.as_ref(), id, vector) {
                        stats.indexed += 1;
                    } else {
                        stats.failed += 1;
                    }
                }
                Err(e) => {
                    warn!(note = %id, "failed to embed note: {e}");
                    stats.failed += 1;
                }
            }
        }

        stats.duration_ms = start.elapsed().as_millis();
        info!(
            indexed = stats.indexed,
            failed = stats.failed,
            "backfill complete in {}ms",
            stats.duration_ms
        );
        stats
    }

    /// Queue an embedding for a freshly saved note and return immediately.
    pub fn note_created<C: SearchCandidate>(&self, note: &C) {
        let id = note.note_id();
        if !self.provider.is_enabled() {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let text = note.embedding_text();
        self.pending.lock().insert(id);

        let provider = Arc::clone(&self.provider);
        let index = Arc::clone(&self.index);
        let permits = Arc::clone(&self.permits);
        let pending = Arc::clone(&self.pending);
        let counters = Arc::clone(&self.counters);

        self.tasks.spawn_on(
            async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    pending.lock().remove(&id);
                    return;
                };

                let result = provider.embed(&text).await;

                // Holding the lock while storing orders us against `note_deleted`.
                let mut pending = pending.lock();
                if !pending.remove(&id) {
                    info!(note = %id, "note deleted before its embedding arrived; discarding");
                    return;
                }

                match result {
                    Ok(vector) => {
                        if store_vector(index.as_ref(), id, vector) {
                            counters.succeeded.fetch_add(1, Ordering::Relaxed);
                            info!(note = %id, "generated embedding");
                        } else {
                            counters.failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    Err(e) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(note = %id, "failed to embed note: {e}");
                    }
                }
            },
            &self.runtime,
        );
    }

    /// Drop the note's vector, including one still being computed.
    pub fn note_deleted(&self, id: NoteId) {
        let mut pending = self.pending.lock();
        pending.remove(&id);
        self.index.remove(id);
    }

    pub fn state(&self, id: NoteId) -> IndexState {
        if self.index.contains(id) {
            IndexState::Indexed
        } else if self.pending.lock().contains(&id) {
            IndexState::Pending
        } else {
            IndexState::Unindexed
        }
    }

    /// `in_flight` counts spawned tasks still running, including ones whose
    /// note was deleted mid-call.
    pub fn counters(&self) -> PipelineCounters {
        PipelineCounters {
            in_flight: self.tasks.len(),
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Wait until every spawned background embedding has finished. Used before
    /// process exit; individual callers are never told when their note lands.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    pub fn index(&self) -> &Arc<dyn VectorStore> {
        &self.index
    }
}
