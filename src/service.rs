//! Note service: the layer between callers and the search core
//!
//! Owns the note store, forwards create/delete events to the embedding
//! pipeline and scopes search candidates to the requesting owner.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::runtime::Handle;

use crate::core::config::Config;
use crate::core::note::{NewNote, Note, NoteId};
use crate::core::store::NoteStore;
use crate::search::{
    BackfillStats, EmbeddingPipeline, EmbeddingProvider, HttpEmbeddingProvider, HybridSearchEngine,
    InMemoryVectorIndex, IndexState, PipelineCounters, SearchOutcome, VectorStore,
};

pub struct NoteService<S: NoteStore> {
    store: S,
    pipeline: EmbeddingPipeline,
    engine: HybridSearchEngine,
    backfill: BackfillStats,
}

impl<S: NoteStore> NoteService<S> {
    /// Wire the service and run the startup backfill before returning.
    ///
    /// Background embeddings for notes created later run on the runtime this
    /// is awaited on, so `create_note` may be called from any thread.
    pub async fn start(
        store: S,
        provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorStore>,
        config: &Config,
    ) -> Result<Self> {
        let pipeline = EmbeddingPipeline::new(
            Arc::clone(&provider),
            Arc::clone(&index),
            &config.pipeline,
            Handle::current(),
        );
        let engine = HybridSearchEngine::new(provider, index);

        let notes = store.list_all().context("Failed to load notes for backfill")?;
        let backfill = pipeline.backfill(&notes).await;

        Ok(Self {
            store,
            pipeline,
            engine,
            backfill,
        })
    }

    /// Start with the HTTP provider and a fresh in-memory index.
    pub async fn from_config(store: S, config: &Config) -> Result<Self> {
        let provider = HttpEmbeddingProvider::new(&config.embedding)
            .context("Failed to build embedding client")?;
        Self::start(
            store,
            Arc::new(provider),
            Arc::new(InMemoryVectorIndex::new()),
            config,
        )
        .await
    }

    pub fn notes_for(&self, owner: &str) -> Result<Vec<Note>> {
        self.store.list_for_owner(owner)
    }

    pub fn get_note(&self, id: NoteId) -> Result<Option<Note>> {
        self.store.get(id)
    }

    /// Save the note and queue its embedding; does not wait for the embedding.
    pub fn create_note(&self, note: NewNote) -> Result<Note> {
        let note = self.store.insert(note)?;
        self.pipeline.note_created(&note);
        Ok(note)
    }

    /// Save new text. The stored embedding is left as it was.
    pub fn update_note(&self, id: NoteId, title: &str, content: &str) -> Result<Option<Note>> {
        self.store.update(id, title, content)
    }

    pub fn delete_note(&self, id: NoteId) -> Result<bool> {
        let removed = self.store.delete(id)?;
        self.pipeline.note_deleted(id);
        Ok(removed)
    }

    /// Hybrid search over `owner`'s notes.
    pub async fn search(&self, owner: &str, query: &str) -> Result<SearchOutcome<Note>> {
        let candidates = self.store.list_for_owner(owner)?;
        Ok(self.engine.search(query, candidates).await)
    }

    pub fn index_state(&self, id: NoteId) -> IndexState {
        self.pipeline.state(id)
    }

    pub fn counters(&self) -> PipelineCounters {
        self.pipeline.counters()
    }

    pub fn indexed_count(&self) -> usize {
        self.pipeline.index().len()
    }

    /// Result of the startup backfill.
    pub fn backfill_stats(&self) -> &BackfillStats {
        &self.backfill
    }

    /// Let queued background embeddings finish. Call before exiting.
    pub async fn shutdown(&self) {
        self.pipeline.drain().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PipelineConfig;
    use crate::core::store::SqliteNoteStore;
    use crate::search::pipeline::tests::ScriptedProvider;
    use crate::search::{SearchMode, EMBEDDING_DIM};

    fn axis(i: usize) -> Vec<f32> {
        let mut v = vec![0.0; EMBEDDING_DIM];
        v[i] = 1.0;
        v
    }

    fn config() -> Config {
        Config {
            pipeline: PipelineConfig {
                backfill_delay_ms: 0,
                max_concurrent: 2,
            },
            ..Config::default()
        }
    }

    async fn service(
        store: SqliteNoteStore,
        provider: ScriptedProvider,
    ) -> NoteService<SqliteNoteStore> {
        NoteService::start(
            store,
            Arc::new(provider),
            Arc::new(InMemoryVectorIndex::new()),
            &config(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_startup_backfill_indexes_existing_notes() -> Result<()> {
        let store = SqliteNoteStore::open_in_memory()?;
        let a = store.insert(NewNote::new("alice", "Groceries", "milk"))?;
        let b = store.insert(NewNote::new("alice", "Unembeddable", "x"))?;

        let provider = ScriptedProvider::default().with("Groceries milk", axis(0));
        let svc = service(store, provider).await;

        assert_eq!(svc.backfill_stats().indexed, 1);
        assert_eq!(svc.backfill_stats().failed, 1);
        assert_eq!(svc.index_state(a.id), IndexState::Indexed);
        assert_eq!(svc.index_state(b.id), IndexState::Unindexed);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_search_delete_flow() -> Result<()> {
        let provider = ScriptedProvider::default()
            .with("Trip packing list boots", axis(0))
            .with("hiking", axis(0))
            .with("Taxes receipts", axis(1));
        let svc = service(SqliteNoteStore::open_in_memory()?, provider).await;

        let trip = svc.create_note(NewNote::new("alice", "Trip", "packing list boots"))?;
        let taxes = svc.create_note(NewNote::new("alice", "Taxes", "receipts"))?;
        svc.create_note(NewNote::new("bob", "Trip", "packing list boots"))?;
        svc.shutdown().await;
        assert_eq!(svc.indexed_count(), 3);

        let outcome = svc.search("alice", "hiking").await?;
        assert_eq!(outcome.mode, SearchMode::Hybrid);
        let ids: Vec<NoteId> = outcome.hits.iter().map(|h| h.candidate.id).collect();
        assert_eq!(ids, vec![trip.id]);

        assert!(svc.delete_note(trip.id)?);
        assert_eq!(svc.index_state(trip.id), IndexState::Unindexed);
        assert_eq!(svc.indexed_count(), 2);
        assert!(svc.search("alice", "hiking").await?.hits.is_empty());
        assert_eq!(svc.notes_for("alice")?.len(), 1);
        assert_eq!(svc.get_note(taxes.id)?.map(|n| n.title), Some("Taxes".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_keeps_stale_embedding() -> Result<()> {
        let provider = ScriptedProvider::default()
            .with("Recipes pasta", axis(0))
            .with("cooking", axis(0));
        let svc = service(SqliteNoteStore::open_in_memory()?, provider).await;

        let note = svc.create_note(NewNote::new("alice", "Recipes", "pasta"))?;
        svc.shutdown().await;

        svc.update_note(note.id, "Car", "oil change")?;
        assert_eq!(svc.index_state(note.id), IndexState::Indexed);

        // Still found through its old vector even though the text no longer relates.
        let outcome = svc.search("alice", "cooking").await?;
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].candidate.title, "Car");
        assert!(!outcome.hits[0].keyword_match);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_without_provider_uses_keywords() -> Result<()> {
        let store = SqliteNoteStore::open_in_memory()?;
        store.insert(NewNote::new("alice", "Shopping", "bread"))?;
        store.insert(NewNote::new("alice", "Work", "standup"))?;
        let svc = service(store, ScriptedProvider::default()).await;

        let outcome = svc.search("alice", "shop").await?;
        assert_eq!(outcome.mode, SearchMode::KeywordOnly);
        assert_eq!(outcome.into_candidates().len(), 1);
        Ok(())
    }

    #[test]
    fn test_create_note_outside_runtime_thread() -> Result<()> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;
        let provider = ScriptedProvider::default().with("Plain thread note", axis(2));
        let svc = rt.block_on(service(SqliteNoteStore::open_in_memory()?, provider));

        // This thread is not inside the runtime.
        assert!(Handle::try_current().is_err());
        let note = svc.create_note(NewNote::new("alice", "Plain", "thread note"))?;

        rt.block_on(svc.shutdown());
        assert_eq!(svc.index_state(note.id), IndexState::Indexed);
        Ok(())
    }
}
