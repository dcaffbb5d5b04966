use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use notes_search::search::{EmbeddingError, EmbeddingProvider, EMBEDDING_DIM};
use notes_search::{
    Config, HybridSearchEngine, InMemoryVectorIndex, NewNote, NoteId, NoteService, NoteStore,
    SearchMode, SqliteNoteStore, VectorStore,
};

struct TableProvider(HashMap<&'static str, Vec<f32>>);

#[async_trait]
impl EmbeddingProvider for TableProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.0
            .get(text)
            .cloned()
            .ok_or(EmbeddingError::MissingCredential)
    }
}

fn at_similarity(similarity: f32) -> Vec<f32> {
    let mut v = vec![0.0; EMBEDDING_DIM];
    v[0] = similarity;
    v[1] = (1.0 - similarity * similarity).sqrt();
    v
}

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.pipeline.backfill_delay_ms = 0;
    config
}

#[tokio::test]
async fn shopping_scenario_orders_semantic_hit_before_boosted_keyword_hit() {
    let store = SqliteNoteStore::open_in_memory().unwrap();
    let a = store
        .insert(NewNote::new("alice", "Wardrobe", "need a winter coat"))
        .unwrap();
    let b = store
        .insert(NewNote::new("alice", "Sunday", "shopping at the market"))
        .unwrap();

    let provider = TableProvider(HashMap::from([
        ("shopping", at_similarity(1.0)),
        ("Wardrobe need a winter coat", at_similarity(0.50)),
        ("Sunday shopping at the market", at_similarity(0.10)),
    ]));
    let service = NoteService::start(
        store,
        Arc::new(provider),
        Arc::new(InMemoryVectorIndex::new()),
        &quiet_config(),
    )
    .await
    .unwrap();

    let outcome = service.search("alice", "shopping").await.unwrap();
    let ranked: Vec<(NoteId, f32)> = outcome
        .hits
        .iter()
        .map(|h| (h.candidate.id, h.score.unwrap()))
        .collect();

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].0, a.id);
    assert!((ranked[0].1 - 0.50).abs() < 1e-4);
    assert_eq!(ranked[1].0, b.id);
    assert!((ranked[1].1 - 0.20).abs() < 1e-4);
}

#[tokio::test]
async fn notes_without_vectors_return_keyword_matches_only() {
    let index = Arc::new(InMemoryVectorIndex::new());
    index.put(NoteId(500), at_similarity(0.9));

    let store = SqliteNoteStore::open_in_memory().unwrap();
    store.insert(NewNote::new("alice", "Alpha", "first")).unwrap();
    let c = store.insert(NewNote::new("alice", "Budget", "Q3 numbers")).unwrap();
    store.insert(NewNote::new("alice", "Gamma", "third")).unwrap();

    let provider = TableProvider(HashMap::from([("budget", at_similarity(1.0))]));
    let engine = HybridSearchEngine::new(Arc::new(provider), index);

    let outcome = engine
        .search("budget", store.list_for_owner("alice").unwrap())
        .await;
    assert_eq!(outcome.mode, SearchMode::Hybrid);
    let ids: Vec<NoteId> = outcome.into_candidates().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![c.id]);
}

#[tokio::test]
async fn failed_query_embedding_falls_back_to_keyword_set() {
    let index = Arc::new(InMemoryVectorIndex::new());
    index.put(NoteId(1), at_similarity(0.9));

    let store = SqliteNoteStore::open_in_memory().unwrap();
    let first = store.insert(NewNote::new("alice", "Meeting", "notes")).unwrap();
    store.insert(NewNote::new("alice", "Other", "stuff")).unwrap();
    let third = store.insert(NewNote::new("alice", "Notes", "misc")).unwrap();

    let engine = HybridSearchEngine::new(Arc::new(TableProvider(HashMap::new())), index);
    let outcome = engine
        .search("NOTES", store.list_for_owner("alice").unwrap())
        .await;

    assert_eq!(outcome.mode, SearchMode::KeywordOnly);
    let ids: Vec<NoteId> = outcome.into_candidates().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![first.id, third.id]);
}

#[test]
fn short_vector_is_rejected_by_index() {
    let index = InMemoryVectorIndex::new();
    assert!(!index.put(NoteId(1), vec![1.0; 10]));
    assert!(index.is_empty());
    assert!(index.get(NoteId(1)).is_none());
}
