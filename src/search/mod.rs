//! Hybrid note search
//!
//! Keyword matching plus semantic similarity over remote embeddings, with an
//! in-memory vector index kept up to date by the maintenance pipeline.

pub mod embedding;
pub mod engine;
pub mod pipeline;
pub mod vectordb;

pub use embedding::{
    cosine_similarity, EmbeddingError, EmbeddingProvider, HttpEmbeddingProvider, EMBEDDING_DIM,
};
pub use engine::{HybridSearchEngine, SearchHit, SearchMode, SearchOutcome};
pub use pipeline::{BackfillStats, EmbeddingPipeline, IndexState, PipelineCounters};
pub use vectordb::{InMemoryVectorIndex, VectorStore};
