//! Hybrid search engine
//!
//! Ranks a caller-scoped candidate list by combining:
//! - keyword: case-insensitive substring of title or content (always computed)
//! - semantic: cosine similarity against stored note vectors
//!
//! Keyword hits are never dropped. Semantic hits must clear
//! `SIMILARITY_THRESHOLD` and only the best `SEMANTIC_TOP_K` are kept.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::embedding::{cosine_similarity, EmbeddingProvider};
use super::vectordb::VectorStore;
use crate::core::note::SearchCandidate;

/// Minimum similarity for a semantic-only hit
pub const SIMILARITY_THRESHOLD: f32 = 0.20;
/// Added to the similarity of candidates that also match the keyword
pub const KEYWORD_BOOST: f32 = 0.10;
/// Maximum semantic hits before the keyword union
pub const SEMANTIC_TOP_K: usize = 5;

/// One ranked candidate.
#[derive(Debug, Clone)]
pub struct SearchHit<C> {
    pub candidate: C,
    /// Similarity (boosted for keyword matches); `None` when the note has no vector
    /// or the search fell back to keywords.
    pub score: Option<f32>,
    pub keyword_match: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Hybrid,
    /// Query embedding failed or nothing is indexed yet.
    KeywordOnly,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome<C> {
    pub hits: Vec<SearchHit<C>>,
    pub mode: SearchMode,
}

impl<C> SearchOutcome<C> {
    pub fn into_candidates(self) -> Vec<C> {
        self.hits.into_iter().map(|h| h.candidate).collect()
    }
}

/// Case-insensitive literal matcher.
struct KeywordMatcher {
    pattern: Option<Regex>,
    lowered: String,
}

impl KeywordMatcher {
    fn new(query: &str) -> Self {
        let pattern = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .ok();
        Self {
            pattern,
            lowered: query.to_lowercase(),
        }
    }

    fn is_match(&self, text: &str) -> bool {
        match &self.pattern {
            Some(re) => re.is_match(text),
            None => text.to_lowercase().contains(&self.lowered),
        }
    }

    fn matches<C: SearchCandidate>(&self, candidate: &C) -> bool {
        self.is_match(candidate.title()) || self.is_match(candidate.content())
    }
}

/// Search engine combining embedding provider and vector index
pub struct HybridSearchEngine {
    provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorStore>,
}

impl HybridSearchEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorStore>) -> Self {
        Self { provider, index }
    }

    /// Rank `candidates` for `query`, best first.
    ///
    /// The caller is responsible for scoping `candidates` to the requesting user.
    pub async fn search<C: SearchCandidate>(
        &self,
        query: &str,
        candidates: Vec<C>,
    ) -> SearchOutcome<C> {
        let matcher = KeywordMatcher::new(query);
        let keyword: Vec<bool> = candidates.iter().map(|c| matcher.matches(c)).collect();

        if self.index.is_empty() {
            debug!("no stored embeddings; using keywords only");
            return keyword_only(candidates, &keyword);
        }

        let query_vector = match self.provider.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                warn!("semantic search unavailable ({e}); using keywords only");
                return keyword_only(candidates, &keyword);
            }
        };

        let similarities: Vec<Option<f32>> = candidates
            .iter()
            .map(|c| {
                let vector = self.index.get(c.note_id())?;
                Some(cosine_similarity(&query_vector, &vector))
            })
            .collect();
        let scores: Vec<Option<f32>> = similarities
            .iter()
            .zip(&keyword)
            .map(|(similarity, &is_keyword)| {
                similarity.map(|s| if is_keyword { s + KEYWORD_BOOST } else { s })
            })
            .collect();

        // Threshold applies to raw similarity; the boost is added afterwards.
        let mut semantic: Vec<usize> = (0..candidates.len())
            .filter(|&i| similarities[i].is_some_and(|s| s > SIMILARITY_THRESHOLD))
            .collect();
        semantic.sort_by(|&a, &b| rank(&candidates, &scores, a, b));
        semantic.truncate(SEMANTIC_TOP_K);

        let semantic: HashSet<usize> = semantic.into_iter().collect();
        let mut selected: Vec<usize> = (0..candidates.len())
            .filter(|i| semantic.contains(i) || keyword[*i])
            .collect();
        selected.sort_by(|&a, &b| rank(&candidates, &scores, a, b));

        debug!(
            semantic = semantic.len(),
            total = selected.len(),
            "hybrid search ranked"
        );

        let mut slots: Vec<Option<C>> = candidates.into_iter().map(Some).collect();
        let hits = selected
            .into_iter()
            .filter_map(|i| {
                slots[i].take().map(|candidate| SearchHit {
                    candidate,
                    score: scores[i],
                    keyword_match: keyword[i],
                })
            })
            .collect();

        SearchOutcome {
            hits,
            mode: SearchMode::Hybrid,
        }
    }
}

/// Score descending, then note id ascending; unscored entries go last.
fn rank<C: SearchCandidate>(
    candidates: &[C],
    scores: &[Option<f32>],
    a: usize,
    b: usize,
) -> Ordering {
    let by_score = match (scores[a], scores[b]) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_score.then_with(|| candidates[a].note_id().cmp(&candidates[b].note_id()))
}

fn keyword_only<C>(candidates: Vec<C>, keyword: &[bool]) -> SearchOutcome<C> {
    let hits = candidates
        .into_iter()
        .zip(keyword)
        .filter(|(_, is_keyword)| **is_keyword)
        .map(|(candidate, _)| SearchHit {
            candidate,
            score: None,
            keyword_match: true,
        })
        .collect();

    SearchOutcome {
        hits,
        mode: SearchMode::KeywordOnly,
    }
}
