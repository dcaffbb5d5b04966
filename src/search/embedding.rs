//! Remote embedding provider
//!
//! Sends `{"inputs": [text]}` to a feature-extraction endpoint and accepts
//! either a flat vector or a one-element list holding that vector. Anything
//! that is not exactly `EMBEDDING_DIM` floats is a failure.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::config::EmbeddingConfig;

/// Embedding dimension of all-MiniLM-L6-v2
pub const EMBEDDING_DIM: usize = 384;

/// Credentials that don't start with this are rejected before any request.
pub const CREDENTIAL_PREFIX: &str = "hf_";

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding API key is missing")]
    MissingCredential,
    #[error("embedding API key does not start with `hf_`")]
    MalformedCredential,
    #[error("embedding request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("embedding endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unrecognized embedding response shape")]
    UnrecognizedShape,
    #[error("embedding has {actual} dimensions, expected {expected}")]
    Dimension { expected: usize, actual: usize },
}

/// Turns text into a fixed-dimension vector.
///
/// Implementations never hand back a vector whose length differs from
/// `EMBEDDING_DIM`; such results surface as `EmbeddingError::Dimension`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// False when every `embed` call is known to fail without a request.
    fn is_enabled(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    inputs: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Flat(Vec<f32>),
    Nested(Vec<Vec<f32>>),
}

/// Check a response body and unwrap at most one level of nesting.
pub fn parse_embedding(body: serde_json::Value) -> Result<Vec<f32>, EmbeddingError> {
    let embedding = match serde_json::from_value::<EmbeddingResponse>(body) {
        Ok(EmbeddingResponse::Flat(v)) => v,
        Ok(EmbeddingResponse::Nested(mut outer)) if outer.len() == 1 => outer.remove(0),
        Ok(EmbeddingResponse::Nested(_)) | Err(_) => return Err(EmbeddingError::UnrecognizedShape),
    };

    if embedding.len() != EMBEDDING_DIM {
        return Err(EmbeddingError::Dimension {
            expected: EMBEDDING_DIM,
            actual: embedding.len(),
        });
    }
    Ok(embedding)
}

/// HTTP client for the feature-extraction endpoint.
///
/// No retries: every `embed` call is at most one request.
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: String,
    api_key: Result<String, CredentialState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredentialState {
    Missing,
    Malformed,
}

impl HttpEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let api_key = check_credential(config.api_key.as_deref());

        match &api_key {
            Ok(key) => {
                let prefix: String = key.chars().take(8).collect();
                info!("embedding API key loaded ({prefix}...)");
            }
            Err(CredentialState::Missing) => {
                warn!("embedding API key missing; semantic search disabled")
            }
            Err(CredentialState::Malformed) => warn!(
                "embedding API key does not start with `{CREDENTIAL_PREFIX}`; \
                 semantic search disabled"
            ),
        }

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }
}

fn check_credential(key: Option<&str>) -> Result<String, CredentialState> {
    match key.map(str::trim) {
        None | Some("") => Err(CredentialState::Missing),
        Some(k) if !k.starts_with(CREDENTIAL_PREFIX) => Err(CredentialState::Malformed),
        Some(k) => Ok(k.to_string()),
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let api_key = match &self.api_key {
            Ok(key) => key,
            Err(CredentialState::Missing) => return Err(EmbeddingError::MissingCredential),
            Err(CredentialState::Malformed) => return Err(EmbeddingError::MalformedCredential),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&EmbeddingRequest { inputs: [text] })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        let embedding = parse_embedding(body)?;
        debug!(chars = text.len(), "embedding received");
        Ok(embedding)
    }

    fn is_enabled(&self) -> bool {
        self.api_key.is_ok()
    }
}

/// Cosine similarity between two embeddings
///
/// Zero when the lengths differ or either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        warn!("vector dimension mismatch: {} vs {}", a.len(), b.len());
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}
