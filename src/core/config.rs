//! Configuration loaded from `.notes/config.yaml` plus environment overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Feature-extraction endpoint for all-MiniLM-L6-v2 (384 dimensions).
pub const DEFAULT_ENDPOINT: &str = "https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction";

/// Environment variable that overrides `embedding.api_key`.
pub const API_KEY_ENV: &str = "HF_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: Option<PathBuf>,
    pub embedding: EmbeddingConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pause between sequential backfill calls (free-tier rate limit guard)
    pub backfill_delay_ms: u64,
    /// Cap on concurrent creation-time embedding calls
    pub max_concurrent: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backfill_delay_ms: 500,
            max_concurrent: 4,
        }
    }
}

impl PipelineConfig {
    pub fn backfill_delay(&self) -> Duration {
        Duration::from_millis(self.backfill_delay_ms)
    }
}

impl Config {
    /// Load config from `path` if it exists, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            Self::from_yaml(&raw)
                .with_context(|| format!("Invalid config {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.apply_api_key(key);
        }

        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    fn apply_api_key(&mut self, key: String) {
        let key = key.trim().to_string();
        if !key.is_empty() {
            self.embedding.api_key = Some(key);
        }
    }

    /// Database path, relative paths resolved against `root`.
    pub fn database_path(&self, root: &Path) -> PathBuf {
        match &self.database {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join(".notes/notes.db"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.embedding.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.embedding.timeout(), Duration::from_secs(30));
        assert_eq!(config.pipeline.backfill_delay(), Duration::from_millis(500));
        assert_eq!(config.pipeline.max_concurrent, 4);
        assert_eq!(
            config.database_path(Path::new("/srv/notes")),
            PathBuf::from("/srv/notes/.notes/notes.db")
        );
    }

    #[test]
    fn test_partial_yaml() {
        let raw = r#"
database: data/my.db
embedding:
  api_key: hf_abc123
pipeline:
  backfill_delay_ms: 0
"#;
        let config = Config::from_yaml(raw).unwrap();
        assert_eq!(config.embedding.api_key.as_deref(), Some("hf_abc123"));
        assert_eq!(config.embedding.timeout_secs, 30);
        assert_eq!(config.pipeline.backfill_delay_ms, 0);
        assert_eq!(config.pipeline.max_concurrent, 4);
        assert_eq!(
            config.database_path(Path::new("/srv/notes")),
            PathBuf::from("/srv/notes/data/my.db")
        );
    }

    #[test]
    fn test_load_file_and_blank_override_ignored() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "embedding:\n  timeout_secs: 5\n")?;

        let mut config = Config::load(&path)?;
        assert_eq!(config.embedding.timeout_secs, 5);

        config.apply_api_key("   ".to_string());
        config.apply_api_key(" hf_xyz ".to_string());
        assert_eq!(config.embedding.api_key.as_deref(), Some("hf_xyz"));
        Ok(())
    }

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::load(&dir.path().join("absent.yaml"))?;
        assert_eq!(config.pipeline.max_concurrent, 4);
        Ok(())
    }
}
