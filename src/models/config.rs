use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11411";
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;
pub const DEFAULT_GENERATION_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-1.5-pro";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lexdoc").join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            return Ok(config);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Cross-section validation on load. Chunking invariants are enforced
    /// again by the chunker itself.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunking.chunk_size must be positive".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "chunking.chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    /// Vector length the embedding server is expected to produce. Must match
    /// the dimension of every index built from its output.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_dimension() -> usize {
    DEFAULT_EMBEDDING_DIMENSION
}

fn default_timeout() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    8
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            dimension: default_dimension(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_url")]
    pub url: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    /// API key for the generation backend. Usually left unset here and
    /// supplied via the GEMINI_API_KEY environment variable instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Upper bound on the retrieved context included in a prompt.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_generation_url() -> String {
    DEFAULT_GENERATION_URL.to_string()
}

fn default_generation_model() -> String {
    DEFAULT_GENERATION_MODEL.to_string()
}

fn default_generation_timeout() -> u64 {
    60
}

fn default_max_context_chars() -> usize {
    8000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_generation_url(),
            model: default_generation_model(),
            api_key: None,
            timeout_secs: default_generation_timeout(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

impl GenerationConfig {
    /// Resolve the API key from config or environment, in that order.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    512
}

fn default_chunk_overlap() -> usize {
    100
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database holding documents and query metrics.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Serialized vector index, loaded at startup and written after each
    /// ingestion.
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lexdoc")
}

fn default_db_path() -> PathBuf {
    data_dir().join("documents.db")
}

fn default_index_path() -> PathBuf {
    data_dir().join("index.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            index_path: default_index_path(),
        }
    }
}
