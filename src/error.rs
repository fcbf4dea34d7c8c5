//! Error types for the legal document Q&A CLI.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to text extraction from uploaded files.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file read error: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("unsupported file format: {0} (expected .txt or .md)")]
    UnsupportedFormat(String),

    #[error("document contains no extractable text")]
    EmptyDocument,
}

/// Errors related to chunking configuration.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("chunk size must be positive")]
    ZeroChunkSize,

    #[error("overlap ({overlap}) must be strictly less than chunk size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            EmbeddingError::ServerError(msg) => {
                msg.contains("503")
                    || msg.contains("502")
                    || msg.contains("504")
                    || msg.contains("429")
                    || msg.to_lowercase().contains("unavailable")
                    || msg.to_lowercase().contains("too many requests")
            }
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            EmbeddingError::InvalidResponse(_) | EmbeddingError::DimensionMismatch { .. } => false,
        }
    }
}

/// Errors related to the in-memory vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector dimension mismatch: index is {expected}, vector is {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index file error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("index serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Errors related to answer generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation API key is not configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("failed to connect to generation backend: {0}")]
    ConnectionError(String),

    #[error("generation backend error: {0}")]
    ServerError(String),

    #[error("generation request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("generation backend returned no text")]
    EmptyResponse,

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("generation timeout")]
    Timeout,
}

impl Retryable for GenerationError {
    fn is_retryable(&self) -> bool {
        match self {
            GenerationError::ConnectionError(_) | GenerationError::Timeout => true,
            GenerationError::ServerError(msg) => {
                msg.contains("503")
                    || msg.contains("502")
                    || msg.contains("429")
                    || msg.to_lowercase().contains("unavailable")
                    || msg.to_lowercase().contains("too many requests")
            }
            GenerationError::RequestError(e) => e.is_timeout() || e.is_connect(),
            GenerationError::MissingApiKey
            | GenerationError::EmptyResponse
            | GenerationError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to document storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("database path error: {0}")]
    PathError(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

/// Errors related to retrieval.
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

/// Errors related to document ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("document contains no extractable text")]
    EmptyDocument,

    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Input errors are surfaced immediately and must not be retried.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            IngestError::EmptyDocument | IngestError::Extract(_) | IngestError::Chunk(_)
        )
    }
}

/// Errors related to answering a question.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    #[error("retrieval error: {0}")]
    Retrieve(#[from] RetrieveError),

    #[error("AI processing failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl QueryError {
    /// Backend errors are safe for the caller to retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            QueryError::Generation(e) => e.is_retryable(),
            QueryError::Retrieve(RetrieveError::Embedding(e)) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_retryable() {
        assert!(EmbeddingError::ConnectionError("refused".into()).is_retryable());
        assert!(EmbeddingError::ServerError("status 503: busy".into()).is_retryable());
        assert!(
            !EmbeddingError::DimensionMismatch {
                expected: 768,
                actual: 384
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_generation_retryable() {
        assert!(GenerationError::Timeout.is_retryable());
        assert!(!GenerationError::MissingApiKey.is_retryable());
        assert!(!GenerationError::EmptyResponse.is_retryable());
    }

    #[test]
    fn test_query_error_kinds_distinct() {
        let backend = QueryError::Generation(GenerationError::Timeout);
        assert!(backend.is_retryable());
        assert!(backend.to_string().starts_with("AI processing failed"));

        let input = QueryError::InvalidQuestion("empty".into());
        assert!(!input.is_retryable());
    }

    #[test]
    fn test_ingest_input_errors() {
        assert!(IngestError::EmptyDocument.is_input_error());
        assert!(
            !IngestError::Embedding(EmbeddingError::Timeout).is_input_error()
        );
    }
}
