mod answer;
mod config;
mod document;

pub use answer::{Answer, AnswerSource, OutputFormat, QueryOutcome};
pub use config::{
    ChunkingConfig, Config, DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_URL,
    DEFAULT_GENERATION_MODEL, DEFAULT_GENERATION_URL, EmbeddingConfig, GenerationConfig,
    StorageConfig,
};
pub use document::{Document, DocumentChunk, DocumentSummary};
