//! Command handlers.

mod ask;
mod config;
mod docs;
mod ingest;
mod status;

pub use ask::{AskArgs, handle_ask};
pub use config::{ConfigCommand, handle_config};
pub use docs::handle_docs;
pub use ingest::{IngestArgs, handle_ingest};
pub use status::handle_status;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::models::Config;
use crate::services::{
    AnswerGenerator, EmbeddingClient, QaService, Retriever, SharedIndex, SqliteDocumentStore,
    TextChunker, VectorIndex,
};

/// Load the persisted index if present and compatible, otherwise start empty.
pub(crate) fn load_index(config: &Config, verbose: bool) -> SharedIndex {
    let path = &config.storage.index_path;
    if path.exists() {
        match VectorIndex::load(path) {
            Ok(index) if index.dimension() == config.embedding.dimension => {
                return SharedIndex::new(index);
            }
            Ok(index) => {
                if verbose {
                    eprintln!(
                        "index file dimension {} does not match configured {}, starting fresh",
                        index.dimension(),
                        config.embedding.dimension
                    );
                }
            }
            Err(e) => {
                if verbose {
                    eprintln!("could not load index file: {}", e);
                }
            }
        }
    }
    SharedIndex::new(VectorIndex::new(config.embedding.dimension))
}

/// Wire up the pipeline from configuration.
///
/// The generation backend is only constructed when a command needs it, so
/// ingestion works without an API key.
pub(crate) fn build_service(config: &Config, need_generator: bool, verbose: bool) -> Result<QaService> {
    let store = Arc::new(
        SqliteDocumentStore::open(&config.storage.db_path)
            .context("failed to open document database")?,
    );
    let embedder = Arc::new(
        EmbeddingClient::new(&config.embedding).context("failed to create embedding client")?,
    );
    let generator = if need_generator {
        let generator =
            AnswerGenerator::new(&config.generation).context("generation backend not configured")?;
        Some(Arc::new(generator) as Arc<dyn crate::services::Generator>)
    } else {
        None
    };
    let chunker = TextChunker::new(&config.chunking).context("invalid chunking configuration")?;
    let retriever = Retriever::new(chunker, embedder.clone());
    let index = load_index(config, verbose);

    Ok(QaService::new(
        store,
        embedder,
        generator,
        retriever,
        index,
        Some(config.storage.index_path.clone()),
    ))
}
