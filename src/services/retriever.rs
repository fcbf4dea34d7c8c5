//! Retrieval of the most relevant chunk for a query.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::RetrieveError;
use crate::models::Document;
use crate::services::chunker::TextChunker;
use crate::services::embedding::Embedder;
use crate::services::index::{IndexEntry, VectorIndex};

/// The chunk selected as most relevant to a query.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub content: String,
    pub chunk_index: u32,
    /// Squared L2 distance between the query vector and the chunk vector.
    pub distance: f32,
}

/// Cached chunk embeddings for one document. Invalidated whenever the
/// stored text's checksum changes.
#[derive(Debug, Clone)]
struct CachedEmbeddings {
    checksum: String,
    entries: Vec<IndexEntry>,
}

/// Finds the single most relevant chunk of a document for a query.
///
/// Each retrieval builds an ephemeral per-document index, so a query can
/// never observe another request's half-built state. Chunk embeddings are
/// cached per document id (seeded at ingestion) to avoid re-embedding on
/// every query; the checksum key invalidates the cache when a document's
/// text changes.
pub struct Retriever {
    chunker: TextChunker,
    embedder: Arc<dyn Embedder>,
    cache: Mutex<HashMap<String, CachedEmbeddings>>,
}

impl Retriever {
    pub fn new(chunker: TextChunker, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            chunker,
            embedder,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Seed the cache with embeddings computed at ingestion.
    pub fn seed_cache(&self, document: &Document, entries: Vec<IndexEntry>) {
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.insert(
            document.id.clone(),
            CachedEmbeddings {
                checksum: document.checksum.clone(),
                entries,
            },
        );
    }

    fn cached_entries(&self, document: &Document) -> Option<Vec<IndexEntry>> {
        let cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache
            .get(&document.id)
            .filter(|c| c.checksum == document.checksum)
            .map(|c| c.entries.clone())
    }

    /// Chunk and embed a document, or reuse cached embeddings.
    async fn document_entries(
        &self,
        document: &Document,
    ) -> Result<Vec<IndexEntry>, RetrieveError> {
        if let Some(entries) = self.cached_entries(document) {
            return Ok(entries);
        }

        let chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(texts).await?;

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();

        self.seed_cache(document, entries.clone());
        Ok(entries)
    }

    /// Retrieve the most relevant chunk of `document` for `query`.
    ///
    /// `Ok(None)` means the document has no chunks to search; callers
    /// surface it as "no relevant information", not as an error.
    pub async fn retrieve(
        &self,
        document: &Document,
        query: &str,
    ) -> Result<Option<RetrievedChunk>, RetrieveError> {
        let entries = self.document_entries(document).await?;
        if entries.is_empty() {
            return Ok(None);
        }

        let query_vector = self.embedder.embed_query(query).await?;
        let index = VectorIndex::from_entries(self.embedder.dimension(), entries)?;

        let hits = index.search(&query_vector, 1)?;
        let Some(hit) = hits.first() else {
            return Ok(None);
        };

        // Positions come from the index just built over these entries, so
        // the lookup cannot miss.
        let Some(entry) = index.entry(hit.position) else {
            return Ok(None);
        };

        Ok(Some(RetrievedChunk {
            content: entry.chunk.content.clone(),
            chunk_index: entry.chunk.chunk_index,
            distance: hit.distance,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkingConfig;
    use crate::services::testing::StubEmbedder;

    fn retriever(chunk_size: usize, overlap: usize) -> Retriever {
        let chunker = TextChunker::new(&ChunkingConfig {
            chunk_size,
            chunk_overlap: overlap,
        })
        .unwrap();
        Retriever::new(chunker, Arc::new(StubEmbedder::new()))
    }

    #[tokio::test]
    async fn test_retrieves_chunk_matching_query_terms() {
        let r = retriever(20, 5);
        let doc = Document::new(
            "ipc.txt",
            "Section 302 defines punishment for murder.".to_string(),
        );

        let hit = r.retrieve(&doc, "What is Section 302?").await.unwrap();
        let hit = hit.expect("expected a retrieved chunk");
        assert!(hit.content.contains("Section 302"));
    }

    #[tokio::test]
    async fn test_empty_document_retrieves_nothing() {
        let r = retriever(20, 5);
        let doc = Document::new("empty.txt", String::new());
        let hit = r.retrieve(&doc, "anything").await.unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn test_cache_reused_until_checksum_changes() {
        let r = retriever(20, 5);
        let embedder = Arc::new(StubEmbedder::new());
        let r = Retriever::new(r.chunker.clone(), embedder.clone());

        let doc = Document::new("ipc.txt", "Section 302 defines punishment.".to_string());
        r.retrieve(&doc, "Section 302").await.unwrap();
        let after_first = embedder.batch_calls();

        // Same content: cached embeddings are reused, only the query is embedded.
        r.retrieve(&doc, "Section 302 again").await.unwrap();
        assert_eq!(embedder.batch_calls(), after_first);

        // Changed content under the same filename: cache must be invalidated.
        let changed = Document::new("ipc.txt", "Section 420 covers cheating.".to_string());
        r.retrieve(&changed, "Section 420").await.unwrap();
        assert_eq!(embedder.batch_calls(), after_first + 1);
    }

    #[tokio::test]
    async fn test_seed_cache_avoids_recomputation() {
        let embedder = Arc::new(StubEmbedder::new());
        let chunker = TextChunker::new(&ChunkingConfig {
            chunk_size: 20,
            chunk_overlap: 5,
        })
        .unwrap();
        let r = Retriever::new(chunker.clone(), embedder.clone());

        let doc = Document::new("ipc.txt", "Section 302 defines punishment.".to_string());
        let chunks = chunker.chunk(&doc);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed_batch(texts).await.unwrap();
        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();
        r.seed_cache(&doc, entries);
        let seeded = embedder.batch_calls();

        r.retrieve(&doc, "Section 302").await.unwrap();
        assert_eq!(embedder.batch_calls(), seeded);
    }
}
