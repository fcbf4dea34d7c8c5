//! Ingestion and question-answering orchestration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, IngestError, QueryError};
use crate::models::{Answer, AnswerSource, Document, QueryOutcome};
use crate::services::embedding::Embedder;
use crate::services::generation::Generator;
use crate::services::index::{IndexEntry, SharedIndex};
use crate::services::retriever::Retriever;
use crate::services::store::DocumentStore;
use crate::utils::has_meaningful_content;
use crate::utils::retry::{RetryConfig, with_retry};

/// What a question should be answered against.
#[derive(Debug, Clone)]
pub enum DocumentRef {
    /// A stored document, looked up by id first, then by filename.
    Stored(String),
    /// Raw text supplied directly with the question.
    Text(String),
}

/// Result of a successful ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub document_id: String,
    pub filename: String,
    pub chunk_count: usize,
    pub dimension: usize,
    /// Total vectors in the shared index after this ingestion.
    pub index_size: usize,
}

/// Orchestrates the pipeline: chunk, embed, index on ingestion; retrieve
/// and generate on query. The embedder and shared index are process-wide;
/// all index mutation goes through [`SharedIndex`]'s swap discipline.
pub struct QaService {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn Embedder>,
    generator: Option<Arc<dyn Generator>>,
    retriever: Retriever,
    index: SharedIndex,
    index_path: Option<PathBuf>,
    retry: RetryConfig,
}

impl QaService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn Embedder>,
        generator: Option<Arc<dyn Generator>>,
        retriever: Retriever,
        index: SharedIndex,
        index_path: Option<PathBuf>,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            retriever,
            index,
            index_path,
            retry: RetryConfig::default(),
        }
    }

    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    /// Ingest a document: chunk, embed, store, and swap the shared index.
    ///
    /// Text without meaningful content is an input error; nothing is added
    /// to the index or the store. Re-ingesting a filename replaces its
    /// content and its index entries (the index never holds two copies).
    pub async fn ingest(&self, filename: &str, text: String) -> Result<IngestReceipt, IngestError> {
        if !has_meaningful_content(&text) {
            return Err(IngestError::EmptyDocument);
        }

        let document = Document::new(filename, text);
        let chunks = self.retriever.chunker().chunk(&document);
        if chunks.is_empty() {
            return Err(IngestError::EmptyDocument);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = with_retry(&self.retry, || self.embedder.embed_batch(texts.clone()))
            .await
            .into_result()?;

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();
        let chunk_count = entries.len();

        self.store.put(&document)?;
        self.retriever.seed_cache(&document, entries.clone());

        let snapshot = self.index.replace_document(&document.id, entries)?;
        if let Some(ref path) = self.index_path {
            snapshot.save(path)?;
        }

        Ok(IngestReceipt {
            document_id: document.id,
            filename: filename.to_string(),
            chunk_count,
            dimension: self.embedder.dimension(),
            index_size: snapshot.len(),
        })
    }

    /// Answer a question against a document.
    ///
    /// Three outcomes stay distinguishable: `Answered`, `NoRelevantInformation`
    /// (unknown document, empty text, or nothing retrievable — the generator
    /// is never called), and `Err(QueryError::Generation)` when the backend
    /// fails ("AI processing failed").
    pub async fn ask(&self, question: &str, target: DocumentRef) -> Result<QueryOutcome, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::InvalidQuestion(
                "question cannot be empty".to_string(),
            ));
        }

        let start = Instant::now();

        let (document, source) = match target {
            DocumentRef::Stored(ref key) => {
                let found = match self.store.get(key)? {
                    Some(doc) => Some(doc),
                    None => self.store.get_by_filename(key)?,
                };
                match found {
                    Some(doc) => {
                        let source = AnswerSource::Document {
                            id: doc.id.clone(),
                            filename: doc.filename.clone(),
                        };
                        (doc, source)
                    }
                    None => return Ok(QueryOutcome::NoRelevantInformation),
                }
            }
            DocumentRef::Text(text) => {
                if !has_meaningful_content(&text) {
                    return Ok(QueryOutcome::NoRelevantInformation);
                }
                (Document::new("(pasted text)", text), AnswerSource::RawText)
            }
        };

        let Some(retrieved) = self.retriever.retrieve(&document, question).await? else {
            return Ok(QueryOutcome::NoRelevantInformation);
        };

        let generator = self
            .generator
            .as_ref()
            .ok_or(QueryError::Generation(GenerationError::MissingApiKey))?;

        let answer_text = generator.generate(question, &retrieved.content).await?;

        Ok(QueryOutcome::Answered(Answer {
            question: question.to_string(),
            answer: answer_text,
            source,
            context: retrieved.content,
            distance: retrieved.distance,
            duration_ms: start.elapsed().as_millis() as u64,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkingConfig;
    use crate::services::chunker::TextChunker;
    use crate::services::index::VectorIndex;
    use crate::services::store::InMemoryDocumentStore;
    use crate::services::testing::{StubEmbedder, StubGenerator};

    fn service(generator: Arc<StubGenerator>) -> (QaService, Arc<StubEmbedder>) {
        let embedder = Arc::new(StubEmbedder::new());
        let chunker = TextChunker::new(&ChunkingConfig {
            chunk_size: 20,
            chunk_overlap: 5,
        })
        .unwrap();
        let retriever = Retriever::new(chunker, embedder.clone());
        let index = SharedIndex::new(VectorIndex::new(embedder.dimension()));
        let qa = QaService::new(
            Arc::new(InMemoryDocumentStore::new()),
            embedder.clone(),
            Some(generator as Arc<dyn Generator>),
            retriever,
            index,
            None,
        );
        (qa, embedder)
    }

    #[tokio::test]
    async fn test_ingest_then_ask() {
        let generator = Arc::new(StubGenerator::answering("Life imprisonment or death."));
        let (qa, _) = service(generator.clone());

        let receipt = qa
            .ingest("ipc.txt", "Section 302 defines punishment for murder.".to_string())
            .await
            .unwrap();
        assert!(receipt.chunk_count >= 2);
        assert_eq!(receipt.index_size, receipt.chunk_count);

        let outcome = qa
            .ask(
                "What is Section 302?",
                DocumentRef::Stored(receipt.document_id.clone()),
            )
            .await
            .unwrap();

        match outcome {
            QueryOutcome::Answered(answer) => {
                assert_eq!(answer.answer, "Life imprisonment or death.");
                assert!(answer.context.contains("Section 302"));
                match answer.source {
                    AnswerSource::Document { id, .. } => assert_eq!(id, receipt.document_id),
                    other => panic!("unexpected source: {:?}", other),
                }
            }
            other => panic!("expected an answer, got {:?}", other),
        }
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_ask_by_filename() {
        let (qa, _) = service(Arc::new(StubGenerator::answering("ok")));
        qa.ingest("lease.txt", "The lessee shall pay rent monthly in advance.".to_string())
            .await
            .unwrap();

        let outcome = qa
            .ask("When is rent due?", DocumentRef::Stored("lease.txt".to_string()))
            .await
            .unwrap();
        assert!(outcome.is_answered());
    }

    #[tokio::test]
    async fn test_empty_document_is_input_error() {
        let (qa, _) = service(Arc::new(StubGenerator::answering("ok")));

        let err = qa.ingest("empty.txt", "   \n ".to_string()).await.unwrap_err();
        assert!(matches!(err, IngestError::EmptyDocument));
        assert!(err.is_input_error());
        // Nothing was added to the shared index.
        assert_eq!(qa.index().len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_document_skips_generator() {
        let generator = Arc::new(StubGenerator::answering("should never run"));
        let (qa, _) = service(generator.clone());

        let outcome = qa
            .ask("What is Section 302?", DocumentRef::Stored("missing".to_string()))
            .await
            .unwrap();
        assert!(matches!(outcome, QueryOutcome::NoRelevantInformation));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_generator_failure_is_distinct_outcome() {
        let generator = Arc::new(StubGenerator::failing());
        let (qa, _) = service(generator);

        qa.ingest("ipc.txt", "Section 302 defines punishment for murder.".to_string())
            .await
            .unwrap();

        let err = qa
            .ask("What is Section 302?", DocumentRef::Stored("ipc.txt".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Generation(_)));
        assert!(err.to_string().contains("AI processing failed"));
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let (qa, _) = service(Arc::new(StubGenerator::answering("ok")));
        let text = "Section 302 defines punishment for murder.".to_string();

        let first = qa.ingest("ipc.txt", text.clone()).await.unwrap();
        let second = qa.ingest("ipc.txt", text).await.unwrap();

        assert_eq!(first.document_id, second.document_id);
        assert_eq!(first.chunk_count, second.chunk_count);
        // Reset-and-rebuild: one document's chunks, not two.
        assert_eq!(qa.index().len(), first.chunk_count);
    }

    #[tokio::test]
    async fn test_ask_raw_text() {
        let (qa, _) = service(Arc::new(StubGenerator::answering("From the pasted clause.")));

        let outcome = qa
            .ask(
                "What does the clause say?",
                DocumentRef::Text("The tenant shall maintain the premises in good repair.".to_string()),
            )
            .await
            .unwrap();

        match outcome {
            QueryOutcome::Answered(answer) => {
                assert!(matches!(answer.source, AnswerSource::RawText));
            }
            other => panic!("expected an answer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let (qa, _) = service(Arc::new(StubGenerator::answering("ok")));
        let err = qa
            .ask("   ", DocumentRef::Text("some document text".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuestion(_)));
    }

    #[tokio::test]
    async fn test_ingest_persists_index_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let embedder = Arc::new(StubEmbedder::new());
        let chunker = TextChunker::new(&ChunkingConfig {
            chunk_size: 20,
            chunk_overlap: 5,
        })
        .unwrap();
        let qa = QaService::new(
            Arc::new(InMemoryDocumentStore::new()),
            embedder.clone(),
            None,
            Retriever::new(chunker, embedder.clone()),
            SharedIndex::new(VectorIndex::new(embedder.dimension())),
            Some(path.clone()),
        );

        let receipt = qa
            .ingest("ipc.txt", "Section 302 defines punishment for murder.".to_string())
            .await
            .unwrap();

        let loaded = VectorIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), receipt.chunk_count);
        assert_eq!(loaded.dimension(), embedder.dimension());
    }
}
