mod chunker;
mod embedding;
mod generation;
mod index;
mod metrics;
mod qa;
mod retriever;
mod store;

pub use chunker::TextChunker;
pub use embedding::{Embedder, EmbeddingClient, HealthResponse};
pub use generation::{AnswerGenerator, Generator};
pub use index::{IndexEntry, SearchHit, SharedIndex, VectorIndex};
pub use metrics::{MetricsStore, MetricsSummary};
pub use qa::{DocumentRef, IngestReceipt, QaService};
pub use retriever::{RetrievedChunk, Retriever};
pub use store::{DocumentStore, InMemoryDocumentStore, SqliteDocumentStore};

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic backends for tests; no network involved.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::{EmbeddingError, GenerationError};
    use crate::services::embedding::Embedder;
    use crate::services::generation::Generator;

    /// Keyword terms the stub projects text onto, one dimension each.
    const TERMS: [&str; 8] = [
        "section", "302", "420", "murder", "punishment", "cheating", "rent", "lease",
    ];

    /// Deterministic bag-of-keywords embedder. Texts sharing query terms land
    /// near each other under L2, which is all retrieval tests need.
    pub struct StubEmbedder {
        batch_calls: AtomicUsize,
    }

    impl StubEmbedder {
        pub fn new() -> Self {
            Self {
                batch_calls: AtomicUsize::new(0),
            }
        }

        pub fn batch_calls(&self) -> usize {
            self.batch_calls.load(Ordering::SeqCst)
        }

        fn embed(text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            let mut vector: Vec<f32> = TERMS
                .iter()
                .map(|term| lower.matches(term).count() as f32)
                .collect();
            // Length feature keeps otherwise-identical vectors apart.
            vector.push(lower.split_whitespace().count() as f32 * 0.01);
            vector
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        fn dimension(&self) -> usize {
            TERMS.len() + 1
        }

        async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| Self::embed(t)).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(Self::embed(text))
        }
    }

    /// Generator returning a canned answer or a canned failure.
    pub struct StubGenerator {
        answer: Option<String>,
        calls: AtomicUsize,
    }

    impl StubGenerator {
        pub fn answering(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                answer: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Generator for StubGenerator {
        async fn generate(&self, _question: &str, _context: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Some(answer) => Ok(answer.clone()),
                None => Err(GenerationError::ServerError(
                    "status 503: model overloaded".to_string(),
                )),
            }
        }
    }
}
