//! Text chunking with overlap for embedding and retrieval.

use crate::error::ChunkError;
use crate::models::{ChunkingConfig, Document, DocumentChunk};

/// Splits document text into overlapping fixed-size chunks.
///
/// Chunking is deterministic and stride-based: each chunk starts
/// `chunk_size - overlap` chars after the previous one, so consecutive
/// chunks share exactly `overlap` chars and concatenating each chunk's
/// non-overlapping prefix reconstructs the source text. Retrieval re-chunks
/// documents with the same configuration used at ingestion; anything
/// position-dependent breaks if the two ever diverge.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Chunk size in characters.
    chunk_size: usize,
    /// Characters shared between consecutive chunks.
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. Rejects `overlap >= chunk_size` and zero sizes.
    pub fn new(config: &ChunkingConfig) -> Result<Self, ChunkError> {
        if config.chunk_size == 0 {
            return Err(ChunkError::ZeroChunkSize);
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(ChunkError::OverlapTooLarge {
                chunk_size: config.chunk_size,
                overlap: config.chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
        })
    }

    pub fn with_defaults() -> Self {
        // Default config always satisfies overlap < chunk_size.
        Self {
            chunk_size: ChunkingConfig::default().chunk_size,
            overlap: ChunkingConfig::default().chunk_overlap,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk a document into overlapping segments.
    ///
    /// Empty text yields no chunks; callers must treat that as an ingestion
    /// failure rather than indexing nothing. Text shorter than the chunk
    /// size yields exactly one chunk holding the whole text.
    pub fn chunk(&self, document: &Document) -> Vec<DocumentChunk> {
        let spans = self.split_spans(&document.content);
        let total = spans.len() as u32;

        spans
            .into_iter()
            .enumerate()
            .map(|(idx, (content, start, end))| {
                DocumentChunk::new(
                    &document.id,
                    content,
                    idx as u32,
                    total,
                    start as u64,
                    end as u64,
                )
            })
            .collect()
    }

    /// Split text into `(content, start, end)` spans over char positions.
    fn split_spans(&self, content: &str) -> Vec<(String, usize, usize)> {
        let chars: Vec<char> = content.chars().collect();
        let total_chars = chars.len();

        if total_chars == 0 {
            return Vec::new();
        }

        if total_chars <= self.chunk_size {
            return vec![(content.to_string(), 0, total_chars)];
        }

        let step = self.chunk_size - self.overlap;
        let mut spans = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(total_chars);
            spans.push((chars[start..end].iter().collect(), start, end));
            if end >= total_chars {
                break;
            }
            start += step;
        }

        spans
    }
}
