use serde::{Deserialize, Serialize};

/// An ingested legal document. Content is immutable once stored;
/// re-ingesting the same filename overwrites it under the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub content: String,
    pub checksum: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Listing row for `lexdoc docs`; omits the full content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub size_chars: u64,
    pub updated_at: String,
}

/// A contiguous, overlapping slice of a document. Regenerated on demand from
/// the document text; offsets are char positions into the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub start_offset: u64,
    pub end_offset: u64,
}

impl Document {
    /// Stable id derived from the filename, so re-uploads of the same file
    /// replace the previous version.
    pub fn generate_id(filename: &str) -> String {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(filename.as_bytes());
        hex::encode(&hash[..16])
    }

    pub fn new(filename: impl Into<String>, content: String) -> Self {
        let filename = filename.into();
        let id = Self::generate_id(&filename);
        let checksum = crate::utils::calculate_checksum(&content);
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id,
            filename,
            content,
            checksum,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            filename: self.filename.clone(),
            size_chars: self.content.chars().count() as u64,
            updated_at: self.updated_at.clone(),
        }
    }
}

impl DocumentChunk {
    pub fn generate_id(document_id: &str, chunk_index: u32) -> String {
        use uuid::Uuid;
        let name = format!("{}:{}", document_id, chunk_index);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    pub fn new(
        document_id: &str,
        content: String,
        chunk_index: u32,
        total_chunks: u32,
        start_offset: u64,
        end_offset: u64,
    ) -> Self {
        let id = Self::generate_id(document_id, chunk_index);
        Self {
            id,
            document_id: document_id.to_string(),
            content,
            chunk_index,
            total_chunks,
            start_offset,
            end_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_generate_id_stable() {
        let a = Document::generate_id("ipc.txt");
        let b = Document::generate_id("ipc.txt");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, Document::generate_id("other.txt"));
    }

    #[test]
    fn test_chunk_generate_id() {
        let id = DocumentChunk::generate_id("abc123", 5);
        assert_eq!(id.len(), 36);
        assert_eq!(id.chars().filter(|c| *c == '-').count(), 4);
        let id2 = DocumentChunk::generate_id("abc123", 5);
        assert_eq!(id, id2);
        let id3 = DocumentChunk::generate_id("abc123", 6);
        assert_ne!(id, id3);
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new("contract.txt", "whereas the parties agree".to_string());
        assert!(!doc.id.is_empty());
        assert!(!doc.checksum.is_empty());
        assert_eq!(doc.created_at, doc.updated_at);
    }

    #[test]
    fn test_reingest_same_filename_keeps_id() {
        let first = Document::new("contract.txt", "version one".to_string());
        let second = Document::new("contract.txt", "version two".to_string());
        assert_eq!(first.id, second.id);
        assert_ne!(first.checksum, second.checksum);
    }
}
