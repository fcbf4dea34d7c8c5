//! File utilities for document ingestion.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::ExtractError;

/// Calculate SHA-256 checksum of content.
pub fn calculate_checksum(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    hex::encode(hash)
}

/// Read the text of a document file.
///
/// Only plain-text formats are handled here; anything else (PDF, DOCX,
/// images) is an explicit `UnsupportedFormat` error, never partial text.
/// An empty or whitespace-only file is an `EmptyDocument` error so callers
/// cannot mistake a failed extraction for a successful one.
pub fn read_document_text(path: &Path) -> Result<String, ExtractError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if !matches!(ext.as_str(), "txt" | "md" | "markdown") {
        return Err(ExtractError::UnsupportedFormat(ext));
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Err(ExtractError::EmptyDocument);
    }
    Ok(content)
}
