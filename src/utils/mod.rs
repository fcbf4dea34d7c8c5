//! Utility modules.

pub mod file;
pub mod retry;
pub mod text;

pub use file::{calculate_checksum, read_document_text};
pub use retry::{RetryConfig, RetryResult, Retryable, retry, with_retry};
pub use text::has_meaningful_content;
