use std::fmt::Write as FmtWrite;

use crate::models::{DocumentSummary, OutputFormat, QueryOutcome};
use crate::services::{IngestReceipt, MetricsSummary};

pub trait Formatter {
    fn format_outcome(&self, outcome: &QueryOutcome) -> String;
    fn format_receipt(&self, receipt: &IngestReceipt) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_docs(&self, docs: &[DocumentSummary]) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub embedding_url: String,
    pub embedding_connected: bool,
    pub embedding_model: Option<String>,
    pub embedding_dimension: usize,
    pub generation_model: String,
    pub generation_key_configured: bool,
    pub document_count: u64,
    pub index_size: u64,
    pub metrics: Option<MetricsSummary>,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_outcome(&self, outcome: &QueryOutcome) -> String {
        match outcome {
            QueryOutcome::Answered(answer) => {
                let mut output = String::new();
                writeln!(output, "{}", answer.answer).unwrap();
                writeln!(output).unwrap();
                writeln!(output, "Source: {}", answer.source).unwrap();
                writeln!(
                    output,
                    "Context: chunk at distance {:.3} ({}ms)",
                    answer.distance, answer.duration_ms
                )
                .unwrap();
                output
            }
            QueryOutcome::NoRelevantInformation => {
                "No relevant information found in the document.\n".to_string()
            }
        }
    }

    fn format_receipt(&self, receipt: &IngestReceipt) -> String {
        let mut output = String::new();
        writeln!(output, "Ingested '{}'", receipt.filename).unwrap();
        writeln!(output, "-----------------").unwrap();
        writeln!(output, "Document id:  {}", receipt.document_id).unwrap();
        writeln!(output, "Chunks:       {}", receipt.chunk_count).unwrap();
        writeln!(output, "Dimension:    {}", receipt.dimension).unwrap();
        writeln!(output, "Index size:   {}", receipt.index_size).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let embed_status = if status.embedding_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Embedding:   {}", embed_status).unwrap();
        writeln!(output, "  URL:       {}", status.embedding_url).unwrap();
        if let Some(ref model) = status.embedding_model {
            writeln!(output, "  Model:     {}", model).unwrap();
        }
        writeln!(output, "  Dimension: {}", status.embedding_dimension).unwrap();

        let key_status = if status.generation_key_configured {
            "[CONFIGURED]"
        } else {
            "[MISSING KEY]"
        };
        writeln!(output, "Generation:  {}", key_status).unwrap();
        writeln!(output, "  Model:     {}", status.generation_model).unwrap();

        writeln!(output, "Documents:   {}", status.document_count).unwrap();
        writeln!(output, "Index size:  {}", status.index_size).unwrap();

        if let Some(ref m) = status.metrics {
            writeln!(output, "Queries:     {}", m.total_queries).unwrap();
            writeln!(output, "  Answered:  {}", m.answered).unwrap();
            writeln!(output, "  Avg:       {}ms", m.avg_latency_ms).unwrap();
            if m.error_rate > 0.0 {
                writeln!(output, "  Errors:    {:.1}%", m.error_rate).unwrap();
            }
        }

        output
    }

    fn format_docs(&self, docs: &[DocumentSummary]) -> String {
        if docs.is_empty() {
            return "No documents ingested.\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "Documents").unwrap();
        writeln!(output, "---------").unwrap();
        for doc in docs {
            writeln!(
                output,
                "  {}  {} ({} chars, updated {})",
                doc.id, doc.filename, doc.size_chars, doc.updated_at
            )
            .unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, value: &serde_json::Value) -> String {
        if self.pretty {
            serde_json::to_string_pretty(value).unwrap_or_default()
        } else {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_outcome(&self, outcome: &QueryOutcome) -> String {
        match outcome {
            QueryOutcome::Answered(answer) => self.render(&serde_json::json!({
                "question": answer.question,
                "answer": answer.answer,
                "source": answer.source,
                "distance": answer.distance,
                "duration_ms": answer.duration_ms,
            })),
            QueryOutcome::NoRelevantInformation => {
                self.render(&serde_json::json!({"error": "no relevant information"}))
            }
        }
    }

    fn format_receipt(&self, receipt: &IngestReceipt) -> String {
        self.render(&serde_json::json!({
            "document_id": receipt.document_id,
            "filename": receipt.filename,
            "chunk_count": receipt.chunk_count,
            "dimension": receipt.dimension,
            "index_size": receipt.index_size,
        }))
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let metrics = status.metrics.as_ref().map(|m| {
            serde_json::json!({
                "total_queries": m.total_queries,
                "answered": m.answered,
                "avg_latency_ms": m.avg_latency_ms,
                "error_rate": m.error_rate,
            })
        });

        self.render(&serde_json::json!({
            "embedding": {
                "url": status.embedding_url,
                "connected": status.embedding_connected,
                "model": status.embedding_model,
                "dimension": status.embedding_dimension,
            },
            "generation": {
                "model": status.generation_model,
                "key_configured": status.generation_key_configured,
            },
            "documents": status.document_count,
            "index_size": status.index_size,
            "metrics": metrics,
        }))
    }

    fn format_docs(&self, docs: &[DocumentSummary]) -> String {
        let array: Vec<serde_json::Value> = docs
            .iter()
            .map(|d| {
                serde_json::json!({
                    "id": d.id,
                    "filename": d.filename,
                    "size_chars": d.size_chars,
                    "updated_at": d.updated_at,
                })
            })
            .collect();
        self.render(&serde_json::json!({"documents": array}))
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_outcome(&self, outcome: &QueryOutcome) -> String {
        match outcome {
            QueryOutcome::Answered(answer) => {
                let mut output = String::new();
                writeln!(output, "## Answer\n").unwrap();
                writeln!(output, "{}\n", answer.answer).unwrap();
                writeln!(output, "**Source:** {}\n", answer.source).unwrap();
                writeln!(output, "**Context:**\n").unwrap();
                writeln!(output, "```").unwrap();
                writeln!(output, "{}", answer.context).unwrap();
                writeln!(output, "```").unwrap();
                output
            }
            QueryOutcome::NoRelevantInformation => {
                "> No relevant information found in the document.\n".to_string()
            }
        }
    }

    fn format_receipt(&self, receipt: &IngestReceipt) -> String {
        let mut output = String::new();
        writeln!(output, "## Ingested `{}`\n", receipt.filename).unwrap();
        writeln!(output, "| Field | Value |").unwrap();
        writeln!(output, "|-------|-------|").unwrap();
        writeln!(output, "| Document id | `{}` |", receipt.document_id).unwrap();
        writeln!(output, "| Chunks | {} |", receipt.chunk_count).unwrap();
        writeln!(output, "| Dimension | {} |", receipt.dimension).unwrap();
        writeln!(output, "| Index size | {} |", receipt.index_size).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        let embed = if status.embedding_connected { "✅" } else { "❌" };
        writeln!(output, "### Embedding {}\n", embed).unwrap();
        writeln!(output, "- **URL:** `{}`", status.embedding_url).unwrap();
        if let Some(ref model) = status.embedding_model {
            writeln!(output, "- **Model:** {}", model).unwrap();
        }
        writeln!(output, "- **Dimension:** {}\n", status.embedding_dimension).unwrap();

        let key = if status.generation_key_configured {
            "✅"
        } else {
            "❌"
        };
        writeln!(output, "### Generation {}\n", key).unwrap();
        writeln!(output, "- **Model:** {}\n", status.generation_model).unwrap();

        writeln!(output, "- **Documents:** {}", status.document_count).unwrap();
        writeln!(output, "- **Index size:** {}", status.index_size).unwrap();
        output
    }

    fn format_docs(&self, docs: &[DocumentSummary]) -> String {
        if docs.is_empty() {
            return "## Documents\n\n*No documents ingested.*\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "## Documents\n").unwrap();
        writeln!(output, "| Id | Filename | Chars | Updated |").unwrap();
        writeln!(output, "|----|----------|-------|---------|").unwrap();
        for doc in docs {
            writeln!(
                output,
                "| `{}` | {} | {} | {} |",
                doc.id, doc.filename, doc.size_chars, doc.updated_at
            )
            .unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Answer, AnswerSource};

    fn answered() -> QueryOutcome {
        QueryOutcome::Answered(Answer {
            question: "What is Section 302?".into(),
            answer: "It defines punishment for murder.".into(),
            source: AnswerSource::Document {
                id: "abc".into(),
                filename: "ipc.txt".into(),
            },
            context: "Section 302 defines ".into(),
            distance: 0.12,
            duration_ms: 42,
        })
    }

    #[test]
    fn test_text_formatter_outcomes() {
        let f = TextFormatter;
        let out = f.format_outcome(&answered());
        assert!(out.contains("punishment for murder"));
        assert!(out.contains("ipc.txt"));

        let out = f.format_outcome(&QueryOutcome::NoRelevantInformation);
        assert!(out.contains("No relevant information"));
    }

    #[test]
    fn test_json_formatter_error_shape() {
        let f = JsonFormatter::new(false);
        let out = f.format_outcome(&QueryOutcome::NoRelevantInformation);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["error"], "no relevant information");

        let out = f.format_error("AI processing failed: status 503");
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(value["error"].as_str().unwrap().starts_with("AI processing failed"));
    }

    #[test]
    fn test_markdown_formatter_shows_context() {
        let f = MarkdownFormatter;
        let out = f.format_outcome(&answered());
        assert!(out.contains("## Answer"));
        assert!(out.contains("Section 302 defines "));
    }
}
