//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::core::{Response, RetrievedChunk, SessionHistory};
use crate::error::Error;
use crate::io::preview;
use crate::prompt::{PromptTemplate, TemplateSource};
use crate::storage::StorageStats;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Heading printed above the cited sources.
pub const SOURCES_HEADING: &str = "Source Documents";

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Numbered citation lines, one per retrieved chunk.
///
/// Chunks without a recorded source are labelled `Document {n}`.
#[must_use]
pub fn source_lines(sources: &[RetrievedChunk]) -> Vec<String> {
    sources
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("{}. {}", i + 1, chunk.source_label(i + 1)))
        .collect()
}

/// Formats an answer with its sources.
#[must_use]
pub fn format_response(response: &Response, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            output.push_str(response.answer.trim_end());
            output.push('\n');

            if !response.sources.is_empty() {
                let _ = writeln!(output, "\n{SOURCES_HEADING}");
                for line in source_lines(&response.sources) {
                    let _ = writeln!(output, "{line}");
                }
            }
            output
        }
        OutputFormat::Json => format_json(response),
    }
}

/// Formats retrieval-only search results.
#[must_use]
pub fn format_search(chunks: &[RetrievedChunk], query: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if chunks.is_empty() {
                return format!("No chunks retrieved for query: \"{query}\"\n");
            }

            let mut output = String::new();
            let _ = writeln!(
                output,
                "Retrieved {} chunks for \"{query}\":\n",
                chunks.len()
            );
            let _ = writeln!(
                output,
                "{:<4} {:<10} {:<8} {:<24} Preview",
                "#", "Chunk ID", "Score", "Source"
            );
            output.push_str(&"-".repeat(80));
            output.push('\n');

            for (i, chunk) in chunks.iter().enumerate() {
                let _ = writeln!(
                    output,
                    "{:<4} {:<10} {:<8.4} {:<24} {}",
                    i + 1,
                    chunk.chunk_id,
                    chunk.score,
                    preview(&chunk.source_label(i + 1), 24),
                    preview(&chunk.text, 40)
                );
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct SearchOutput<'a> {
                query: &'a str,
                count: usize,
                chunks: &'a [RetrievedChunk],
            }
            format_json(&SearchOutput {
                query,
                count: chunks.len(),
                chunks,
            })
        }
    }
}

/// Formats index statistics.
#[must_use]
pub fn format_status(stats: &StorageStats, index_dir: &Path, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            output.push_str("transcript-qa Index Status\n");
            output.push_str("==========================\n\n");
            let _ = writeln!(output, "  Index:         {}", index_dir.display());
            let _ = writeln!(output, "  Documents:     {}", stats.document_count);
            let _ = writeln!(output, "  Chunks:        {}", stats.chunk_count);
            let _ = writeln!(output, "  Embedded:      {}", stats.embedding_count);
            if let Some(dims) = stats.dimensions {
                let _ = writeln!(output, "  Dimensions:    {dims}");
            }
            if !stats.embedding_models.is_empty() {
                let _ = writeln!(
                    output,
                    "  Models:        {}",
                    stats.embedding_models.join(", ")
                );
            }
            let _ = writeln!(output, "  Schema:        v{}", stats.schema_version);
            if let Some(size) = stats.db_size {
                let _ = writeln!(output, "  DB size:       {}", format_size(size));
            }
            output
        }
        OutputFormat::Json => format_json(stats),
    }
}

/// Formats the session history.
#[must_use]
pub fn format_history(history: &SessionHistory, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if history.is_empty() {
                return "No messages yet.\n".to_string();
            }
            let mut output = String::new();
            for turn in history.turns() {
                let _ = writeln!(output, "[{}] {}", turn.role(), turn.content());
            }
            output
        }
        OutputFormat::Json => format_json(history),
    }
}

/// Formats the result of `prompt init`.
#[must_use]
pub fn format_prompt_init(dir: &Path, written: Option<&Path>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => written.map_or_else(
            || {
                format!(
                    "Template already exists in {}; left unchanged.\n",
                    dir.display()
                )
            },
            |path| format!("Wrote default template to {}\n", path.display()),
        ),
        OutputFormat::Json => format_json(&serde_json::json!({
            "dir": dir,
            "written": written,
        })),
    }
}

/// Formats the template shown by `prompt show`.
#[must_use]
pub fn format_template(template: &PromptTemplate, format: OutputFormat) -> String {
    let source = match template.source() {
        TemplateSource::Default => "default".to_string(),
        TemplateSource::File(path) => path.display().to_string(),
    };
    match format {
        OutputFormat::Text => {
            let mut output = format!("# source: {source}\n");
            output.push_str(template.text());
            if !template.text().ends_with('\n') {
                output.push('\n');
            }
            output
        }
        OutputFormat::Json => format_json(&serde_json::json!({
            "source": source,
            "template": template.text(),
        })),
    }
}

/// Formats an error for display.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            let kind = match error {
                Error::Storage(_) => "storage",
                Error::Retrieval(_) => "retrieval",
                Error::Completion(_) => "completion",
                Error::Io(_) => "io",
                Error::Command(_) => "command",
                Error::InvalidInput { .. } => "invalid_input",
                Error::Config { .. } => "config",
            };
            format_json(&serde_json::json!({
                "error": kind,
                "message": error.to_string(),
            }))
        }
    }
}

/// Formats a value as JSON.
fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a byte size as human-readable.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
