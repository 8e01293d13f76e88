//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::cli::output::{
    OutputFormat, format_prompt_init, format_response, format_search, format_status,
    format_template,
};
use crate::cli::parser::{Cli, Commands, PromptCommands};
use crate::cli::repl::run_chat;
use crate::config::Settings;
use crate::embedding::create_embedder;
use crate::error::{CommandError, Error, Result};
use crate::prompt::PromptTemplate;
use crate::retrieval::{Retriever, SqliteVectorIndex};
use crate::session::ChatSession;
use crate::storage::{INDEX_DB_NAME, SqliteStorage, Storage};
use std::path::Path;
use tokio::runtime::Runtime;

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success. The `chat` command prints as it
/// goes and returns an empty string.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let settings = cli.settings();

    match &cli.command {
        Commands::Chat => cmd_chat(&settings),
        Commands::Ask { question } => cmd_ask(&settings, question, format),
        Commands::Search { query } => cmd_search(&settings, query, format),
        Commands::Status => cmd_status(&settings.index_dir, format),
        Commands::Prompt(PromptCommands::Init { dir }) => {
            cmd_prompt_init(dir.as_deref(), format)
        }
        Commands::Prompt(PromptCommands::Show) => cmd_prompt_show(&settings, format),
    }
}

/// Builds the runtime that drives completion calls.
fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            Error::from(CommandError::ExecutionFailed(format!(
                "Failed to start async runtime: {e}"
            )))
        })
}

fn cmd_chat(settings: &Settings) -> Result<String> {
    let mut session = ChatSession::from_settings(settings)?;
    let runtime = runtime()?;
    run_chat(&mut session, &runtime)?;
    Ok(String::new())
}

fn cmd_ask(settings: &Settings, question: &str, format: OutputFormat) -> Result<String> {
    let mut session = ChatSession::from_settings(settings)?;
    let runtime = runtime()?;
    let response = runtime.block_on(session.submit(question))?;
    Ok(format_response(&response, format))
}

fn cmd_search(settings: &Settings, query: &str, format: OutputFormat) -> Result<String> {
    settings.validate()?;
    if query.trim().is_empty() {
        return Err(Error::invalid_input("query is empty"));
    }

    let embedder = create_embedder(settings.embedder)?;
    let index = SqliteVectorIndex::open(&settings.index_dir, embedder, settings.fetch_k)?;
    let retriever = Retriever::new(Box::new(index), settings.top_k, settings.diversity);

    let chunks = retriever.try_retrieve(query.trim())?;
    Ok(format_search(&chunks, query.trim(), format))
}

fn cmd_status(index_dir: &Path, format: OutputFormat) -> Result<String> {
    let storage = SqliteStorage::open_read_only(index_dir.join(INDEX_DB_NAME))?;
    storage.ensure_readable()?;
    let stats = storage.stats()?;
    Ok(format_status(&stats, index_dir, format))
}

fn cmd_prompt_init(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => PromptTemplate::default_dir().ok_or_else(|| {
            Error::config("could not determine the home directory; pass --dir")
        })?,
    };

    let written = PromptTemplate::write_default(&dir)?;
    Ok(format_prompt_init(&dir, written.as_deref(), format))
}

fn cmd_prompt_show(settings: &Settings, format: OutputFormat) -> Result<String> {
    let template = PromptTemplate::load(settings.prompt_file.as_deref())?;
    Ok(format_template(&template, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Chunk, Document};
    use crate::embedding::{Embedder, EmbedderKind, FallbackEmbedder};
    use clap::Parser;
    use tempfile::TempDir;

    fn build_index(dir: &Path) {
        let mut storage = SqliteStorage::open(dir.join(INDEX_DB_NAME)).unwrap();
        storage.init().unwrap();
        let doc_id = storage
            .add_document(&Document::new("itc-q4-fy23.pdf"))
            .unwrap();
        let texts = [
            "FY23 revenue: ₹70,000 Cr",
            "Cigarette volumes grew in the quarter",
            "Hotels segment EBITDA margin expanded",
        ];
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(doc_id, (*t).to_string(), i))
            .collect();
        storage.add_chunks(doc_id, &chunks).unwrap();

        let embedder = FallbackEmbedder::new(crate::embedding::DEFAULT_DIMENSIONS);
        let embeddings: Vec<(i64, Vec<f32>)> = storage
            .get_chunks(doc_id)
            .unwrap()
            .iter()
            .map(|c| (c.id.unwrap(), embedder.embed(&c.content).unwrap()))
            .collect();
        storage
            .store_embeddings_batch(&embeddings, Some(embedder.model_name()))
            .unwrap();
    }

    fn cli(dir: &TempDir, args: &[&str]) -> Cli {
        let index_dir = dir.path().to_string_lossy().to_string();
        let mut argv = vec![
            "transcript-qa",
            "--index-dir",
            index_dir.as_str(),
            "--embedder",
            "hash",
        ];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_status_reports_counts() {
        let dir = TempDir::new().unwrap();
        build_index(dir.path());

        let output = execute(&cli(&dir, &["status"])).unwrap();
        assert!(output.contains("Documents:     1"));
        assert!(output.contains("Chunks:        3"));
        assert!(output.contains("hash-fallback-v2"));
    }

    #[test]
    fn test_status_missing_index() {
        let dir = TempDir::new().unwrap();
        let err = execute(&cli(&dir, &["status"])).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_search_returns_top_k() {
        let dir = TempDir::new().unwrap();
        build_index(dir.path());

        let output = execute(&cli(&dir, &["--format", "json", "search", "FY23 revenue"])).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["count"], 3);
        assert_eq!(json["chunks"][0]["text"], "FY23 revenue: ₹70,000 Cr");
        assert_eq!(json["chunks"][0]["source"], "itc-q4-fy23.pdf");
    }

    #[test]
    fn test_search_limits_to_top_k() {
        let dir = TempDir::new().unwrap();
        build_index(dir.path());

        let output = execute(&cli(
            &dir,
            &["--format", "json", "--top-k", "1", "search", "hotels"],
        ))
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["count"], 1);
    }

    #[test]
    fn test_search_missing_index_fails() {
        let dir = TempDir::new().unwrap();
        assert!(execute(&cli(&dir, &["search", "revenue"])).is_err());
    }

    #[test]
    fn test_search_rejects_blank_query() {
        let dir = TempDir::new().unwrap();
        build_index(dir.path());
        let err = execute(&cli(&dir, &["search", "  "])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[test]
    fn test_prompt_init_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("cfg");

        let first = cmd_prompt_init(Some(&target), OutputFormat::Text).unwrap();
        assert!(first.contains("Wrote default template"));

        std::fs::write(target.join("system.md"), "custom {context}").unwrap();
        let second = cmd_prompt_init(Some(&target), OutputFormat::Text).unwrap();
        assert!(second.contains("left unchanged"));
        assert_eq!(
            std::fs::read_to_string(target.join("system.md")).unwrap(),
            "custom {context}"
        );
    }

    #[test]
    fn test_prompt_show_explicit_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("analyst.md");
        std::fs::write(&file, "Answer from {context} only.").unwrap();

        let settings = Settings {
            prompt_file: Some(file),
            embedder: EmbedderKind::Hash,
            ..Settings::default()
        };
        let output = cmd_prompt_show(&settings, OutputFormat::Text).unwrap();
        assert!(output.contains("analyst.md"));
        assert!(output.contains("Answer from {context} only."));
    }

    #[test]
    fn test_ask_without_key_is_config_error() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            index_dir: dir.path().to_path_buf(),
            api_key: None,
            ..Settings::default()
        };
        let err = cmd_ask(&settings, "hi", OutputFormat::Text).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
