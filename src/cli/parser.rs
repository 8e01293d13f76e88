//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros. Every option can also
//! be set through a `TRANSCRIPT_QA_*` environment variable.

use crate::completion::{DEFAULT_BASE_URL, DEFAULT_MODEL, RetryPolicy};
use crate::config::{DEFAULT_MAX_QUESTION_CHARS, Settings};
use crate::embedding::EmbedderKind;
use crate::prompt::DEFAULT_COMPANY;
use crate::storage::DEFAULT_INDEX_DIR;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// transcript-qa: chat with an LLM about financial call transcripts.
///
/// Questions are answered from the most relevant chunks of a pre-built
/// transcript index.
#[derive(Parser, Debug)]
#[command(name = "transcript-qa")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the pre-built index (`index.db`).
    #[arg(long, env = "TRANSCRIPT_QA_INDEX_DIR", default_value = DEFAULT_INDEX_DIR, global = true)]
    pub index_dir: PathBuf,

    /// API key for the completion endpoint.
    #[arg(long, env = "TRANSCRIPT_QA_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completion endpoint.
    #[arg(long, env = "TRANSCRIPT_QA_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Model identifier.
    #[arg(short, long, env = "TRANSCRIPT_QA_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Sampling temperature (0-2).
    #[arg(long, env = "TRANSCRIPT_QA_TEMPERATURE", default_value = "1.0", global = true)]
    pub temperature: f32,

    /// Number of transcript chunks supplied as context.
    #[arg(short = 'k', long, env = "TRANSCRIPT_QA_TOP_K", default_value = "3", global = true)]
    pub top_k: usize,

    /// Nearest candidates considered before diversity re-ranking.
    #[arg(long, env = "TRANSCRIPT_QA_FETCH_K", default_value = "20", global = true)]
    pub fetch_k: usize,

    /// MMR lambda: 1.0 ranks by relevance only, 0.0 by diversity only.
    #[arg(long, env = "TRANSCRIPT_QA_DIVERSITY", default_value = "1.0", global = true)]
    pub diversity: f32,

    /// Timeout for one completion attempt, in seconds.
    #[arg(long, env = "TRANSCRIPT_QA_TIMEOUT", default_value = "60", global = true)]
    pub timeout: u64,

    /// Retries for transient completion failures.
    #[arg(long, env = "TRANSCRIPT_QA_RETRIES", default_value_t = RetryPolicy::DEFAULT_MAX_RETRIES, global = true)]
    pub retries: u32,

    /// Longest accepted question, in characters.
    #[arg(long, env = "TRANSCRIPT_QA_MAX_QUESTION_CHARS", default_value_t = DEFAULT_MAX_QUESTION_CHARS, global = true)]
    pub max_question_chars: usize,

    /// Query embedder; must match the model the index was built with.
    #[arg(long, env = "TRANSCRIPT_QA_EMBEDDER", value_enum, default_value_t = EmbedderKind::default(), global = true)]
    pub embedder: EmbedderKind,

    /// System template file (must contain `{context}`).
    #[arg(long, env = "TRANSCRIPT_QA_PROMPT_FILE", global = true)]
    pub prompt_file: Option<PathBuf>,

    /// Company the analyst focuses on.
    #[arg(long, env = "TRANSCRIPT_QA_COMPANY", default_value = DEFAULT_COMPANY, global = true)]
    pub company: String,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session.
    ///
    /// Type a question to get an answer with its source documents.
    /// `/clear` starts a new chat, `/history` shows the conversation and
    /// `/exit` quits.
    Chat,

    /// Answer a single question and exit.
    Ask {
        /// The question.
        question: String,
    },

    /// Show the chunks that would be retrieved for a query.
    ///
    /// Does not call the model and needs no API key.
    Search {
        /// The query text.
        query: String,
    },

    /// Show index statistics.
    Status,

    /// Manage the system prompt template.
    #[command(subcommand)]
    Prompt(PromptCommands),
}

/// Prompt template subcommands.
#[derive(Subcommand, Debug)]
pub enum PromptCommands {
    /// Write the default template to the config directory.
    ///
    /// An existing template is never overwritten.
    Init {
        /// Target directory (default: `~/.config/transcript-qa`).
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Print the template that would be used.
    Show,
}

impl Cli {
    /// Collects the runtime settings. Validation happens separately.
    #[must_use]
    pub fn settings(&self) -> Settings {
        Settings {
            index_dir: self.index_dir.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            top_k: self.top_k,
            fetch_k: self.fetch_k,
            diversity: self.diversity,
            timeout: Duration::from_secs(self.timeout),
            max_retries: self.retries,
            max_question_chars: self.max_question_chars,
            embedder: self.embedder,
            prompt_file: self.prompt_file.clone(),
            company: self.company.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_with_overrides() {
        let cli = Cli::try_parse_from([
            "transcript-qa",
            "--index-dir",
            "/data/index",
            "--top-k",
            "5",
            "--diversity",
            "0.5",
            "ask",
            "What was FY23 revenue?",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Ask { ref question } if question == "What was FY23 revenue?"));
        let settings = cli.settings();
        assert_eq!(settings.index_dir, PathBuf::from("/data/index"));
        assert_eq!(settings.top_k, 5);
        assert!((settings.diversity - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::try_parse_from(["transcript-qa", "search", "ebitda", "--fetch-k", "40"])
            .unwrap();
        assert_eq!(cli.fetch_k, 40);
    }

    #[test]
    fn test_prompt_subcommands() {
        let cli = Cli::try_parse_from(["transcript-qa", "prompt", "init", "--dir", "/tmp/x"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Prompt(PromptCommands::Init { dir: Some(_) })
        ));

        let cli = Cli::try_parse_from(["transcript-qa", "prompt", "show"]).unwrap();
        assert!(matches!(cli.command, Commands::Prompt(PromptCommands::Show)));
    }

    #[test]
    fn test_embedder_value() {
        let cli = Cli::try_parse_from(["transcript-qa", "--embedder", "hash", "status"]).unwrap();
        assert_eq!(cli.embedder, EmbedderKind::Hash);
    }

    #[test]
    fn test_timeout_seconds() {
        let cli = Cli::try_parse_from(["transcript-qa", "--timeout", "5", "status"]).unwrap();
        assert_eq!(cli.settings().timeout, Duration::from_secs(5));
    }
}
