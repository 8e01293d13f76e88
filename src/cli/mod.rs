//! CLI layer for transcript-qa.
//!
//! Provides the command-line interface using clap: an interactive chat
//! REPL, one-shot questions, retrieval inspection and template management.

pub mod commands;
pub mod output;
pub mod parser;
pub mod repl;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, PromptCommands};
pub use repl::{ReplCommand, run_chat};
