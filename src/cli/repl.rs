//! Interactive chat loop.
//!
//! Reads questions with `rustyline`, answers them through a
//! [`ChatSession`] and prints answers with their sources. Turn-scoped
//! errors are reported and the loop keeps going.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use crate::cli::output::{OutputFormat, SOURCES_HEADING, format_history, source_lines};
use crate::core::Response;
use crate::error::Result;
use crate::session::ChatSession;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::borrow::Cow::{self, Borrowed, Owned};
use tokio::runtime::Runtime;

const PROMPT: &str = ">> ";

/// Slash commands offered for completion.
const SLASH_COMMANDS: [&str; 4] = ["/clear", "/exit", "/help", "/history"];

/// One line of REPL input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Ask the model a question.
    Ask(String),
    /// Start a new chat (discard history).
    Clear,
    /// Print the conversation so far.
    History,
    /// Print the command list.
    Help,
    /// Leave the REPL.
    Exit,
    /// Blank line.
    Empty,
    /// A slash command we do not know.
    Unknown(String),
}

impl ReplCommand {
    /// Classifies a raw input line.
    #[must_use]
    pub fn parse_line(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            "" => Self::Empty,
            "/exit" | "/quit" => Self::Exit,
            "/clear" | "/new" => Self::Clear,
            "/history" => Self::History,
            "/help" => Self::Help,
            cmd if cmd.starts_with('/') && !cmd.contains(char::is_whitespace) => {
                Self::Unknown(cmd.to_string())
            }
            question => Self::Ask(question.to_string()),
        }
    }
}

/// Completion, hints and highlighting for slash commands.
#[derive(Clone)]
struct ReplHelper {
    commands: Vec<String>,
}

impl ReplHelper {
    fn new() -> Self {
        Self {
            commands: SLASH_COMMANDS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ReplHelper {}

fn print_help() {
    println!("{}", "Ask a question about the transcript, or:".bright_black());
    println!("{}", "  /clear    start a new chat".bright_black());
    println!("{}", "  /history  show the conversation".bright_black());
    println!("{}", "  /exit     quit".bright_black());
}

fn print_response(response: &Response) {
    for line in response.answer.trim_end().lines() {
        println!("{}", line.bright_blue());
    }
    if !response.sources.is_empty() {
        println!();
        println!("{}", SOURCES_HEADING.bright_magenta());
        for line in source_lines(&response.sources) {
            println!("{}", line.bright_black());
        }
    }
    println!();
}

/// Runs the chat loop until `/exit` or end of input.
///
/// Each question is answered on `runtime`; the loop blocks until the answer
/// arrives.
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up or reading input fails
/// for a reason other than Ctrl-C or Ctrl-D.
pub fn run_chat(session: &mut ChatSession, runtime: &Runtime) -> Result<()> {
    let mut rl = Editor::<ReplHelper, DefaultHistory>::new()?;
    rl.set_helper(Some(ReplHelper::new()));

    println!("{}", "=== transcript-qa ===".bright_magenta().bold());
    println!(
        "{}",
        format!("index: {}", session.retriever().describe()).bright_black()
    );
    println!(
        "{}",
        "Ask a question, '/clear' for a new chat, '/exit' to quit.".bright_black()
    );
    println!();

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let command = ReplCommand::parse_line(&line);
                if !matches!(command, ReplCommand::Empty) {
                    let _ = rl.add_history_entry(line.as_str());
                }

                match command {
                    ReplCommand::Empty => {}
                    ReplCommand::Exit => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    ReplCommand::Clear => {
                        session.clear();
                        println!("{}", "Started a new chat.".bright_green());
                    }
                    ReplCommand::History => {
                        print!("{}", format_history(session.history(), OutputFormat::Text));
                    }
                    ReplCommand::Help => print_help(),
                    ReplCommand::Unknown(cmd) => {
                        println!("{}", format!("Unknown command: {cmd}").yellow());
                    }
                    ReplCommand::Ask(question) => {
                        match runtime.block_on(session.submit(&question)) {
                            Ok(response) => print_response(&response),
                            Err(e) if e.is_turn_scoped() => {
                                eprintln!("{}", format!("Error: {e}").red());
                            }
                            Err(e) => return Err(e),
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/exit' to quit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
