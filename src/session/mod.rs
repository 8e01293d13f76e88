//! The per-session question answering pipeline.
//!
//! [`ChatSession`] owns one session's history and runs each question
//! through retrieval, prompt assembly and completion, in that order, exactly
//! once. History is updated only after the model answers.

use crate::completion::{CompletionService, OpenAiCompatibleClient, RetryingService};
use crate::config::{DEFAULT_MAX_QUESTION_CHARS, Settings};
use crate::core::{Message, QueryRequest, Response, RetrievedChunk, SessionHistory};
use crate::error::{Error, Result};
use crate::prompt::{PromptAssembler, PromptTemplate, format_context};
use crate::retrieval::{Retriever, open_index};

/// Model parameters and input limits for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Model identifier sent with each request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Longest accepted question, in characters.
    pub max_question_chars: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            model: crate::completion::DEFAULT_MODEL.to_string(),
            temperature: crate::completion::DEFAULT_TEMPERATURE,
            max_question_chars: DEFAULT_MAX_QUESTION_CHARS,
        }
    }
}

/// A question ready to be sent: the conversation and the chunks behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTurn {
    /// The validated question, trimmed.
    pub question: String,
    /// `[system, ...history, user]`.
    pub conversation: Vec<Message>,
    /// Chunks whose text is in the system message.
    pub sources: Vec<RetrievedChunk>,
}

/// One interactive chat session.
pub struct ChatSession {
    retriever: Retriever,
    assembler: PromptAssembler,
    completion: Box<dyn CompletionService>,
    options: SessionOptions,
    history: SessionHistory,
}

impl ChatSession {
    /// Creates a session with empty history.
    #[must_use]
    pub fn new(
        retriever: Retriever,
        assembler: PromptAssembler,
        completion: Box<dyn CompletionService>,
        options: SessionOptions,
    ) -> Self {
        Self {
            retriever,
            assembler,
            completion,
            options,
            history: SessionHistory::new(),
        }
    }

    /// Builds a session from validated settings.
    ///
    /// A missing or unreadable index does not fail here; the session runs
    /// without transcript context.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the settings are invalid or the API
    /// key is missing, and an I/O or configuration error if an explicit
    /// template file cannot be used.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate_for_completion()?;

        let index = open_index(&settings.index_dir, settings.embedder, settings.fetch_k)?;
        let retriever = Retriever::new(index, settings.top_k, settings.diversity);

        let template = PromptTemplate::load(settings.prompt_file.as_deref())?;
        let assembler = PromptAssembler::new(template, settings.company.clone());

        let client = OpenAiCompatibleClient::new(settings.api_key()?, &settings.base_url);
        let completion = RetryingService::new(
            Box::new(client),
            settings.timeout,
            settings.retry_policy(),
        );

        tracing::info!(
            index = %retriever.describe(),
            model = %settings.model,
            "session started"
        );

        Ok(Self::new(
            retriever,
            assembler,
            Box::new(completion),
            SessionOptions {
                model: settings.model.clone(),
                temperature: settings.temperature,
                max_question_chars: settings.max_question_chars,
            },
        ))
    }

    /// Rejects empty, whitespace-only and oversized questions.
    ///
    /// Returns the trimmed question.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the problem.
    pub fn validate_question<'q>(&self, question: &'q str) -> Result<&'q str> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_input("question is empty"));
        }

        let chars = trimmed.chars().count();
        if chars > self.options.max_question_chars {
            return Err(Error::invalid_input(format!(
                "question is {chars} characters long; the limit is {}",
                self.options.max_question_chars
            )));
        }

        Ok(trimmed)
    }

    /// Validates the question, retrieves context and assembles the
    /// conversation, without calling the model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a rejected question. Retrieval
    /// failures never surface here; they yield an empty context.
    pub fn prepare(&self, question: &str) -> Result<PreparedTurn> {
        let question = self.validate_question(question)?;

        let sources = self.retriever.retrieve(question);
        let context = format_context(&sources);
        let conversation = self.assembler.assemble(
            QueryRequest {
                question,
                history: self.history.turns(),
            },
            &context,
        );

        tracing::debug!(
            sources = sources.len(),
            context_bytes = context.len(),
            history_turns = self.history.len(),
            "prompt assembled"
        );

        Ok(PreparedTurn {
            question: question.to_string(),
            conversation,
            sources,
        })
    }

    /// Answers `question` and records the exchange.
    ///
    /// On any error the history is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a rejected question (the model is
    /// not called) and a completion error if the model call fails.
    pub async fn submit(&mut self, question: &str) -> Result<Response> {
        let prepared = self.prepare(question)?;

        let answer = self
            .completion
            .generate(
                &prepared.conversation,
                &self.options.model,
                self.options.temperature,
            )
            .await?;

        self.history.record_exchange(prepared.question, answer.clone());
        tracing::debug!(exchanges = self.history.exchange_count(), "exchange recorded");

        Ok(Response {
            answer,
            sources: prepared.sources,
        })
    }

    /// Discards all history.
    pub fn clear(&mut self) {
        self.history.clear();
        tracing::debug!("history cleared");
    }

    /// Session history.
    #[must_use]
    pub const fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// The retriever in use.
    #[must_use]
    pub const fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Model parameters.
    #[must_use]
    pub const fn options(&self) -> &SessionOptions {
        &self.options
    }
}
