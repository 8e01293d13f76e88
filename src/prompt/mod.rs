//! Prompt assembly.
//!
//! Turns a question, its retrieved context and the session history into the
//! conversation sent to the completion service:
//!
//! ```text
//! [system(template with context), ...history, user(question)]
//! ```
//!
//! Assembly is pure: the same inputs always produce the same conversation.

mod template;

pub use template::{
    COMPANY_PLACEHOLDER, CONTEXT_PLACEHOLDER, DEFAULT_COMPANY, DEFAULT_SYSTEM_TEMPLATE,
    MISSING_DATA_NOTICE, PromptTemplate, TemplateSource,
};

use crate::core::{Message, QueryRequest, RetrievedChunk, Role};

/// Separator placed between chunk texts in the context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Concatenates chunk texts verbatim, separated by a blank line.
///
/// # Examples
///
/// ```
/// use transcript_qa::core::RetrievedChunk;
/// use transcript_qa::prompt::format_context;
///
/// let chunk = |text: &str| RetrievedChunk {
///     chunk_id: 1,
///     text: text.to_string(),
///     source: None,
///     score: 1.0,
/// };
/// assert_eq!(format_context(&[chunk("a"), chunk("b")]), "a\n\nb");
/// assert_eq!(format_context(&[]), "");
/// ```
#[must_use]
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Builds conversations from a template and a company focus.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    template: PromptTemplate,
    company: String,
}

impl PromptAssembler {
    /// Creates an assembler.
    pub fn new(template: PromptTemplate, company: impl Into<String>) -> Self {
        Self {
            template,
            company: company.into(),
        }
    }

    /// Rendered system instruction for `context`.
    #[must_use]
    pub fn system_message(&self, context: &str) -> String {
        self.template.render(context, &self.company)
    }

    /// Assembles `[system, ...history, user]`.
    #[must_use]
    pub fn assemble(&self, request: QueryRequest<'_>, context: &str) -> Vec<Message> {
        let mut conversation = Vec::with_capacity(request.history.len() + 2);
        conversation.push(Message::new(Role::System, self.system_message(context)));
        conversation.extend(request.history.iter().map(Message::from));
        conversation.push(Message::new(Role::User, request.question));
        conversation
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(PromptTemplate::defaults(), DEFAULT_COMPANY)
    }
}
