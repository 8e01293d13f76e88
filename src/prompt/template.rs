//! System instruction template.
//!
//! The template is plain text with two placeholders, `{context}` for the
//! retrieved transcript text and `{company}` for the company the analyst
//! focuses on. It can be overridden by a file; see [`PromptTemplate::load`].

use crate::error::{Error, Result};
use crate::io::{read_text_file, write_new_file};
use std::path::{Path, PathBuf};

/// Placeholder replaced by the retrieved context.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Placeholder replaced by the configured company name.
pub const COMPANY_PLACEHOLDER: &str = "{company}";

/// Company the default template focuses on.
pub const DEFAULT_COMPANY: &str = "ITC Ltd.";

/// Sentence the model is told to use when the transcript lacks an answer.
pub const MISSING_DATA_NOTICE: &str =
    "The required data is not available in the current transcript.";

/// Compiled-in system instructions for the financial analyst.
pub const DEFAULT_SYSTEM_TEMPLATE: &str = r#"You are a domain-specific AI financial analyst focused on company-level performance evaluation.

Your task is to analyze and respond to user financial queries *strictly based on the provided transcript data*: {context}.

Rules:
1. ONLY extract facts, figures, and insights that are explicitly available in the transcript.
2. If data is *missing or partially available*, clearly state: "The required data is not available in the current transcript." Then provide a generic but relevant explanation based on standard financial principles.
3. Maintain numerical accuracy and avoid interpretation beyond data boundaries.
4. Prioritize answers relevant to *{company}*, but keep response format adaptable to other firms and fiscal years.
5. Clearly present year-wise or metric-wise insights using bullet points or structured formats if applicable.

Your goals:
- Ensure 100% fidelity to source transcript.
- Do not assume or hallucinate missing numbers.
- Use clear, reproducible reasoning steps (e.g., show which line items support your conclusion).
- Output should be modular enough to scale across other companies and time periods.

Respond only to this question from the user.
"#;

/// Default config directory under the user's home.
const DEFAULT_CONFIG_DIR: &str = ".config/transcript-qa";

/// Filename of the system template inside the config directory.
const SYSTEM_FILENAME: &str = "system.md";

/// Where a loaded template came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// The compiled-in default.
    Default,
    /// A template file.
    File(PathBuf),
}

/// A validated system instruction template.
///
/// # Examples
///
/// ```
/// use transcript_qa::prompt::PromptTemplate;
///
/// let template = PromptTemplate::new("Answer from: {context}").unwrap();
/// assert_eq!(template.render("FY23 revenue: ₹70,000 Cr", "ITC Ltd."),
///            "Answer from: FY23 revenue: ₹70,000 Cr");
///
/// assert!(PromptTemplate::new("no placeholder").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
    source: TemplateSource,
}

impl PromptTemplate {
    /// Creates a template from text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the text has no `{context}`
    /// placeholder, since the retrieved transcript would never reach the
    /// model.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        Self::with_source(text.into(), TemplateSource::Default)
    }

    fn with_source(text: String, source: TemplateSource) -> Result<Self> {
        if !text.contains(CONTEXT_PLACEHOLDER) {
            let origin = match &source {
                TemplateSource::Default => "template".to_string(),
                TemplateSource::File(path) => path.display().to_string(),
            };
            return Err(Error::config(format!(
                "{origin} has no {CONTEXT_PLACEHOLDER} placeholder"
            )));
        }
        Ok(Self { text, source })
    }

    /// Returns the compiled-in default without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            text: DEFAULT_SYSTEM_TEMPLATE.to_string(),
            source: TemplateSource::Default,
        }
    }

    /// Loads the template, falling back to the compiled-in default.
    ///
    /// Resolution order:
    /// 1. Explicit `prompt_file` (from `--prompt-file` or
    ///    `TRANSCRIPT_QA_PROMPT_FILE`); it must exist
    /// 2. `~/.config/transcript-qa/system.md`, if present
    /// 3. [`DEFAULT_SYSTEM_TEMPLATE`]
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file cannot be read, or if the chosen
    /// file lacks a `{context}` placeholder.
    pub fn load(prompt_file: Option<&Path>) -> Result<Self> {
        Self::resolve(prompt_file, Self::default_path().as_deref())
    }

    fn resolve(explicit: Option<&Path>, fallback: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let text = read_text_file(path)?;
            tracing::debug!(path = %path.display(), "loaded system template");
            return Self::with_source(text, TemplateSource::File(path.to_path_buf()));
        }

        if let Some(path) = fallback.filter(|p| p.is_file()) {
            let text = read_text_file(path)?;
            tracing::debug!(path = %path.display(), "loaded system template");
            return Self::with_source(text, TemplateSource::File(path.to_path_buf()));
        }

        Ok(Self::defaults())
    }

    /// Writes the compiled-in default to `dir/system.md`.
    ///
    /// Creates the directory if needed. An existing file is **not**
    /// overwritten; in that case `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_default(dir: &Path) -> Result<Option<PathBuf>> {
        let path = dir.join(SYSTEM_FILENAME);
        if write_new_file(&path, DEFAULT_SYSTEM_TEMPLATE)? {
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    /// Returns the default config directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_CONFIG_DIR))
    }

    /// Returns the default template path under the user's home.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join(SYSTEM_FILENAME))
    }

    /// Raw template text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where the template was loaded from.
    #[must_use]
    pub const fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Fills in the placeholders.
    ///
    /// Substitution is a single left-to-right pass, so placeholder-like text
    /// inside `context` or `company` is inserted verbatim and never
    /// expanded.
    #[must_use]
    pub fn render(&self, context: &str, company: &str) -> String {
        let mut out = String::with_capacity(self.text.len() + context.len());
        let mut rest = self.text.as_str();

        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
                out.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(COMPANY_PLACEHOLDER) {
                out.push_str(company);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_has_placeholders() {
        let template = PromptTemplate::defaults();
        assert!(template.text().contains(CONTEXT_PLACEHOLDER));
        assert!(template.text().contains(COMPANY_PLACEHOLDER));
        assert!(template.text().contains(MISSING_DATA_NOTICE));
        assert_eq!(template.source(), &TemplateSource::Default);
    }

    #[test]
    fn test_render_default() {
        let rendered = PromptTemplate::defaults().render("FY23 revenue: ₹70,000 Cr", "ITC Ltd.");
        assert!(rendered.contains("transcript data*: FY23 revenue: ₹70,000 Cr."));
        assert!(rendered.contains("relevant to *ITC Ltd.*"));
        assert!(!rendered.contains(CONTEXT_PLACEHOLDER));
        assert!(!rendered.contains(COMPANY_PLACEHOLDER));
    }

    #[test]
    fn test_render_does_not_expand_inserted_text() {
        let template = PromptTemplate::new("{company}: {context}").unwrap();
        let rendered = template.render("literal {company} and {x}", "ACME");
        assert_eq!(rendered, "ACME: literal {company} and {x}");
    }

    #[test]
    fn test_render_keeps_other_braces() {
        let template = PromptTemplate::new("{ {context} }{").unwrap();
        assert_eq!(template.render("c", "x"), "{ c }{");
    }

    #[test]
    fn test_render_empty_context() {
        let template = PromptTemplate::new("Data: [{context}]").unwrap();
        assert_eq!(template.render("", "x"), "Data: []");
    }

    #[test]
    fn test_new_requires_context() {
        let err = PromptTemplate::new("Only {company}").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_resolve_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.md");
        std::fs::write(&path, "Custom: {context}").unwrap();

        let template = PromptTemplate::resolve(Some(&path), None).unwrap();
        assert_eq!(template.text(), "Custom: {context}");
        assert_eq!(template.source(), &TemplateSource::File(path));
    }

    #[test]
    fn test_resolve_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.md");
        assert!(PromptTemplate::resolve(Some(&missing), None).is_err());
    }

    #[test]
    fn test_resolve_fallback_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("system.md");
        std::fs::write(&path, "Fallback {context}").unwrap();

        let template = PromptTemplate::resolve(None, Some(&path)).unwrap();
        assert_eq!(template.text(), "Fallback {context}");
    }

    #[test]
    fn test_resolve_missing_fallback_uses_default() {
        let dir = TempDir::new().unwrap();
        let template = PromptTemplate::resolve(None, Some(&dir.path().join("none.md"))).unwrap();
        assert_eq!(template, PromptTemplate::defaults());
    }

    #[test]
    fn test_resolve_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.md");
        std::fs::write(&path, "no placeholder here").unwrap();

        let err = PromptTemplate::resolve(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("bad.md"));
    }

    #[test]
    fn test_write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();

        let written = PromptTemplate::write_default(dir.path()).unwrap();
        let path = written.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_SYSTEM_TEMPLATE);

        std::fs::write(&path, "edited {context}").unwrap();
        assert!(PromptTemplate::write_default(dir.path()).unwrap().is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "edited {context}");
    }

    #[test]
    fn test_default_path_file_name() {
        if let Some(path) = PromptTemplate::default_path() {
            assert!(path.ends_with("transcript-qa/system.md"));
        }
    }
}
