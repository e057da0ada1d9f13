//! Prompt templates with `{{name}}` placeholders.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use astra_rag::PromptTemplate;
//!
//! let template = PromptTemplate::from("Q:{{question}} C:{{information}}");
//! let variables = HashMap::from([
//!     ("question".to_string(), "Who is Johnny?".to_string()),
//!     ("information".to_string(), "ctx".to_string()),
//! ]);
//! assert_eq!(template.apply(&variables).unwrap().text(), "Q:Who is Johnny? C:ctx");
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::error::{RagError, Result};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Name of the placeholder filled by [`PromptTemplate::apply_single`].
pub const IT: &str = "it";

/// The default template used by the RAG pipeline.
pub const DEFAULT_RAG_TEMPLATE: &str = "\
Answer the following question to the best of your ability:\n\
Question:\n\
{{question}}\n\
Base your answer on the following information:\n\
{{information}}";

/// A rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    text: String,
}

impl Prompt {
    /// Wrap already-rendered text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The prompt text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The prompt as a single user message.
    pub fn to_user_message(&self) -> ChatMessage {
        ChatMessage::user(self.text.clone())
    }

    /// The prompt as a system message.
    pub fn to_system_message(&self) -> ChatMessage {
        ChatMessage::system(self.text.clone())
    }
}

/// A template whose `{{name}}` placeholders are substituted by [`apply`](PromptTemplate::apply).
///
/// Whitespace inside the braces is ignored, so `{{ question }}` and
/// `{{question}}` are the same placeholder. Text outside placeholders is
/// copied unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template.
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }

    /// The raw template text.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The distinct placeholder names in the template, sorted.
    pub fn variables(&self) -> BTreeSet<String> {
        PLACEHOLDER.captures_iter(&self.template).map(|c| c[1].to_string()).collect()
    }

    /// Substitute every placeholder with the matching value.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::MissingTemplateVariable`] naming the first
    /// placeholder without a value.
    pub fn apply(&self, variables: &HashMap<String, String>) -> Result<Prompt> {
        if let Some(missing) = self.variables().into_iter().find(|v| !variables.contains_key(v)) {
            return Err(RagError::MissingTemplateVariable(missing));
        }

        let text = PLACEHOLDER.replace_all(&self.template, |caps: &Captures<'_>| {
            variables.get(&caps[1]).cloned().unwrap_or_default()
        });
        Ok(Prompt::new(text))
    }

    /// Fill the `{{it}}` placeholder with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::MissingTemplateVariable`] if the template uses any
    /// other placeholder.
    pub fn apply_single(&self, value: impl Into<String>) -> Result<Prompt> {
        self.apply(&HashMap::from([(IT.to_string(), value.into())]))
    }
}

impl From<&str> for PromptTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for PromptTemplate {
    fn from(template: String) -> Self {
        Self::new(template)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_RAG_TEMPLATE)
    }
}
