//! Hosted language-model collaborator used for disease explanations and chat.

use futures::future::BoxFuture;

mod gemini;
pub mod prompts;
mod sections;

pub use gemini::{GeminiClient, GeminiConfig};
pub use sections::{section_details, DETAIL_HEADINGS, SUMMARY_KEY};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("No language model is configured")]
    NotConfigured,
    #[error("Request to language model failed: {0}")]
    Transport(reqwest::Error),
    #[error("Language model returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("Language model returned no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    /// Request URLs can carry credentials, so they never reach the message.
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}

/// Turns a prompt into generated text.
///
/// Returns a boxed future so implementations can be shared as
/// `Arc<dyn TextGenerator>` across request handlers.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, LlmError>>;
}
