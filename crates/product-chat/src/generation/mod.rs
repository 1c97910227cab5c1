//! Answer generation: prompt assembly, completion client, response policy

pub mod openrouter;
pub mod prompt;
pub mod responder;

pub use openrouter::{OpenRouterClient, API_KEY_ENV};
pub use prompt::PromptBuilder;
pub use responder::{Responder, APOLOGY_MESSAGE, INTERRUPTION_MESSAGE, WELCOME_MESSAGE};

use async_trait::async_trait;

use crate::error::Result;

/// Anything that can turn an assembled prompt into an answer
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Produce a single completion for the prompt
    async fn complete(&self, prompt: &str) -> Result<String>;
}
