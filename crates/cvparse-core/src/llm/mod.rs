//! Generative text service used for field extraction and semantic checks.
//!
//! Every model call in the crate goes through [`GenerativeModel`], so tests
//! can substitute a stub and the pipeline never talks HTTP directly.

mod gemini;
pub mod prompts;

pub use gemini::GeminiClient;

use crate::error::LlmError;

/// A blocking text-in, text-out model.
pub trait GenerativeModel: Send + Sync {
    /// Send a prompt and return the model's text reply.
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```JSON"))
        .or_else(|| text.strip_prefix("```"));

    match inner {
        Some(rest) => {
            let rest = rest.trim_start();
            rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
        }
        None => text,
    }
}
