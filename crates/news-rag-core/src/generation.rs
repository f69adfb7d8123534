//! Generation service trait.
//!
//! The synthesizer treats text generation as an opaque completion call:
//! a prompt goes in, a string comes out. Backends live in the app crate.

use anyhow::Result;
use async_trait::async_trait;

/// A text-completion backend.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier used for generation.
    fn model_name(&self) -> &str;

    /// Complete `prompt`, producing at most `max_output_length` tokens.
    ///
    /// When `deterministic` is true the backend must disable sampling so the
    /// same prompt yields the same output. The pipeline always passes `true`.
    async fn generate(
        &self,
        prompt: &str,
        max_output_length: usize,
        deterministic: bool,
    ) -> Result<String>;
}
