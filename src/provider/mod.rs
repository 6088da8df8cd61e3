//! Generation Providers
//!
//! The [`Generator`] trait is the seam between the conversation core and the
//! remote text-generation API. One request, one response: no streaming and no
//! retries at this layer.

pub mod error;
pub mod gemini;

pub use error::{ProviderError, Result};
pub use gemini::GeminiProvider;

use crate::session::Turn;
use async_trait::async_trait;

/// Everything the remote model sees for one reply.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Persona and per-chat instructions
    pub system: Option<String>,
    /// Conversation turns, oldest first
    pub turns: Vec<Turn>,
    /// Output length hint
    pub max_output_tokens: u32,
}

/// The remote model's answer. `text` is `None` when the body carried no text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResponse {
    pub text: Option<String>,
    pub finish_reason: Option<String>,
}

impl GenerationResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            finish_reason: None,
        }
    }
}

/// Remote text generation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Perform exactly one generation call.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;

    /// Whether endpoint and credential are present.
    fn has_credentials(&self) -> bool;
}
