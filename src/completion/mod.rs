//! Completion Requester
//!
//! Turns a chat's history into one generation call and a reply ready for
//! delivery. The per-chat request guard is held for the duration of the call,
//! so a second message arriving while the first is being answered fails fast
//! with [`CompletionFailure::InFlight`] instead of issuing a duplicate call.

pub mod prompt;

pub use prompt::{build_system_prompt, render_template};

use crate::config::Config;
use crate::provider::{GenerationRequest, Generator, ProviderError};
use crate::session::{MemoryBackend, Role, SessionBackend, SessionStore};
use crate::utils::truncate_words;
use std::sync::Arc;
use thiserror::Error;

/// Why no generated reply was produced.
#[derive(Debug, Error)]
pub enum CompletionFailure {
    /// Endpoint or credential missing; no call was made
    #[error("generation provider is not configured")]
    NotConfigured,

    /// Another request for the same chat is outstanding; no call was made
    #[error("a request for this chat is already in flight")]
    InFlight,

    /// The single call failed
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Tunables for [`CompletionRequester`].
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub instructions: String,
    pub max_output_tokens: u32,
    pub max_reply_chars: usize,
    pub no_answer: String,
}

impl CompletionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            instructions: config.persona.instructions.clone(),
            max_output_tokens: config.provider.max_output_tokens,
            max_reply_chars: config.session.max_reply_chars,
            no_answer: config.messages.no_answer.clone(),
        }
    }
}

pub struct CompletionRequester<B: SessionBackend = MemoryBackend> {
    generator: Arc<dyn Generator>,
    sessions: Arc<SessionStore<B>>,
    settings: CompletionSettings,
}

impl<B: SessionBackend> CompletionRequester<B> {
    pub fn new(
        generator: Arc<dyn Generator>,
        sessions: Arc<SessionStore<B>>,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            generator,
            sessions,
            settings,
        }
    }

    /// Generate a reply for `chat_id` from its current history.
    ///
    /// The inbound message must already be recorded as the last user turn.
    /// On success the reply is truncated and appended to the history as an
    /// assistant turn; failures leave the history untouched.
    pub async fn complete(&self, chat_id: &str) -> Result<String, CompletionFailure> {
        if !self.generator.has_credentials() {
            tracing::warn!(chat_id, "Generation skipped: provider not configured");
            return Err(CompletionFailure::NotConfigured);
        }

        let Some(_guard) = self.sessions.try_begin_request(chat_id) else {
            tracing::info!(chat_id, "Duplicate message while a reply is pending");
            return Err(CompletionFailure::InFlight);
        };

        let session = self.sessions.get_or_create(chat_id);
        let request = GenerationRequest {
            system: build_system_prompt(
                &self.settings.instructions,
                session.display_name.as_deref(),
            ),
            turns: session.history.into_iter().collect(),
            max_output_tokens: self.settings.max_output_tokens,
        };

        tracing::debug!(chat_id, turns = request.turns.len(), "Requesting completion");

        let response = self.generator.generate(request).await.map_err(|e| {
            tracing::error!(
                chat_id,
                status = ?e.status(),
                timeout = e.is_timeout(),
                "Completion failed: {}",
                e
            );
            CompletionFailure::from(e)
        })?;

        let text = match response.text {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                tracing::warn!(
                    chat_id,
                    finish_reason = ?response.finish_reason,
                    "Completion returned no text, using placeholder"
                );
                self.settings.no_answer.clone()
            }
        };

        let reply = truncate_words(text.trim(), self.settings.max_reply_chars).into_owned();
        self.sessions
            .record_message(chat_id, Role::Assistant, reply.clone());

        Ok(reply)
    }
}
