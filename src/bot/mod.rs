//! Reply Dispatcher
//!
//! Transport-neutral handling of one inbound message: session bookkeeping,
//! name capture, the one-time welcome, keyword replies and, on a miss, a
//! generated reply. Every inbound message yields at least one reply.

use crate::completion::{render_template, CompletionFailure, CompletionRequester, CompletionSettings};
use crate::config::{Config, MessagesConfig};
use crate::provider::Generator;
use crate::responder::KeywordResponder;
use crate::session::{detect_name, Role, SessionStore};
use crate::utils::truncate_str;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// One message as delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    pub chat_id: String,
    pub body: String,
    /// Contact name supplied by the transport, if any
    #[serde(default)]
    pub sender_name: Option<String>,
}

impl InboundMessage {
    pub fn new(chat_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            body: body.into(),
            sender_name: None,
        }
    }

    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }
}

pub struct Dispatcher {
    sessions: Arc<SessionStore>,
    responder: KeywordResponder,
    completion: CompletionRequester,
    messages: MessagesConfig,
    welcome: String,
    signature: String,
}

impl Dispatcher {
    pub fn from_config(config: &Config, generator: Arc<dyn Generator>) -> Result<Self> {
        let responder = KeywordResponder::from_config(&config.keywords)
            .context("Invalid keyword substitution table")?;
        let sessions = Arc::new(SessionStore::new(config.session.max_history));
        let completion = CompletionRequester::new(
            generator,
            sessions.clone(),
            CompletionSettings::from_config(config),
        );

        tracing::info!(
            rules = responder.rule_count(),
            max_history = sessions.max_history(),
            "Dispatcher ready"
        );

        Ok(Self {
            sessions,
            responder,
            completion,
            messages: config.messages.clone(),
            welcome: config.persona.welcome.clone(),
            signature: config.persona.signature.trim().to_string(),
        })
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Produce the replies for one inbound message, in delivery order.
    pub async fn handle(&self, msg: InboundMessage) -> Vec<String> {
        let chat_id = msg.chat_id.as_str();
        let body = msg.body.trim();

        tracing::info!(chat_id, "Inbound message: {}", truncate_str(body, 80));

        if body.is_empty() {
            return vec![self.messages.not_understood.clone()];
        }

        self.sessions.record_message(chat_id, Role::User, body);

        // An explicit statement in the text beats the contact name
        if let Some(name) = detect_name(body) {
            self.sessions.try_set_name(chat_id, &name);
        }
        if let Some(name) = msg.sender_name.as_deref() {
            self.sessions.try_set_name(chat_id, name);
        }

        let display_name = self.sessions.get_or_create(chat_id).display_name;
        let mut replies = Vec::with_capacity(2);

        if self.sessions.try_mark_greeted(chat_id) && !self.welcome.trim().is_empty() {
            replies.push(render_template(&self.welcome, display_name.as_deref()));
        }

        if let Some(canned) = self.responder.match_keyword(&body.to_lowercase()) {
            let reply = render_template(canned, display_name.as_deref());
            tracing::debug!(chat_id, "Keyword reply");
            self.sessions
                .record_message(chat_id, Role::Assistant, reply.clone());
            replies.push(reply);
            return replies;
        }

        let reply = match self.completion.complete(chat_id).await {
            Ok(text) => self.sign(text),
            Err(CompletionFailure::NotConfigured) => self.messages.not_configured.clone(),
            Err(CompletionFailure::InFlight) => self.messages.processing.clone(),
            Err(CompletionFailure::Provider(_)) => self.messages.provider_error.clone(),
        };

        tracing::info!(chat_id, "Reply: {}", truncate_str(&reply, 80));
        replies.push(reply);
        replies
    }

    fn sign(&self, text: String) -> String {
        if self.signature.is_empty() {
            text
        } else {
            format!("{text}\n\n{}", self.signature)
        }
    }
}
