//! Conversation Sessions
//!
//! Per-chat state: bounded turn history, the chat's display name, the
//! one-time greeting flag and the in-flight request guard.

pub mod names;
pub mod store;

pub use names::detect_name;
pub use store::{MemoryBackend, RequestGuard, SessionBackend, SessionStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a chat's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

/// State kept for one chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub chat_id: String,
    pub history: VecDeque<Turn>,
    pub display_name: Option<String>,
    pub greeted: bool,
    pub request_in_flight: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(chat_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            chat_id: chat_id.into(),
            history: VecDeque::new(),
            display_name: None,
            greeted: false,
            request_in_flight: false,
            created_at: now,
            last_seen: now,
        }
    }

    /// Append a turn, evicting the oldest ones until at most `max_history` remain.
    pub fn push_turn(&mut self, turn: Turn, max_history: usize) {
        self.last_seen = turn.at;
        self.history.push_back(turn);
        while self.history.len() > max_history {
            self.history.pop_front();
        }
    }

    /// Set the display name unless one is already set.
    pub fn set_name_once(&mut self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if self.display_name.is_some() || candidate.is_empty() {
            return false;
        }
        self.display_name = Some(candidate.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_blank() {
        let session = ChatSession::new("5491100000000");
        assert_eq!(session.chat_id, "5491100000000");
        assert!(session.history.is_empty());
        assert!(session.display_name.is_none());
        assert!(!session.greeted);
        assert!(!session.request_in_flight);
    }

    #[test]
    fn test_push_turn_evicts_oldest_first() {
        let mut session = ChatSession::new("c");
        for i in 0..5 {
            session.push_turn(Turn::user(format!("m{i}")), 3);
        }
        let texts: Vec<_> = session.history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_set_name_once_ignores_blank_candidates() {
        let mut session = ChatSession::new("c");
        assert!(!session.set_name_once("  "));
        assert!(session.set_name_once("Ana"));
        assert!(!session.set_name_once("Luis"));
        assert_eq!(session.display_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }
}
