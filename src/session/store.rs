//! Session Store
//!
//! Owns the `chat_id -> ChatSession` map. Every operation touches a single
//! chat and runs under that chat's entry lock, so concurrent messages for the
//! same chat cannot interleave inside an operation while different chats never
//! contend on a global lock.

use super::{ChatSession, Role, Turn};
use dashmap::DashMap;

/// Backing map for a [`SessionStore`].
///
/// Implementations must run `with_session` under an exclusive per-chat lock.
pub trait SessionBackend: Send + Sync {
    /// Run `f` on the session for `chat_id`, creating a fresh one first if
    /// the chat has not been seen.
    fn with_session<R>(&self, chat_id: &str, f: impl FnOnce(&mut ChatSession) -> R) -> R;

    /// Snapshot of an existing session.
    fn get(&self, chat_id: &str) -> Option<ChatSession>;

    /// Number of known chats.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Volatile in-process backend (sharded concurrent map).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    sessions: DashMap<String, ChatSession>,
}

impl SessionBackend for MemoryBackend {
    fn with_session<R>(&self, chat_id: &str, f: impl FnOnce(&mut ChatSession) -> R) -> R {
        let mut entry = self
            .sessions
            .entry(chat_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(chat_id, "Creating chat session");
                ChatSession::new(chat_id)
            });
        f(&mut entry)
    }

    fn get(&self, chat_id: &str) -> Option<ChatSession> {
        self.sessions.get(chat_id).map(|entry| entry.value().clone())
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

/// Per-chat conversation state with a bounded history.
#[derive(Debug)]
pub struct SessionStore<B: SessionBackend = MemoryBackend> {
    backend: B,
    max_history: usize,
}

impl SessionStore<MemoryBackend> {
    /// In-memory store keeping at most `max_history` turns per chat.
    pub fn new(max_history: usize) -> Self {
        Self::with_backend(MemoryBackend::default(), max_history)
    }
}

impl<B: SessionBackend> SessionStore<B> {
    pub fn with_backend(backend: B, max_history: usize) -> Self {
        Self {
            backend,
            max_history: max_history.max(1),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Existing session for `chat_id`, or a fresh one.
    pub fn get_or_create(&self, chat_id: &str) -> ChatSession {
        self.backend.with_session(chat_id, |session| session.clone())
    }

    /// Snapshot without creating.
    pub fn snapshot(&self, chat_id: &str) -> Option<ChatSession> {
        self.backend.get(chat_id)
    }

    /// Append a turn to the chat's history, evicting from the front to stay
    /// within the bound.
    pub fn record_message(&self, chat_id: &str, role: Role, text: impl Into<String>) {
        let max_history = self.max_history;
        let turn = Turn::new(role, text);
        self.backend
            .with_session(chat_id, |session| session.push_turn(turn, max_history));
    }

    /// Set the display name if none is set yet. Returns whether it took effect.
    pub fn try_set_name(&self, chat_id: &str, candidate: &str) -> bool {
        let set = self
            .backend
            .with_session(chat_id, |session| session.set_name_once(candidate));
        if set {
            tracing::info!(chat_id, name = candidate, "Chat display name set");
        }
        set
    }

    /// Flip the greeted flag. Returns `true` only for the first call per chat.
    pub fn try_mark_greeted(&self, chat_id: &str) -> bool {
        self.backend.with_session(chat_id, |session| {
            !std::mem::replace(&mut session.greeted, true)
        })
    }

    /// Claim the chat's generation slot.
    ///
    /// Returns `None` when a request for this chat is already in flight. The
    /// returned guard clears the flag when dropped, on every exit path.
    pub fn try_begin_request(&self, chat_id: &str) -> Option<RequestGuard<'_, B>> {
        let acquired = self.backend.with_session(chat_id, |session| {
            !std::mem::replace(&mut session.request_in_flight, true)
        });
        if !acquired {
            tracing::debug!(chat_id, "Generation request already in flight");
            return None;
        }
        Some(RequestGuard {
            store: self,
            chat_id: chat_id.to_string(),
        })
    }

    /// Clear the chat's in-flight flag.
    pub fn end_request(&self, chat_id: &str) {
        self.backend
            .with_session(chat_id, |session| session.request_in_flight = false);
    }

    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }
}

/// Held while a generation request for one chat is outstanding.
#[must_use = "dropping the guard immediately releases the chat's request slot"]
pub struct RequestGuard<'a, B: SessionBackend = MemoryBackend> {
    store: &'a SessionStore<B>,
    chat_id: String,
}

impl<B: SessionBackend> Drop for RequestGuard<'_, B> {
    fn drop(&mut self) {
        self.store.end_request(&self.chat_id);
    }
}
