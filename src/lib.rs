//! chatrelay - conversation session manager for chat bots
//!
//! Relays messages from a messaging transport to a generative language API
//! (Google Gemini) and hands the replies back, keeping per-chat state along
//! the way.
//!
//! ## Features
//!
//! - **Bounded history:** the last N turns of every chat, evicted oldest first
//! - **Names and greetings:** "me llamo Ana" is remembered, the welcome is sent once
//! - **Keyword replies:** ordered canned responses with misspelling normalization
//! - **One request per chat:** a second message while a reply is pending is
//!   answered with a placeholder instead of a duplicate API call
//! - **Transports:** HTTP gateway for messenger bridges, console for local use
//!
//! ## Quick Start
//!
//! ```bash
//! # Write ~/.chatrelay/config.toml
//! chatrelay init
//!
//! # Serve POST /v1/messages on 127.0.0.1:8787
//! API_URL=... API_KEY=... chatrelay serve
//!
//! # Try it from the terminal
//! chatrelay console
//! ```

pub mod bot;
pub mod channels;
pub mod cli;
pub mod completion;
pub mod config;
pub mod logging;
pub mod provider;
pub mod responder;
pub mod session;
pub mod utils;

pub use bot::{Dispatcher, InboundMessage};
pub use completion::{CompletionFailure, CompletionRequester};
pub use session::SessionStore;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
