//! Transports
//!
//! Thin adapters that turn transport input into [`InboundMessage`]s for the
//! dispatcher and deliver the returned replies.
//!
//! [`InboundMessage`]: crate::bot::InboundMessage

pub mod console;
pub mod gateway;
