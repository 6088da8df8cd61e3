//! Configuration Module
//!
//! Handles application configuration loading, validation, and management.

pub mod secrets;
mod types;

pub use secrets::SecretString;
pub use types::{
    chatrelay_home, Config, GatewayConfig, KeywordRuleConfig, KeywordsConfig, LoggingConfig,
    MessagesConfig, PersonaConfig, ProviderConfig, SessionConfig, SubstitutionConfig,
    TriggerMatch,
};
