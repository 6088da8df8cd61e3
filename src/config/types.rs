//! Configuration types, defaults, loading, and validation.

use super::secrets::SecretString;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generation API (Gemini) configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Per-chat session bounds
    #[serde(default)]
    pub session: SessionConfig,

    /// Persona instructions, welcome message and reply signature
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Fixed user-facing replies for failure paths
    #[serde(default)]
    pub messages: MessagesConfig,

    /// Ordered keyword table
    #[serde(default)]
    pub keywords: KeywordsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Generation API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// `generateContent` endpoint URL
    #[serde(default)]
    pub endpoint: String,

    /// API key (usually loaded from `API_KEY`)
    #[serde(default, skip_serializing_if = "SecretString::is_empty")]
    pub api_key: SecretString,

    /// Output length hint sent as `maxOutputTokens`
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Total request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_max_output_tokens() -> u32 {
    512
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: SecretString::default(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Per-chat session bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Turns kept per chat (oldest evicted first)
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Generated replies longer than this (in characters) are cut at a word boundary
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,
}

fn default_max_history() -> usize {
    10
}

fn default_max_reply_chars() -> usize {
    1500
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            max_reply_chars: default_max_reply_chars(),
        }
    }
}

/// Persona and presentation
///
/// `{name}` in `welcome` and in keyword responses expands to `", <name>"` when
/// the chat's name is known and to nothing otherwise, so `"¡Hola{name}!"`
/// renders as `"¡Hola, Ana!"` or `"¡Hola!"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// System instructions sent ahead of the history
    #[serde(default = "default_instructions")]
    pub instructions: String,

    /// Sent once per chat, before the first reply. Empty disables it.
    #[serde(default = "default_welcome")]
    pub welcome: String,

    /// Appended to generated replies. Empty disables it.
    #[serde(default)]
    pub signature: String,
}

fn default_instructions() -> String {
    "Eres un asistente virtual amable que atiende clientes por WhatsApp. \
     Responde en español, de forma breve, clara y cordial. \
     Si no sabes algo, dilo y sugiere escribir \"menu\" para ver las opciones."
        .to_string()
}

fn default_welcome() -> String {
    "👋 ¡Hola{name}! Soy el asistente virtual. Escribe \"menu\" para ver las opciones \
     o cuéntame en qué te puedo ayudar."
        .to_string()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            instructions: default_instructions(),
            welcome: default_welcome(),
            signature: String::new(),
        }
    }
}

/// Fixed replies for the paths that never reach the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesConfig {
    /// Generation API credentials are missing
    #[serde(default = "default_not_configured")]
    pub not_configured: String,

    /// A previous message from the same chat is still being answered
    #[serde(default = "default_processing")]
    pub processing: String,

    /// The generation call failed or returned a non-success status
    #[serde(default = "default_provider_error")]
    pub provider_error: String,

    /// The generation call succeeded but carried no text
    #[serde(default = "default_no_answer")]
    pub no_answer: String,

    /// The inbound message had no text
    #[serde(default = "default_not_understood")]
    pub not_understood: String,
}

fn default_not_configured() -> String {
    "⚠️ No tengo acceso a la IA en este momento.".to_string()
}

fn default_processing() -> String {
    "⏳ Estoy procesando tu mensaje anterior, dame un momento por favor.".to_string()
}

fn default_provider_error() -> String {
    "❌ Error al conectar con la IA. Intenta de nuevo en unos minutos.".to_string()
}

fn default_no_answer() -> String {
    "⚠️ No recibí respuesta.".to_string()
}

fn default_not_understood() -> String {
    "⚠️ No entendí tu mensaje, intenta de nuevo.".to_string()
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            not_configured: default_not_configured(),
            processing: default_processing(),
            provider_error: default_provider_error(),
            no_answer: default_no_answer(),
            not_understood: default_not_understood(),
        }
    }
}

/// Ordered keyword table. Rule order decides which response wins when a
/// message contains triggers of more than one rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordsConfig {
    /// Whole-word rewrites applied before matching (common misspellings)
    #[serde(default = "default_substitutions")]
    pub substitutions: Vec<SubstitutionConfig>,

    /// Rules tried in order; first rule with a matching trigger wins
    #[serde(default = "default_rules")]
    pub rules: Vec<KeywordRuleConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionConfig {
    pub from: String,
    pub to: String,
}

/// How a rule's triggers are compared with the normalized message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMatch {
    /// Trigger appears anywhere in the message
    #[default]
    Contains,
    /// Trigger appears as a whole word (`1` does not match `4521`)
    Word,
    /// Trimmed message equals the trigger
    Exact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRuleConfig {
    pub triggers: Vec<String>,
    pub response: String,

    #[serde(default, rename = "match")]
    pub matching: TriggerMatch,
}

fn substitution(from: &str, to: &str) -> SubstitutionConfig {
    SubstitutionConfig {
        from: from.to_string(),
        to: to.to_string(),
    }
}

fn rule(triggers: &[&str], response: &str) -> KeywordRuleConfig {
    KeywordRuleConfig {
        triggers: triggers.iter().map(|t| t.to_string()).collect(),
        response: response.to_string(),
        matching: TriggerMatch::Contains,
    }
}

/// Menu options are digits, which also show up inside times, prices and ages.
fn option_rule(option: &str, response: &str) -> KeywordRuleConfig {
    KeywordRuleConfig {
        matching: TriggerMatch::Word,
        ..rule(&[option], response)
    }
}

fn default_substitutions() -> Vec<SubstitutionConfig> {
    vec![
        substitution("wacmr", "1"),
        substitution("wacmer", "1"),
        substitution("guacmr", "1"),
        substitution("orario", "horario"),
        substitution("orarios", "horario"),
        substitution("menú", "menu"),
    ]
}

fn default_rules() -> Vec<KeywordRuleConfig> {
    vec![
        option_rule(
            "1",
            "📌 *Servicio WACMR*\n\
             Instalación, mantenimiento y soporte técnico a domicilio.\n\
             Escribe \"horario\" para saber cuándo atendemos o \"pago\" para ver los medios de pago.",
        ),
        option_rule(
            "2",
            "🕒 *Horario de atención*\n\
             Lunes a viernes: 9:00 a 18:00\n\
             Sábados: 9:00 a 13:00\n\
             Domingos y feriados: cerrado",
        ),
        option_rule(
            "3",
            "💳 *Medios de pago*\n\
             • Transferencia bancaria\n\
             • Tarjeta de débito o crédito\n\
             • Efectivo en nuestras oficinas",
        ),
        rule(
            &["menu", "opciones"],
            "📋 *Menú principal*{name}\n\
             1️⃣ Información del servicio WACMR\n\
             2️⃣ Horario de atención\n\
             3️⃣ Medios de pago\n\
             Responde con el número de la opción.",
        ),
        rule(
            &["horario", "atienden"],
            "🕒 Atendemos de lunes a viernes de 9:00 a 18:00 y los sábados de 9:00 a 13:00.",
        ),
        rule(
            &["pago", "pagar", "precio"],
            "💳 Aceptamos transferencia bancaria, tarjetas y efectivo. \
             Escribe \"3\" para ver el detalle.",
        ),
        rule(
            &["hola", "buenas"],
            "👋 ¡Hola{name}! ¿En qué te puedo ayudar? Escribe \"menu\" para ver las opciones.",
        ),
    ]
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            substitutions: default_substitutions(),
            rules: default_rules(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily log files. Setting it turns file logging on
    /// outside debug mode too.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway port (default: 8787)
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default: "127.0.0.1")
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8787
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Canonical base directory: `~/.chatrelay/`
pub fn chatrelay_home() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".chatrelay")
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. System config: ~/.chatrelay/config.toml
    /// 3. Local config: ./chatrelay.toml
    /// 4. Environment variables
    pub fn load() -> Result<Self> {
        tracing::debug!("Loading configuration...");

        let mut config = Self::default();

        let system_config_path = Self::system_config_path();
        if system_config_path.exists() {
            tracing::debug!("Loading system config from: {:?}", system_config_path);
            config = Self::merge_from_file(config, &system_config_path)?;
        }

        let local_config_path = Self::local_config_path();
        if local_config_path.exists() {
            tracing::debug!("Loading local config from: {:?}", local_config_path);
            config = Self::merge_from_file(config, &local_config_path)?;
        }

        config = Self::apply_env_overrides(config)?;

        tracing::debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply environment
    /// overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from custom path: {:?}", path);

        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        let config = Self::merge_from_file(Self::default(), path)?;
        let config = Self::apply_env_overrides(config)?;

        tracing::debug!("Configuration loaded successfully from custom path");
        Ok(config)
    }

    /// Get the system config path: ~/.chatrelay/config.toml
    pub fn system_config_path() -> PathBuf {
        chatrelay_home().join("config.toml")
    }

    /// Get the local config path: ./chatrelay.toml
    fn local_config_path() -> PathBuf {
        PathBuf::from("./chatrelay.toml")
    }

    /// Load and merge configuration from a TOML file
    fn merge_from_file(base: Self, path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let file_config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(Self::merge(base, file_config))
    }

    /// Merge two configs. Sections come from the overlay (absent sections were
    /// already filled with defaults by serde); credentials that the overlay
    /// leaves blank keep the base value.
    fn merge(base: Self, mut overlay: Self) -> Self {
        if overlay.provider.endpoint.trim().is_empty() {
            overlay.provider.endpoint = base.provider.endpoint.clone();
        }
        if overlay.provider.api_key.is_empty() {
            overlay.provider.api_key = base.provider.api_key.clone();
        }
        overlay
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: Self) -> Result<Self> {
        Self::apply_overrides(config, |key| std::env::var(key).ok())
    }

    fn apply_overrides(mut config: Self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Endpoint and credential, under the names the bot has always used
        if let Some(url) = var("API_URL").or_else(|| var("GEMINI_API_URL")) {
            config.provider.endpoint = url;
        }
        if let Some(key) = var("API_KEY").or_else(|| var("GEMINI_API_KEY")) {
            config.provider.api_key = SecretString::from(key);
        }

        if let Some(level) = var("CHATRELAY_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(file) = var("CHATRELAY_LOG_FILE") {
            config.logging.file = Some(PathBuf::from(file));
        }

        if let Some(max) = var("CHATRELAY_MAX_HISTORY") {
            config.session.max_history = max
                .parse()
                .with_context(|| format!("CHATRELAY_MAX_HISTORY is not a number: {max}"))?;
        }

        if let Some(max) = var("CHATRELAY_MAX_REPLY_CHARS") {
            config.session.max_reply_chars = max
                .parse()
                .with_context(|| format!("CHATRELAY_MAX_REPLY_CHARS is not a number: {max}"))?;
        }

        if let Some(port) = var("CHATRELAY_GATEWAY_PORT") {
            config.gateway.port = port
                .parse()
                .with_context(|| format!("CHATRELAY_GATEWAY_PORT is not a port: {port}"))?;
        }

        Ok(config)
    }

    /// Whether both generation API settings are present.
    pub fn has_provider_credentials(&self) -> bool {
        !self.provider.endpoint.trim().is_empty() && !self.provider.api_key.is_empty()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        tracing::debug!("Validating configuration...");

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        if self.session.max_history == 0 {
            anyhow::bail!("session.max_history must be at least 1");
        }

        if self.session.max_reply_chars < 16 {
            anyhow::bail!(
                "session.max_reply_chars must be at least 16 (got {})",
                self.session.max_reply_chars
            );
        }

        for (i, rule) in self.keywords.rules.iter().enumerate() {
            if rule.triggers.iter().all(|t| t.trim().is_empty()) {
                anyhow::bail!("keywords.rules[{i}] has no triggers");
            }
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Validation for commands that talk to the generation API: the endpoint
    /// and the credential are both required.
    pub fn validate_for_runtime(&self) -> Result<()> {
        self.validate()?;

        if self.provider.endpoint.trim().is_empty() {
            anyhow::bail!(
                "Generation API endpoint is not configured.\n\n\
                 Set API_URL (or [provider] endpoint in {:?})",
                Self::system_config_path()
            );
        }
        if self.provider.api_key.is_empty() {
            anyhow::bail!(
                "Generation API key is not configured.\n\n\
                 Set API_KEY (or [provider] api_key in {:?})",
                Self::system_config_path()
            );
        }
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Configuration saved to: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.session.max_history, 10);
        assert_eq!(config.session.max_reply_chars, 1500);
        assert_eq!(config.gateway.port, 8787);
        assert!(!config.keywords.rules.is_empty());
        assert!(!config.has_provider_credentials());
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_history() {
        let mut config = Config::default();
        config.session.max_history = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rule_without_triggers() {
        let mut config = Config::default();
        config.keywords.rules.push(KeywordRuleConfig {
            triggers: vec![" ".to_string()],
            response: "x".to_string(),
            matching: TriggerMatch::Contains,
        });
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("no triggers"), "{err}");
    }

    #[test]
    fn test_runtime_validation_requires_endpoint_and_key() {
        let mut config = Config::default();
        let err = config.validate_for_runtime().unwrap_err().to_string();
        assert!(err.contains("endpoint"), "{err}");

        config.provider.endpoint = "https://example.test/v1/models/m:generateContent".into();
        let err = config.validate_for_runtime().unwrap_err().to_string();
        assert!(err.contains("key"), "{err}");

        config.provider.api_key = SecretString::new("k");
        assert!(config.validate_for_runtime().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_content = r#"
[provider]
endpoint = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
max_output_tokens = 256

[session]
max_history = 5

[logging]
level = "debug"

[persona]
signature = "Atte. Equipo WACMR"
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.provider.endpoint.ends_with(":generateContent"));
        assert_eq!(config.provider.max_output_tokens, 256);
        assert_eq!(config.provider.timeout_secs, 60);
        assert_eq!(config.session.max_history, 5);
        assert_eq!(config.session.max_reply_chars, 1500);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.persona.signature, "Atte. Equipo WACMR");
        assert!(config.persona.welcome.contains("{name}"));
    }

    #[test]
    fn test_keywords_from_toml_keep_declared_order() {
        let toml_content = r#"
[keywords]
substitutions = [{ from = "ola", to = "hola" }]

[[keywords.rules]]
triggers = ["precio"]
response = "Desde $10"

[[keywords.rules]]
triggers = ["hola", "buenas"]
response = "Hola{name}"
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.keywords.substitutions, vec![substitution("ola", "hola")]);
        let triggers: Vec<_> = config
            .keywords
            .rules
            .iter()
            .map(|r| r.triggers[0].as_str())
            .collect();
        assert_eq!(triggers, vec!["precio", "hola"]);
    }

    #[test]
    fn test_keyword_match_mode_from_toml() {
        let toml_content = r#"
[[keywords.rules]]
triggers = ["4"]
match = "word"
response = "Opción 4"

[[keywords.rules]]
triggers = ["ok"]
match = "exact"
response = "👍"

[[keywords.rules]]
triggers = ["gracias"]
response = "De nada"
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        let modes: Vec<_> = config.keywords.rules.iter().map(|r| r.matching).collect();
        assert_eq!(
            modes,
            vec![TriggerMatch::Word, TriggerMatch::Exact, TriggerMatch::Contains]
        );

        let bad = r#"
[[keywords.rules]]
triggers = ["x"]
match = "fuzzy"
response = "x"
        "#;
        assert!(toml::from_str::<Config>(bad).is_err());
    }

    #[test]
    fn test_default_menu_options_match_whole_words() {
        let options: Vec<_> = default_rules()
            .into_iter()
            .filter(|r| r.matching == TriggerMatch::Word)
            .flat_map(|r| r.triggers)
            .collect();
        assert_eq!(options, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_keywords_section_without_rules_keeps_default_rules() {
        let config: Config = toml::from_str("[keywords]\nsubstitutions = []\n").unwrap();
        assert!(config.keywords.substitutions.is_empty());
        assert_eq!(config.keywords.rules, default_rules());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::apply_overrides(
            Config::default(),
            env(&[
                ("API_URL", "https://example.test/generate"),
                ("API_KEY", "secret-key"),
                ("CHATRELAY_MAX_HISTORY", "6"),
                ("CHATRELAY_LOG_LEVEL", "warn"),
                ("CHATRELAY_GATEWAY_PORT", "9000"),
            ]),
        )
        .unwrap();

        assert_eq!(config.provider.endpoint, "https://example.test/generate");
        assert_eq!(config.provider.api_key.expose_secret(), "secret-key");
        assert_eq!(config.session.max_history, 6);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.gateway.port, 9000);
        assert!(config.has_provider_credentials());
    }

    #[test]
    fn test_env_gemini_aliases() {
        let config = Config::apply_overrides(
            Config::default(),
            env(&[("GEMINI_API_URL", "https://g.test"), ("GEMINI_API_KEY", "g")]),
        )
        .unwrap();
        assert_eq!(config.provider.endpoint, "https://g.test");
        assert_eq!(config.provider.api_key.expose_secret(), "g");
    }

    #[test]
    fn test_env_override_rejects_non_numeric_history() {
        let result = Config::apply_overrides(
            Config::default(),
            env(&[("CHATRELAY_MAX_HISTORY", "lots")]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_keeps_base_credentials_when_overlay_blank() {
        let mut base = Config::default();
        base.provider.endpoint = "https://base.test".into();
        base.provider.api_key = SecretString::new("base-key");

        let overlay: Config = toml::from_str("[session]\nmax_history = 3\n").unwrap();
        let merged = Config::merge(base, overlay);

        assert_eq!(merged.provider.endpoint, "https://base.test");
        assert_eq!(merged.provider.api_key.expose_secret(), "base-key");
        assert_eq!(merged.session.max_history, 3);
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.session.max_history = 7;
        config.persona.signature = "Atte. Bot".to_string();

        config.save(temp_file.path()).unwrap();

        let loaded = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(loaded.session.max_history, 7);
        assert_eq!(loaded.persona.signature, "Atte. Bot");
        assert_eq!(loaded.keywords.rules, config.keywords.rules);
    }

    #[test]
    fn test_save_omits_empty_api_key() {
        let temp_file = NamedTempFile::new().unwrap();
        Config::default().save(temp_file.path()).unwrap();
        let contents = fs::read_to_string(temp_file.path()).unwrap();
        assert!(!contents.contains("api_key"));
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Config::load_from_path(dir.path().join("nope.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_system_config_path() {
        let path = Config::system_config_path();
        assert!(path.to_string_lossy().contains(".chatrelay"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_local_config_path() {
        assert_eq!(Config::local_config_path(), PathBuf::from("./chatrelay.toml"));
    }
}
