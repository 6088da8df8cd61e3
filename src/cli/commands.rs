//! CLI subcommands: serve, console, init, config, and config loading.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use crate::bot::Dispatcher;
use crate::channels::{console, gateway};
use crate::config::{Config, SecretString};
use crate::provider::GeminiProvider;

/// Load configuration from file or defaults
pub async fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config = if let Some(path) = config_path {
        tracing::info!("Loading configuration from custom path: {}", path);
        Config::load_from_path(path)?
    } else {
        tracing::debug!("Loading default configuration");
        Config::load()?
    };

    // Validate configuration
    config.validate()?;

    Ok(config)
}

/// Wire the provider and dispatcher for commands that answer messages.
fn build_dispatcher(config: &Config) -> Result<Arc<Dispatcher>> {
    config.validate_for_runtime()?;

    let provider = GeminiProvider::from_config(&config.provider)
        .context("Failed to create Gemini HTTP client")?;
    tracing::info!("Using generation endpoint: {}", provider.endpoint());

    Ok(Arc::new(Dispatcher::from_config(config, Arc::new(provider))?))
}

/// Start the HTTP gateway
pub(crate) async fn cmd_serve(config: Config, port: Option<u16>) -> Result<()> {
    let dispatcher = build_dispatcher(&config)?;

    let port = port.unwrap_or(config.gateway.port);
    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, port)
        .parse()
        .with_context(|| format!("Invalid gateway address: {}:{}", config.gateway.bind, port))?;

    println!("💬 chatrelay gateway on http://{addr}");
    println!("   POST /v1/messages  {{\"chat_id\", \"body\", \"sender_name\"?}}");
    println!("   Press Ctrl+C to stop\n");

    gateway::serve(addr, dispatcher).await
}

/// Chat from the terminal
pub(crate) async fn cmd_console(config: Config) -> Result<()> {
    let dispatcher = build_dispatcher(&config)?;

    println!("💬 chatrelay console");
    println!("   Type a message, or `chat_id: message` to talk as another chat.");
    println!("   Ctrl+D to exit\n");

    console::run(dispatcher).await
}

/// Initialize configuration file
pub(crate) async fn cmd_init(force: bool) -> Result<()> {
    println!("💬 chatrelay Configuration Initialization\n");

    let config_path = Config::system_config_path();
    write_default_config(&config_path, force)?;

    println!("✅ Configuration initialized at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set [provider] endpoint and api_key, or API_URL and API_KEY in .env");
    println!("   2. Adjust [persona] and [keywords] for your business");
    println!("   3. Run 'chatrelay console' to try it, 'chatrelay serve' to go live");

    Ok(())
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    // Check if config already exists
    if path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at: {}\nUse --force to overwrite",
            path.display()
        );
    }

    Config::default().save(path)
}

/// Show configuration
pub(crate) async fn cmd_config(config: &Config, show_secrets: bool) -> Result<()> {
    println!("💬 chatrelay Configuration\n");
    println!("{}", render_config(config, show_secrets)?);

    if !show_secrets {
        println!("💡 Use --show-secrets to display the API key");
    }

    Ok(())
}

/// Effective configuration as TOML, with the API key masked unless asked.
fn render_config(config: &Config, show_secrets: bool) -> Result<String> {
    let mut shown = config.clone();
    if !show_secrets && !shown.provider.api_key.is_empty() {
        shown.provider.api_key = SecretString::new(shown.provider.api_key.redacted());
    }
    toml::to_string_pretty(&shown).context("Failed to serialize config to TOML")
}
