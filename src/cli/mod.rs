//! CLI Module
//!
//! Command-line interface for chatrelay using Clap v4.

mod commands;

pub use commands::load_config;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;

/// chatrelay - per-chat conversation sessions, keyword replies and Gemini
/// completions for messaging transports
#[derive(Parser, Debug)]
#[command(name = "chatrelay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug mode (creates log files in ~/.chatrelay/logs/)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP gateway (default)
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat from the terminal: one message per line, `chat_id: text` to pick a chat
    Console,

    /// Initialize configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration
    Config {
        /// Show full configuration including secrets
        #[arg(short, long)]
        show_secrets: bool,
    },
}

/// Main CLI entry point
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        None => commands::cmd_serve(config, None).await,
        Some(Commands::Serve { port }) => commands::cmd_serve(config, port).await,
        Some(Commands::Console) => commands::cmd_console(config).await,
        Some(Commands::Init { force }) => commands::cmd_init(force).await,
        Some(Commands::Config { show_secrets }) => commands::cmd_config(&config, show_secrets).await,
    }
}
