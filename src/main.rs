use anyhow::Result;
use chatrelay::{cli, logging};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file before anything else (silently ignore if missing)
    dotenvy::dotenv().ok();

    let cli_args = cli::Cli::parse();

    let config = cli::load_config(cli_args.config.as_deref()).await?;

    // Initialize logging from the --debug flag and the [logging] section
    let mut log_config = logging::LogConfig::new()
        .with_debug_mode(cli_args.debug)
        .with_level(config.logging.level.clone())
        .with_file_logging(config.logging.file.is_some());

    if let Ok(log_dir) = std::env::var("CHATRELAY_LOG_DIR") {
        log_config = log_config.with_log_dir(std::path::PathBuf::from(log_dir));
    } else if let Some(dir) = config.logging.file.clone() {
        log_config = log_config.with_log_dir(dir);
    }

    let _guard = logging::init_logging(log_config.clone())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    // Clean up old log files (keep last 7 days)
    if let Ok(removed) = logging::cleanup_old_logs(&log_config, 7)
        && removed > 0
    {
        tracing::info!("🧹 Cleaned up {} old log file(s)", removed);
    }

    cli::run(cli_args, config).await
}
