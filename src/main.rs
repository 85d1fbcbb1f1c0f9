//! docarchiver - review and archive filing agent for the document system.
//!
//! Attaches to a browser started with `--remote-debugging-port` and drives
//! the document system's content frame.

mod agent;
mod console;
mod error;
mod store;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use docarchiver_config::{Config, ConfigLoader, ConfigValidator};

use crate::error::AgentError;

/// docarchiver CLI.
#[derive(Parser)]
#[command(name = "docarchiver")]
#[command(about = "Automated review and archive filing for the document system")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Attach to the browser and run the agent (default)
    Run {
        /// DevTools HTTP endpoint, overrides `browser.endpoint`
        #[arg(long, env = "DOCARCHIVER_ENDPOINT")]
        endpoint: Option<String>,

        /// Substring of the tab URL to attach to
        #[arg(long)]
        page: Option<String>,
    },

    /// Print the effective configuration and validation findings
    Config,
}

fn docarchiver_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".docarchiver")
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = docarchiver_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("docarchiver")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the file writer on drop.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Load and validate the configuration. Warnings are logged.
fn load_config(path: &Path) -> Result<Config, AgentError> {
    let config = ConfigLoader::load_or_default(path)?;
    let result = ConfigValidator::validate(&config);
    for warning in &result.warnings {
        warn!("{}: {}", warning.path, warning.message);
    }
    if !result.is_valid() {
        let errors: Vec<String> = result
            .errors
            .iter()
            .map(|e| format!("  {}: {}", e.path, e.message))
            .collect();
        return Err(AgentError::InvalidConfig(errors.join("\n")));
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = load_config(&cli.config)?;
            agent::run(config).await?;
        }
        Some(Commands::Run { endpoint, page }) => {
            let mut config = load_config(&cli.config)?;
            if let Some(endpoint) = endpoint {
                config.browser.endpoint = endpoint;
            }
            if page.is_some() {
                config.browser.page_url_contains = page;
            }
            info!(endpoint = %config.browser.endpoint, "Starting docarchiver");
            agent::run(config).await?;
        }
        Some(Commands::Config) => {
            let config = load_config(&cli.config)?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
