//! Binary-level errors.

use docarchiver_browser::CdpError;
use docarchiver_config::ConfigError;
use docarchiver_core::{AutomationError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Browser(#[from] CdpError),

    #[error(transparent)]
    Automation(#[from] AutomationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid configuration:\n{0}")]
    InvalidConfig(String),
}
