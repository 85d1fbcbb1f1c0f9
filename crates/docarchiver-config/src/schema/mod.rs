//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_pages;
mod schema_timing;

pub use schema_pages::*;
pub use schema_timing::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub automation: AutomationSettings,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub pages: PagesConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Browser attachment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote debugging endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Substring used to pick the tab hosting the document system.
    /// The first page target is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url_contains: Option<String>,

    /// Element id of the content iframe.
    #[serde(default = "default_frame_id")]
    pub frame_id: String,

    /// Render notifications as toasts inside the host page.
    #[serde(default = "default_true")]
    pub page_notifications: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            page_url_contains: None,
            frame_id: default_frame_id(),
            page_notifications: true,
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_frame_id() -> String {
    "dTreeContent".to_string()
}

/// Operator settings consumed by the automation session.
///
/// `file_code` and `case_sequence` can also be replaced at runtime through
/// the control console; the session never writes them back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationSettings {
    /// File classification code selected on the archive page.
    #[serde(default = "default_file_code")]
    pub file_code: String,

    /// Case sequence number selected after the file code.
    #[serde(default = "default_case_sequence")]
    pub case_sequence: String,

    /// Minutes after enabling before the session turns itself off.
    #[serde(default = "default_idle_disable_minutes")]
    pub idle_disable_minutes: u64,

    /// Time given to the case-sequence options to load after a file code change.
    #[serde(default = "default_case_option_wait_ms")]
    pub case_option_wait_ms: u64,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            file_code: default_file_code(),
            case_sequence: default_case_sequence(),
            idle_disable_minutes: default_idle_disable_minutes(),
            case_option_wait_ms: default_case_option_wait_ms(),
        }
    }
}

impl AutomationSettings {
    /// Idle auto-disable period.
    pub fn idle_disable_after(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.idle_disable_minutes * 60)
    }

    /// Wait before inspecting the case-sequence options.
    pub fn case_option_wait(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.case_option_wait_ms)
    }

    /// Copy with the two operator fields replaced.
    pub fn with_codes(&self, file_code: impl Into<String>, case_sequence: impl Into<String>) -> Self {
        Self {
            file_code: file_code.into(),
            case_sequence: case_sequence.into(),
            ..self.clone()
        }
    }
}

fn default_file_code() -> String {
    "03010101".to_string()
}

fn default_case_sequence() -> String {
    "1".to_string()
}

fn default_idle_disable_minutes() -> u64 {
    10
}

fn default_case_option_wait_ms() -> u64 {
    2000
}

/// Persisted state location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

fn default_state_file() -> String {
    "~/.docarchiver/state.json".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
