//! Timing configuration for observation, settle delays and bounded waits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delays and polling budgets, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Frame URL poll interval.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Quiet period required after a DOM insertion before re-checking.
    #[serde(default = "default_mutation_debounce_ms")]
    pub mutation_debounce_ms: u64,

    /// Delay between a frame load signal and the re-check.
    #[serde(default = "default_load_settle_ms")]
    pub load_settle_ms: u64,

    /// Delay between checking an item and clicking the review control.
    #[serde(default = "default_click_delay_ms")]
    pub click_delay_ms: u64,

    /// Delay before the single retry of the review control lookup.
    #[serde(default = "default_submit_retry_delay_ms")]
    pub submit_retry_delay_ms: u64,

    /// Settle delay after submitting a review.
    #[serde(default = "default_settle_ms")]
    pub list_settle_ms: u64,

    /// Warm-up delay before touching the archive form.
    #[serde(default = "default_form_settle_ms")]
    pub form_settle_ms: u64,

    /// Budget of a bounded wait for a control to appear.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Poll interval of a bounded wait.
    #[serde(default = "default_wait_interval_ms")]
    pub wait_interval_ms: u64,

    /// Extra wait when case-sequence options are not populated yet.
    #[serde(default = "default_case_option_backoff_ms")]
    pub case_option_backoff_ms: u64,

    /// Delay between selecting the case sequence and confirming.
    #[serde(default = "default_confirm_delay_ms")]
    pub confirm_delay_ms: u64,

    /// Settle delay after confirming the archive form.
    #[serde(default = "default_settle_ms")]
    pub archive_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            mutation_debounce_ms: default_mutation_debounce_ms(),
            load_settle_ms: default_load_settle_ms(),
            click_delay_ms: default_click_delay_ms(),
            submit_retry_delay_ms: default_submit_retry_delay_ms(),
            list_settle_ms: default_settle_ms(),
            form_settle_ms: default_form_settle_ms(),
            wait_timeout_ms: default_wait_timeout_ms(),
            wait_interval_ms: default_wait_interval_ms(),
            case_option_backoff_ms: default_case_option_backoff_ms(),
            confirm_delay_ms: default_confirm_delay_ms(),
            archive_settle_ms: default_settle_ms(),
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.mutation_debounce_ms)
    }

    pub fn load_settle(&self) -> Duration {
        Duration::from_millis(self.load_settle_ms)
    }

    pub fn click_delay(&self) -> Duration {
        Duration::from_millis(self.click_delay_ms)
    }

    pub fn submit_retry_delay(&self) -> Duration {
        Duration::from_millis(self.submit_retry_delay_ms)
    }

    pub fn list_settle(&self) -> Duration {
        Duration::from_millis(self.list_settle_ms)
    }

    pub fn form_settle(&self) -> Duration {
        Duration::from_millis(self.form_settle_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn wait_interval(&self) -> Duration {
        Duration::from_millis(self.wait_interval_ms)
    }

    pub fn case_option_backoff(&self) -> Duration {
        Duration::from_millis(self.case_option_backoff_ms)
    }

    pub fn confirm_delay(&self) -> Duration {
        Duration::from_millis(self.confirm_delay_ms)
    }

    pub fn archive_settle(&self) -> Duration {
        Duration::from_millis(self.archive_settle_ms)
    }
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_mutation_debounce_ms() -> u64 {
    500
}

fn default_load_settle_ms() -> u64 {
    1000
}

fn default_click_delay_ms() -> u64 {
    500
}

fn default_submit_retry_delay_ms() -> u64 {
    2000
}

fn default_settle_ms() -> u64 {
    3000
}

fn default_form_settle_ms() -> u64 {
    1000
}

fn default_wait_timeout_ms() -> u64 {
    5000
}

fn default_wait_interval_ms() -> u64 {
    100
}

fn default_case_option_backoff_ms() -> u64 {
    2000
}

fn default_confirm_delay_ms() -> u64 {
    1000
}
