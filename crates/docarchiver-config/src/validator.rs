//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a `ConfigError`.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_browser(config, &mut result);
        Self::validate_automation(config, &mut result);
        Self::validate_timing(config, &mut result);
        Self::validate_pages(config, &mut result);

        result
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let endpoint = &config.browser.endpoint;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            result.add_error(ValidationError::new(
                "browser.endpoint",
                "Endpoint must start with http:// or https://",
            ));
        }

        if config.browser.frame_id.is_empty() {
            result.add_error(ValidationError::new(
                "browser.frame_id",
                "Frame id cannot be empty",
            ));
        }
    }

    fn validate_automation(config: &Config, result: &mut ValidationResult) {
        let automation = &config.automation;

        if automation.file_code.is_empty() {
            result.add_error(ValidationError::new(
                "automation.file_code",
                "File code cannot be empty",
            ));
        } else if !automation.file_code.chars().all(|c| c.is_ascii_digit()) {
            result.add_warning(ValidationWarning::new(
                "automation.file_code",
                "File code is usually numeric, the select may not contain this value",
            ));
        }

        if automation.case_sequence.is_empty() {
            result.add_error(ValidationError::new(
                "automation.case_sequence",
                "Case sequence cannot be empty",
            ));
        }

        if automation.idle_disable_minutes == 0 {
            result.add_error(ValidationError::new(
                "automation.idle_disable_minutes",
                "idle_disable_minutes must be greater than 0",
            ));
        }

        if automation.idle_disable_minutes > 240 {
            result.add_warning(ValidationWarning::new(
                "automation.idle_disable_minutes",
                "idle_disable_minutes is very high (>240), the session may run unattended for hours",
            ));
        }
    }

    fn validate_timing(config: &Config, result: &mut ValidationResult) {
        let timing = &config.timing;

        if timing.poll_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "timing.poll_interval_ms",
                "poll_interval_ms must be greater than 0",
            ));
        }

        if timing.wait_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "timing.wait_interval_ms",
                "wait_interval_ms must be greater than 0",
            ));
        }

        if timing.wait_interval_ms > timing.wait_timeout_ms {
            result.add_error(ValidationError::new(
                "timing.wait_interval_ms",
                "wait_interval_ms cannot exceed wait_timeout_ms",
            ));
        }

        if timing.list_settle_ms < timing.load_settle_ms {
            result.add_warning(ValidationWarning::new(
                "timing.list_settle_ms",
                "list_settle_ms is shorter than load_settle_ms, the next cycle may see the stale list",
            ));
        }
    }

    fn validate_pages(config: &Config, result: &mut ValidationResult) {
        let pages = &config.pages;

        for (path, pattern) in [
            ("pages.list_pattern", &pages.list_pattern),
            ("pages.archive_pattern", &pages.archive_pattern),
        ] {
            if let Err(e) = regex::Regex::new(pattern) {
                result.add_error(ValidationError::new(path, format!("Invalid regex: {}", e)));
            }
        }

        if pages.review_label.is_empty() {
            result.add_error(ValidationError::new(
                "pages.review_label",
                "Review label cannot be empty",
            ));
        }

        if pages.archive_confirm_label.is_empty() {
            result.add_error(ValidationError::new(
                "pages.archive_confirm_label",
                "Archive confirm label cannot be empty",
            ));
        }

        if pages.review_control_names.is_empty() {
            result.add_warning(ValidationWarning::new(
                "pages.review_control_names",
                "No known control names, lookup will rely on label scans only",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
