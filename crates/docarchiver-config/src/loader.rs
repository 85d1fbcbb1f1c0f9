//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::InvalidValue {
            field: "env".to_string(),
            message: e.to_string(),
        })?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.docarchiver`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.automation.file_code, "03010101");
        assert_eq!(config.browser.frame_id, "dTreeContent");
    }

    #[test]
    fn test_load_automation_section() {
        let content = r#"
            [automation]
            file_code = "05020101"
            case_sequence = "3"
            idle_disable_minutes = 30
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.automation.file_code, "05020101");
        assert_eq!(config.automation.case_sequence, "3");
        assert_eq!(config.automation.idle_disable_minutes, 30);
        assert_eq!(config.automation.case_option_wait_ms, 2000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[browser]").unwrap();
        writeln!(file, "endpoint = \"http://127.0.0.1:9333\"").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.browser.endpoint, "http://127.0.0.1:9333");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/docarchiver.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            ConfigLoader::load_or_default(Path::new("/nonexistent/path/docarchiver.toml")).unwrap();
        assert_eq!(config.timing.poll_interval_ms, 2000);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = ConfigLoader::load_str(include_str!("../../../config/default.toml")).unwrap();
        let defaults = Config::default();
        assert_eq!(config.browser.endpoint, defaults.browser.endpoint);
        assert_eq!(config.pages.list_pattern, defaults.pages.list_pattern);
        assert_eq!(config.pages.review_control_names, defaults.pages.review_control_names);
        assert_eq!(config.timing.list_settle_ms, defaults.timing.list_settle_ms);
        assert_eq!(config.timing.mutation_debounce_ms, defaults.timing.mutation_debounce_ms);
        assert_eq!(config.storage.state_file, defaults.storage.state_file);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("DOCARCHIVER_TEST_FILE_CODE", "01010101");
        }
        let content = "[automation]\nfile_code = \"${DOCARCHIVER_TEST_FILE_CODE}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.automation.file_code, "01010101");
        unsafe {
            std::env::remove_var("DOCARCHIVER_TEST_FILE_CODE");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_DOCARCHIVER_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/state.json");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/state.json"));
    }
}
