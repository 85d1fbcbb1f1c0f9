use super::*;

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_invalid_endpoint() {
    let mut config = Config::default();
    config.browser.endpoint = "localhost:9222".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "browser.endpoint"));
}

#[test]
fn test_validate_zero_idle_minutes() {
    let mut config = Config::default();
    config.automation.idle_disable_minutes = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "automation.idle_disable_minutes"));
}

#[test]
fn test_validate_non_numeric_file_code_warns() {
    let mut config = Config::default();
    config.automation.file_code = "abc".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "automation.file_code"));
}

#[test]
fn test_validate_bad_pattern() {
    let mut config = Config::default();
    config.pages.archive_pattern = "AOSDA062F_s18(".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "pages.archive_pattern"));
}

#[test]
fn test_validate_wait_interval_exceeds_timeout() {
    let mut config = Config::default();
    config.timing.wait_interval_ms = 10_000;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "timing.wait_interval_ms"));
}

#[test]
fn test_into_result_reports_first_error() {
    let mut config = Config::default();
    config.browser.frame_id.clear();

    let err = ConfigValidator::validate(&config).into_result().unwrap_err();
    assert!(err.to_string().contains("browser.frame_id"));
}

#[test]
fn test_into_result_passes_warnings() {
    let mut config = Config::default();
    config.pages.review_control_names.clear();

    let warnings = ConfigValidator::validate(&config).into_result().unwrap();
    assert_eq!(warnings.len(), 1);
}
