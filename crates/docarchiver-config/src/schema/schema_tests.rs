use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.browser.endpoint, "http://localhost:9222");
    assert_eq!(config.browser.frame_id, "dTreeContent");
    assert!(config.browser.page_url_contains.is_none());
    assert_eq!(config.automation.case_sequence, "1");
    assert_eq!(config.storage.state_file, "~/.docarchiver/state.json");
}

#[test]
fn test_automation_settings_durations() {
    let settings = AutomationSettings::default();
    assert_eq!(settings.idle_disable_after(), std::time::Duration::from_secs(600));
    assert_eq!(settings.case_option_wait(), std::time::Duration::from_millis(2000));
}

#[test]
fn test_automation_settings_with_codes() {
    let settings = AutomationSettings {
        idle_disable_minutes: 25,
        ..AutomationSettings::default()
    };
    let updated = settings.with_codes("07010203", "4");
    assert_eq!(updated.file_code, "07010203");
    assert_eq!(updated.case_sequence, "4");
    assert_eq!(updated.idle_disable_minutes, 25);
}

#[test]
fn test_timing_defaults() {
    let timing = TimingConfig::default();
    assert_eq!(timing.poll_interval(), std::time::Duration::from_secs(2));
    assert_eq!(timing.mutation_debounce_ms, 500);
    assert_eq!(timing.list_settle_ms, 3000);
    assert_eq!(timing.archive_settle_ms, 3000);
    assert_eq!(timing.wait_timeout_ms, 5000);
    assert_eq!(timing.wait_interval_ms, 100);
}

#[test]
fn test_pages_defaults() {
    let pages = PagesConfig::default();
    assert_eq!(pages.review_label, "存查");
    assert_eq!(pages.review_control_names[0], "000011803");
    assert_eq!(pages.review_control_names.len(), 4);
    assert_eq!(pages.archive_confirm_label, "確定存檔");
}

#[test]
fn test_config_serialization_roundtrip_keeps_codes() {
    let mut config = Config::default();
    config.automation.file_code = "09090909".to_string();
    let text = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed.automation.file_code, "09090909");
}

#[test]
fn test_partial_timing_section() {
    let parsed: Config = toml::from_str("[timing]\npoll_interval_ms = 5000\n").unwrap();
    assert_eq!(parsed.timing.poll_interval_ms, 5000);
    assert_eq!(parsed.timing.load_settle_ms, 1000);
}
