//! Page recognition configuration.

use serde::{Deserialize, Serialize};

/// URL patterns and control labels of the two automated pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    /// Regex matched against the frame URL of the review list page.
    #[serde(default = "default_list_pattern")]
    pub list_pattern: String,

    /// Regex matched against the frame URL of the archive filing page.
    #[serde(default = "default_archive_pattern")]
    pub archive_pattern: String,

    /// Visible label of the review submission control.
    #[serde(default = "default_review_label")]
    pub review_label: String,

    /// Known `name` attributes of the review submission control, most
    /// preferred first.
    #[serde(default = "default_review_control_names")]
    pub review_control_names: Vec<String>,

    /// Visible label of the archive confirmation control.
    #[serde(default = "default_archive_confirm_label")]
    pub archive_confirm_label: String,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            list_pattern: default_list_pattern(),
            archive_pattern: default_archive_pattern(),
            review_label: default_review_label(),
            review_control_names: default_review_control_names(),
            archive_confirm_label: default_archive_confirm_label(),
        }
    }
}

fn default_list_pattern() -> String {
    r"AOSDA006F_s02\.jsp".to_string()
}

fn default_archive_pattern() -> String {
    r"AOSDA062F_s18\.jsp".to_string()
}

fn default_review_label() -> String {
    "存查".to_string()
}

fn default_review_control_names() -> Vec<String> {
    ["000011803", "000011703", "000011903", "000011603"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_archive_confirm_label() -> String {
    "確定存檔".to_string()
}
