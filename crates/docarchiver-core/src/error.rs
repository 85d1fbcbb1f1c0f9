//! Error types for the automation core.

use thiserror::Error;

use crate::dom::NodeRef;

/// Failures reading or mutating the embedded frame.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomError {
    /// The content frame element is not in the host document.
    #[error("Content frame not found: {0}")]
    FrameAbsent(String),

    /// The frame document cannot be read from the host page.
    #[error("Content frame is not accessible: {0}")]
    CrossOrigin(String),

    /// A previously located node is no longer attached to the frame document.
    #[error("Node {0} is detached from the document")]
    Detached(NodeRef),

    /// The page-side script failed.
    #[error("Script error: {0}")]
    Script(String),
}

/// Automation failures, as reported to the operator.
#[derive(Debug, Clone, Error)]
pub enum AutomationError {
    /// A control did not appear within its wait budget.
    #[error("{control} did not appear within {waited_ms} ms")]
    TransientNotFound { control: String, waited_ms: u64 },

    /// A select does not offer the configured value.
    #[error("{control} has no option {value}")]
    OptionUnavailable { control: String, value: String },

    /// A container the workflow depends on is missing or empty.
    #[error("Page structure missing: {0}")]
    StructuralAbsence(String),

    /// The frame could not be read; the cycle is skipped.
    #[error("Frame unavailable: {0}")]
    FrameUnavailable(#[from] DomError),

    /// Automation cannot be enabled on the current page.
    #[error("Unsupported page: {0}")]
    UnsupportedPage(String),

    /// A configured page pattern does not compile.
    #[error("Invalid page pattern: {0}")]
    InvalidPattern(String),

    /// The session task is no longer running.
    #[error("Automation session closed")]
    SessionClosed,
}

impl From<regex::Error> for AutomationError {
    fn from(e: regex::Error) -> Self {
        AutomationError::InvalidPattern(e.to_string())
    }
}

/// Failure of the persisted state collaborator.
#[derive(Debug, Error)]
#[error("State store error: {0}")]
pub struct StoreError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_not_found_names_control() {
        let err = AutomationError::TransientNotFound {
            control: "案次號選單".to_string(),
            waited_ms: 5000,
        };
        let display = err.to_string();
        assert!(display.contains("案次號選單"));
        assert!(display.contains("5000"));
    }

    #[test]
    fn test_dom_error_converts_to_frame_unavailable() {
        let err: AutomationError = DomError::CrossOrigin("blocked".to_string()).into();
        assert!(matches!(err, AutomationError::FrameUnavailable(DomError::CrossOrigin(_))));
    }

    #[test]
    fn test_regex_error_converts() {
        let err: AutomationError = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, AutomationError::InvalidPattern(_)));
    }

    #[test]
    fn test_detached_display() {
        let err = DomError::Detached(NodeRef(42));
        assert!(err.to_string().contains("42"));
    }
}
