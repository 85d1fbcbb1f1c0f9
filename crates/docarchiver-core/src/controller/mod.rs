//! Page workflows.
//!
//! A controller performs one cycle of work on its page and reports what
//! happened as a [`ControllerOutcome`]. Controllers never touch session state;
//! the session applies the outcome once the controller future resolves, which
//! includes the settle delay after the triggering click.

mod archive_page;
mod list_page;

pub use archive_page::ArchivePageController;
pub use list_page::ListPageController;

use crate::error::{AutomationError, DomError};

/// Result of one controller cycle.
#[derive(Debug, Clone)]
pub enum ControllerOutcome {
    /// A list item was checked and the review control clicked.
    Submitted { strategy: &'static str },
    /// The archive form was filled and confirmed.
    Archived,
    /// The list page has no `#listContainer` yet.
    NoListContainer,
    /// No unchecked item is left on the list page.
    Exhausted { checkboxes: usize },
    /// An item was checked but the review control could not be found.
    SubmitControlMissing,
    /// The workflow stopped at a missing or unusable control.
    Aborted(AutomationError),
    /// The frame could not be read or written mid-cycle.
    FrameUnavailable(DomError),
}

impl ControllerOutcome {
    /// Items checked on the page during the cycle.
    pub fn items_checked(&self) -> u32 {
        match self {
            ControllerOutcome::Submitted { .. } | ControllerOutcome::SubmitControlMissing => 1,
            _ => 0,
        }
    }

    /// Whether the outcome turns automation off.
    pub fn disables(&self) -> bool {
        matches!(
            self,
            ControllerOutcome::Exhausted { .. } | ControllerOutcome::SubmitControlMissing
        )
    }

    /// Whether the same page should be looked at again on the next change.
    pub fn retry_same_page(&self) -> bool {
        matches!(
            self,
            ControllerOutcome::NoListContainer | ControllerOutcome::FrameUnavailable(_)
        )
    }
}

impl From<DomError> for ControllerOutcome {
    fn from(e: DomError) -> Self {
        ControllerOutcome::FrameUnavailable(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_checked() {
        assert_eq!(ControllerOutcome::Submitted { strategy: "known-name" }.items_checked(), 1);
        assert_eq!(ControllerOutcome::SubmitControlMissing.items_checked(), 1);
        assert_eq!(ControllerOutcome::Archived.items_checked(), 0);
        assert_eq!(ControllerOutcome::Exhausted { checkboxes: 3 }.items_checked(), 0);
    }

    #[test]
    fn test_disabling_outcomes() {
        assert!(ControllerOutcome::Exhausted { checkboxes: 0 }.disables());
        assert!(ControllerOutcome::SubmitControlMissing.disables());
        assert!(!ControllerOutcome::NoListContainer.disables());
        assert!(
            !ControllerOutcome::Aborted(AutomationError::StructuralAbsence("x".to_string()))
                .disables()
        );
    }

    #[test]
    fn test_retry_same_page() {
        assert!(ControllerOutcome::NoListContainer.retry_same_page());
        assert!(
            ControllerOutcome::from(DomError::FrameAbsent("dTreeContent".to_string()))
                .retry_same_page()
        );
        assert!(!ControllerOutcome::Archived.retry_same_page());
    }
}
