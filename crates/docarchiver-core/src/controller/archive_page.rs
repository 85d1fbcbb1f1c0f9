//! "File to archive" workflow of the archive form.

use docarchiver_config::{AutomationSettings, TimingConfig};
use tracing::{debug, info, warn};

use super::ControllerOutcome;
use crate::dom::{DomEvent, ElementSnapshot, FrameDocument, attr_selector};
use crate::error::{AutomationError, DomError};
use crate::wait::{WaitPolicy, wait_for_selector};

pub(crate) const FILE_CODE_SELECT: &str = r#"select[name="q_fsKindno"]"#;
pub(crate) const CASE_SEQUENCE_SELECT: &str = r#"select[name="q_caseno"]"#;

/// Fills the cascading file code and case sequence selects and confirms.
///
/// The case sequence options are loaded by the page after the file code
/// `change` event, so they are given `case_option_wait` and one backoff
/// before the cycle is abandoned.
#[derive(Debug, Clone)]
pub struct ArchivePageController {
    confirm_selector: String,
    timing: TimingConfig,
}

impl ArchivePageController {
    pub fn new(confirm_label: &str, timing: TimingConfig) -> Self {
        Self {
            confirm_selector: format!(
                r#"input[name="updateSubmit"]{}"#,
                attr_selector("value", confirm_label)
            ),
            timing,
        }
    }

    pub async fn run(&self, doc: &dyn FrameDocument, settings: &AutomationSettings) -> ControllerOutcome {
        match self.process(doc, settings).await {
            Ok(()) => ControllerOutcome::Archived,
            Err(Step::Automation(e)) => {
                warn!("Archive form abandoned: {}", e);
                ControllerOutcome::Aborted(e)
            }
            Err(Step::Dom(e)) => {
                warn!("Archive form interrupted: {}", e);
                ControllerOutcome::FrameUnavailable(e)
            }
        }
    }

    async fn process(&self, doc: &dyn FrameDocument, settings: &AutomationSettings) -> Result<(), Step> {
        let policy = WaitPolicy::from_timing(&self.timing);
        info!(
            file_code = %settings.file_code,
            case_sequence = %settings.case_sequence,
            "Filling archive form"
        );

        tokio::time::sleep(self.timing.form_settle()).await;

        let file_code = self.require(doc, FILE_CODE_SELECT, "檔號選單", policy).await?;
        self.select(doc, &file_code, "檔號選單", &settings.file_code).await?;

        tokio::time::sleep(settings.case_option_wait()).await;
        let mut case_sequence = self.require(doc, CASE_SEQUENCE_SELECT, "案次號選單", policy).await?;
        if case_sequence.option_count <= 1 {
            debug!("Case sequence options not loaded yet, backing off");
            tokio::time::sleep(self.timing.case_option_backoff()).await;
            case_sequence = self.require(doc, CASE_SEQUENCE_SELECT, "案次號選單", policy).await?;
            if case_sequence.option_count <= 1 {
                return Err(Step::Automation(AutomationError::TransientNotFound {
                    control: "案次號選項".to_string(),
                    waited_ms: (settings.case_option_wait() + self.timing.case_option_backoff())
                        .as_millis() as u64,
                }));
            }
        }
        self.select(doc, &case_sequence, "案次號選單", &settings.case_sequence)
            .await?;

        tokio::time::sleep(self.timing.confirm_delay()).await;
        let confirm = self
            .require(doc, &self.confirm_selector, "確定存檔按鈕", policy)
            .await?;
        doc.click(confirm.node).await?;
        info!("Archive form submitted");

        tokio::time::sleep(self.timing.archive_settle()).await;
        Ok(())
    }

    async fn require(
        &self,
        doc: &dyn FrameDocument,
        selector: &str,
        control: &str,
        policy: WaitPolicy,
    ) -> Result<ElementSnapshot, Step> {
        wait_for_selector(doc, selector, policy).await.ok_or_else(|| {
            Step::Automation(AutomationError::TransientNotFound {
                control: control.to_string(),
                waited_ms: policy.timeout_ms(),
            })
        })
    }

    async fn select(
        &self,
        doc: &dyn FrameDocument,
        select: &ElementSnapshot,
        control: &str,
        value: &str,
    ) -> Result<(), Step> {
        let effective = doc.set_value(select.node, value).await?;
        if effective != value {
            return Err(Step::Automation(AutomationError::OptionUnavailable {
                control: control.to_string(),
                value: value.to_string(),
            }));
        }
        doc.dispatch_event(select.node, DomEvent::Change).await?;
        debug!("{} set to {}", control, value);
        Ok(())
    }
}

/// Why a step stopped.
enum Step {
    Automation(AutomationError),
    Dom(DomError),
}

impl From<DomError> for Step {
    fn from(e: DomError) -> Self {
        Step::Dom(e)
    }
}

#[cfg(test)]
#[path = "archive_page_tests.rs"]
mod tests;
