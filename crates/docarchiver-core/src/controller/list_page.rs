//! "Mark as reviewed" workflow of the review list page.

use std::sync::Arc;

use docarchiver_config::TimingConfig;
use tracing::{debug, info, warn};

use super::ControllerOutcome;
use crate::collaborators::Notifier;
use crate::dom::{DomEvent, ElementSnapshot, FrameDocument, ReadyState};
use crate::error::{AutomationError, DomError};
use crate::locator::{ElementLocator, FoundControl};
use crate::wait::{WaitPolicy, wait_for};

pub(crate) const LIST_CONTAINER: &str = "#listContainer";
pub(crate) const ITEM_CHECKBOXES: &str = r#"#listTBODY tr input[type="checkbox"][name="ids"]"#;
const ICHECK_SKIN: &str = "icheckbox_minimal-orange";

/// Checks the first unchecked document of the list and submits it for
/// review. One item per cycle; the page reloads after the submission.
#[derive(Clone)]
pub struct ListPageController {
    locator: Arc<ElementLocator>,
    timing: TimingConfig,
    notifier: Arc<dyn Notifier>,
}

impl ListPageController {
    pub fn new(locator: Arc<ElementLocator>, timing: TimingConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            locator,
            timing,
            notifier,
        }
    }

    pub fn locator(&self) -> &Arc<ElementLocator> {
        &self.locator
    }

    pub async fn run(&self, doc: &dyn FrameDocument) -> ControllerOutcome {
        match self.process(doc).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("List page cycle interrupted: {}", e);
                ControllerOutcome::FrameUnavailable(e)
            }
        }
    }

    async fn process(&self, doc: &dyn FrameDocument) -> Result<ControllerOutcome, DomError> {
        let policy = WaitPolicy::from_timing(&self.timing);
        let ready = wait_for(policy, move || async move {
            Ok::<_, DomError>((doc.ready_state().await? == ReadyState::Complete).then_some(()))
        })
        .await;
        if ready.is_none() {
            doc.ready_state().await?;
            return Ok(ControllerOutcome::Aborted(AutomationError::TransientNotFound {
                control: "公文清單".to_string(),
                waited_ms: policy.timeout_ms(),
            }));
        }

        if doc.query(LIST_CONTAINER).await?.is_none() {
            debug!("{} not found", LIST_CONTAINER);
            return Ok(ControllerOutcome::NoListContainer);
        }

        let checkboxes = doc.query_all(ITEM_CHECKBOXES).await?;
        let total = checkboxes.len();
        let Some(item) = checkboxes.into_iter().find(|c| !c.checked) else {
            info!(checkboxes = total, "No unchecked documents left");
            return Ok(ControllerOutcome::Exhausted { checkboxes: total });
        };

        doc.set_checked(item.node, true).await?;
        match self.submit(doc, &item, total).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                match doc.set_checked(item.node, false).await {
                    Ok(()) => debug!("Unchecked {} after interrupted cycle", item.node),
                    Err(undo) => debug!("Could not uncheck {}: {}", item.node, undo),
                }
                Err(e)
            }
        }
    }

    /// Everything after the item is checked. A DOM error here leaves the
    /// item to be unchecked by the caller.
    async fn submit(
        &self,
        doc: &dyn FrameDocument,
        item: &ElementSnapshot,
        total: usize,
    ) -> Result<ControllerOutcome, DomError> {
        if item.parent_classes.iter().any(|c| c == ICHECK_SKIN) {
            doc.add_parent_class(item.node, "checked").await?;
        }
        info!(
            document = item.attr("value").unwrap_or(""),
            "Checked document {} of {}",
            item.node,
            total
        );

        let Some(control) = self.locate_with_retry(doc).await? else {
            warn!("Review control not found after retry");
            return Ok(ControllerOutcome::SubmitControlMissing);
        };

        tokio::time::sleep(self.timing.click_delay()).await;
        doc.dispatch_event(control.element.node, DomEvent::Click).await?;
        info!(strategy = control.strategy, "Review control clicked");

        tokio::time::sleep(self.timing.list_settle()).await;
        Ok(ControllerOutcome::Submitted {
            strategy: control.strategy,
        })
    }

    async fn locate_with_retry(&self, doc: &dyn FrameDocument) -> Result<Option<FoundControl>, DomError> {
        if let Some(found) = self.locator.locate(doc).await? {
            return Ok(Some(found));
        }

        self.notifier.notify(
            "自動存查失敗",
            &format!(
                "無法找到{}按鈕，{} 秒後重試",
                self.locator.target().label,
                self.timing.submit_retry_delay().as_secs()
            ),
        );
        tokio::time::sleep(self.timing.submit_retry_delay()).await;
        self.locator.locate(doc).await
    }
}

#[cfg(test)]
#[path = "list_page_tests.rs"]
mod tests;
