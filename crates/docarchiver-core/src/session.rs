//! The automation session.
//!
//! One task owns [`SessionState`] and multiplexes frame changes, operator
//! commands, the idle deadline and the in-flight controller future. Nothing
//! runs in parallel: `busy` is set when a controller future is created and
//! cleared when its outcome is applied, both on the session task.

use std::sync::Arc;

use docarchiver_config::{AutomationSettings, Config};
use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::classifier::{PageClassifier, PageKind};
use crate::collaborators::{
    Notifier, SessionStore, StatusSink, TracingNotifier, TracingStatusSink,
};
use crate::controller::{ArchivePageController, ControllerOutcome, ListPageController};
use crate::dom::{FrameDocument, FrameLocation};
use crate::error::AutomationError;
use crate::locator::{ControlTarget, ElementLocator};
use crate::observer::{ChangeTrigger, FrameChange};

/// The controller future currently being driven by the session.
pub type InFlight = BoxFuture<'static, ControllerOutcome>;

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Disabled,
    EnabledIdle,
    EnabledBusy,
}

/// Mutable state of the session. Only [`AutomationSession`] writes it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub enabled: bool,
    /// A controller action is in flight.
    pub busy: bool,
    pub last_processed_url: Option<String>,
    pub last_processed_document: Option<u64>,
    /// Items checked since automation was last enabled.
    pub processed_count: u32,
    pub idle_deadline: Option<Instant>,
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match (self.enabled, self.busy) {
            (false, _) => SessionPhase::Disabled,
            (true, false) => SessionPhase::EnabledIdle,
            (true, true) => SessionPhase::EnabledBusy,
        }
    }

    fn was_processed(&self, location: &FrameLocation) -> bool {
        self.last_processed_url.as_deref() == Some(location.url.as_str())
            && self.last_processed_document == Some(location.document_id)
    }

    fn forget_processed(&mut self) {
        self.last_processed_url = None;
        self.last_processed_document = None;
    }
}

/// Status as reported to the operator console.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub phase: SessionPhase,
    pub enabled: bool,
    pub busy: bool,
    pub processed_count: u32,
    pub last_processed_url: Option<String>,
    /// Seconds until the idle auto-disable fires.
    pub idle_remaining_secs: Option<u64>,
    pub settings: AutomationSettings,
}

/// Control commands accepted by a running session.
#[derive(Debug)]
pub enum SessionCommand {
    Toggle {
        reply: oneshot::Sender<Result<bool, AutomationError>>,
    },
    UpdateSettings {
        file_code: String,
        case_sequence: String,
        reply: oneshot::Sender<AutomationSettings>,
    },
    QueryStatus {
        reply: oneshot::Sender<StatusSnapshot>,
    },
}

/// Cloneable control surface of a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    /// Handle plus the command receiver to pass to [`AutomationSession::run`].
    pub fn channel(shutdown: CancellationToken) -> (Self, mpsc::Receiver<SessionCommand>) {
        let (commands, rx) = mpsc::channel(16);
        (Self { commands, shutdown }, rx)
    }

    /// Flip the enabled flag. Returns the new value, or the refusal.
    pub async fn toggle_enabled(&self) -> Result<bool, AutomationError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Toggle { reply }).await?;
        rx.await.map_err(|_| AutomationError::SessionClosed)?
    }

    /// Replace the file code and case sequence used from the next dispatch on.
    pub async fn update_settings(
        &self,
        file_code: impl Into<String>,
        case_sequence: impl Into<String>,
    ) -> Result<AutomationSettings, AutomationError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::UpdateSettings {
            file_code: file_code.into(),
            case_sequence: case_sequence.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| AutomationError::SessionClosed)
    }

    pub async fn query_status(&self) -> Result<StatusSnapshot, AutomationError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::QueryStatus { reply }).await?;
        rx.await.map_err(|_| AutomationError::SessionClosed)
    }

    /// Stop the session and everything sharing its token.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn send(&self, command: SessionCommand) -> Result<(), AutomationError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| AutomationError::SessionClosed)
    }
}

/// Builds an [`AutomationSession`] from the configuration.
pub struct SessionBuilder<'a> {
    doc: Arc<dyn FrameDocument>,
    config: &'a Config,
    notifier: Arc<dyn Notifier>,
    status: Arc<dyn StatusSink>,
    store: Option<Arc<dyn SessionStore>>,
}

impl<'a> SessionBuilder<'a> {
    pub fn new(doc: Arc<dyn FrameDocument>, config: &'a Config) -> Self {
        Self {
            doc,
            config,
            notifier: Arc::new(TracingNotifier),
            status: Arc::new(TracingStatusSink),
            store: None,
        }
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn status_sink(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the session, starting disabled. Stored settings override the
    /// configured file code and case sequence; the stored flag is reset.
    pub fn build(self) -> Result<AutomationSession, AutomationError> {
        let classifier = PageClassifier::from_config(&self.config.pages)?;
        let timing = self.config.timing.clone();

        let mut settings = self.config.automation.clone();
        if let Some(store) = &self.store {
            match store.load_settings() {
                Ok(stored) => {
                    if let Some(file_code) = stored.file_code {
                        settings.file_code = file_code;
                    }
                    if let Some(case_sequence) = stored.case_sequence {
                        settings.case_sequence = case_sequence;
                    }
                }
                Err(e) => warn!("Using configured settings, stored ones unreadable: {}", e),
            }
            if let Err(e) = store.save_enabled(false) {
                warn!("Failed to reset stored flag: {}", e);
            }
        }

        let locator = Arc::new(ElementLocator::new(ControlTarget::review_control(
            &self.config.pages,
        )));

        Ok(AutomationSession {
            list: ListPageController::new(locator, timing.clone(), self.notifier.clone()),
            archive: ArchivePageController::new(&self.config.pages.archive_confirm_label, timing),
            doc: self.doc,
            classifier,
            settings: Arc::new(settings),
            notifier: self.notifier,
            status: self.status,
            store: self.store,
            state: SessionState::default(),
        })
    }
}

/// Page detection and dispatch state machine.
pub struct AutomationSession {
    doc: Arc<dyn FrameDocument>,
    classifier: PageClassifier,
    list: ListPageController,
    archive: ArchivePageController,
    settings: Arc<AutomationSettings>,
    notifier: Arc<dyn Notifier>,
    status: Arc<dyn StatusSink>,
    store: Option<Arc<dyn SessionStore>>,
    state: SessionState,
}

impl AutomationSession {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn settings(&self) -> &AutomationSettings {
        &self.settings
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            phase: self.state.phase(),
            enabled: self.state.enabled,
            busy: self.state.busy,
            processed_count: self.state.processed_count,
            last_processed_url: self.state.last_processed_url.clone(),
            idle_remaining_secs: self
                .state
                .idle_deadline
                .map(|d| d.saturating_duration_since(Instant::now()).as_secs()),
            settings: (*self.settings).clone(),
        }
    }

    /// React to a frame change. Returns the controller future to drive when
    /// the change starts an action.
    pub fn on_change(&mut self, change: &FrameChange) -> Option<InFlight> {
        if !self.state.enabled {
            trace!("Disabled, ignoring {:?}", change.trigger);
            return None;
        }
        if self.state.busy {
            debug!(trigger = ?change.trigger, "Action in flight, change skipped");
            return None;
        }

        let location = &change.location;
        let kind = self.classifier.classify(&location.url);
        if kind == PageKind::Unknown {
            trace!(url = %location.url, "Not an automated page");
            return None;
        }
        if self.state.was_processed(location) {
            trace!(url = %location.url, "Page already processed");
            return None;
        }

        info!(
            page = ?kind,
            trigger = ?change.trigger,
            document = location.document_id,
            "Dispatching {}",
            location.url
        );
        self.state.busy = true;
        self.state.last_processed_url = Some(location.url.clone());
        self.state.last_processed_document = Some(location.document_id);

        let doc = self.doc.clone();
        let future: InFlight = match kind {
            PageKind::ListPage => {
                let controller = self.list.clone();
                Box::pin(async move { controller.run(doc.as_ref()).await })
            }
            _ => {
                let controller = self.archive.clone();
                let settings = self.settings.clone();
                Box::pin(async move { controller.run(doc.as_ref(), &settings).await })
            }
        };
        Some(future)
    }

    /// Read the frame now and dispatch if it warrants an action.
    pub async fn check_now(&mut self) -> Option<InFlight> {
        match self.doc.location().await {
            Ok(location) => self.on_change(&FrameChange {
                location,
                trigger: ChangeTrigger::Manual,
            }),
            Err(e) => {
                debug!("Immediate check skipped: {}", e);
                None
            }
        }
    }

    /// Apply the outcome of the in-flight action and release `busy`.
    pub fn complete(&mut self, outcome: ControllerOutcome) {
        self.state.busy = false;
        let checked = outcome.items_checked();
        self.state.processed_count += checked;
        if outcome.retry_same_page() {
            self.state.forget_processed();
        }

        match &outcome {
            ControllerOutcome::Submitted { strategy } => {
                info!(
                    strategy,
                    processed = self.state.processed_count,
                    "Document submitted for review"
                );
            }
            ControllerOutcome::Archived => info!("Document filed"),
            ControllerOutcome::NoListContainer => debug!("List not rendered yet"),
            ControllerOutcome::Exhausted { checkboxes } => {
                info!(checkboxes, "Nothing left to review");
                if self.state.enabled {
                    self.notifier.notify("自動存查功能已停用", "無可存查的公文");
                }
            }
            ControllerOutcome::SubmitControlMissing => {
                if self.state.enabled {
                    self.notifier
                        .notify("頁面不支援", "未找到存查按鈕，此頁面不支援自動存查功能");
                }
            }
            ControllerOutcome::Aborted(e) => {
                warn!("Action abandoned: {}", e);
                if self.state.enabled {
                    self.notifier.notify("自動操作中止", &e.to_string());
                }
            }
            ControllerOutcome::FrameUnavailable(e) => {
                warn!("Frame lost during action: {}", e);
            }
        }

        if outcome.disables() && self.state.enabled {
            self.disable("no reviewable documents");
        } else if checked > 0 && self.state.enabled {
            self.publish();
        }
    }

    /// Flip the enabled flag. Enabling is refused on a list page that has
    /// no review control.
    pub async fn toggle_enabled(&mut self) -> Result<bool, AutomationError> {
        if self.state.enabled {
            self.disable("toggled off");
            return Ok(false);
        }

        if let Ok(location) = self.doc.location().await {
            if self.classifier.classify(&location.url) == PageKind::ListPage {
                if let Ok(None) = self.list.locator().locate(self.doc.as_ref()).await {
                    warn!(url = %location.url, "Review control missing, not enabling");
                    self.notifier
                        .notify("頁面不支援", "未找到存查按鈕，此頁面不支援自動存查功能");
                    return Err(AutomationError::UnsupportedPage(location.url));
                }
            }
        }

        self.enable();
        Ok(true)
    }

    /// Replace the operator settings. Takes effect at the next dispatch.
    pub fn update_settings(&mut self, file_code: String, case_sequence: String) -> AutomationSettings {
        let settings = self.settings.with_codes(file_code, case_sequence);
        info!(
            file_code = %settings.file_code,
            case_sequence = %settings.case_sequence,
            "Settings updated"
        );
        self.settings = Arc::new(settings.clone());
        settings
    }

    /// Idle deadline reached.
    pub fn expire_idle(&mut self) {
        if !self.state.enabled {
            self.state.idle_deadline = None;
            return;
        }
        let minutes = self.settings.idle_disable_minutes;
        self.notifier.notify(
            "自動存查功能已自動關閉",
            &format!("已經過{}分鐘，自動化功能已自動關閉。", minutes),
        );
        self.disable("idle timeout");
    }

    fn enable(&mut self) {
        self.state.enabled = true;
        self.state.processed_count = 0;
        self.state.forget_processed();
        self.state.idle_deadline = Some(Instant::now() + self.settings.idle_disable_after());
        info!(
            idle_minutes = self.settings.idle_disable_minutes,
            "Automation enabled"
        );
        self.persist();
        self.publish();
    }

    fn disable(&mut self, reason: &str) {
        self.state.enabled = false;
        self.state.idle_deadline = None;
        info!(reason, processed = self.state.processed_count, "Automation disabled");
        self.persist();
        self.publish();
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save_enabled(self.state.enabled) {
                warn!("Failed to persist enabled flag: {}", e);
            }
        }
    }

    fn publish(&self) {
        self.status
            .status_changed(self.state.enabled, self.state.processed_count);
    }

    /// Drive the session until `shutdown` is cancelled. Returns the final
    /// state; an action still in flight at shutdown is dropped. The current
    /// status is published once on start.
    pub async fn run(
        mut self,
        mut changes: mpsc::Receiver<FrameChange>,
        mut commands: mpsc::Receiver<SessionCommand>,
        shutdown: CancellationToken,
    ) -> SessionState {
        let mut in_flight: Option<InFlight> = None;
        let mut changes_open = true;
        let mut commands_open = true;

        info!("Automation session started");
        self.publish();

        loop {
            let idle_deadline = self.state.idle_deadline;

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                outcome = drive(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    self.complete(outcome);
                }

                _ = tokio::time::sleep_until(idle_deadline.unwrap_or_else(Instant::now)), if idle_deadline.is_some() => {
                    self.expire_idle();
                }

                command = commands.recv(), if commands_open => {
                    match command {
                        Some(command) => {
                            if let Some(started) = self.handle_command(command, in_flight.is_none()).await {
                                in_flight = Some(started);
                            }
                        }
                        None => commands_open = false,
                    }
                }

                change = changes.recv(), if changes_open => {
                    match change {
                        Some(change) => {
                            if let Some(started) = self.on_change(&change) {
                                in_flight = Some(started);
                            }
                        }
                        None => {
                            debug!("Frame change source closed");
                            changes_open = false;
                        }
                    }
                }
            }
        }

        info!(
            processed = self.state.processed_count,
            "Automation session stopped"
        );
        self.state
    }

    async fn handle_command(&mut self, command: SessionCommand, idle: bool) -> Option<InFlight> {
        match command {
            SessionCommand::Toggle { reply } => {
                let result = self.toggle_enabled().await;
                let started = match (&result, idle) {
                    (Ok(true), true) => self.check_now().await,
                    _ => None,
                };
                let _ = reply.send(result);
                started
            }
            SessionCommand::UpdateSettings {
                file_code,
                case_sequence,
                reply,
            } => {
                let _ = reply.send(self.update_settings(file_code, case_sequence));
                None
            }
            SessionCommand::QueryStatus { reply } => {
                let _ = reply.send(self.status());
                None
            }
        }
    }
}

async fn drive(in_flight: &mut Option<InFlight>) -> ControllerOutcome {
    match in_flight {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
