//! Page events to frame signals and badge clicks.

use std::sync::Arc;

use async_trait::async_trait;
use docarchiver_core::{CancellationToken, FrameSignal, SessionHandle};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cdp::{CdpError, CdpResponse, PageSession, events};

/// Page function the status badge calls when clicked.
pub const TOGGLE_BINDING: &str = "__docarchiverToggle";

/// The frame signal a protocol event stands for, if any.
pub fn signal_for(method: &str) -> Option<FrameSignal> {
    match method {
        events::FRAME_NAVIGATED | events::FRAME_STOPPED_LOADING => Some(FrameSignal::Loaded),
        events::CHILD_NODE_INSERTED => Some(FrameSignal::NodesInserted),
        _ => None,
    }
}

/// Events after which the DOM tree has to be requested again for
/// insertion events to keep flowing.
pub fn needs_document_refresh(method: &str) -> bool {
    matches!(
        method,
        events::DOCUMENT_UPDATED | events::FRAME_STOPPED_LOADING
    )
}

/// Whether `event` is a click on the status badge.
pub fn is_toggle_request(event: &CdpResponse) -> bool {
    event.method.as_deref() == Some(events::BINDING_CALLED)
        && event
            .params
            .as_ref()
            .and_then(|p| p["name"].as_str())
            .is_some_and(|name| name == TOGGLE_BINDING)
}

/// The page commands the pump issues.
#[async_trait]
pub trait PageControl: Send + Sync {
    async fn request_document(&self) -> Result<i64, CdpError>;

    async fn add_binding(&self, name: &str) -> Result<(), CdpError>;
}

#[async_trait]
impl PageControl for PageSession {
    async fn request_document(&self) -> Result<i64, CdpError> {
        PageSession::request_document(self).await
    }

    async fn add_binding(&self, name: &str) -> Result<(), CdpError> {
        PageSession::add_binding(self, name).await
    }
}

/// Forwards page events as [`FrameSignal`]s until the receiver is dropped,
/// `shutdown` fires or the page goes away. Losing the page cancels
/// `shutdown`.
pub struct SignalPump {
    page: Arc<dyn PageControl>,
    session: Option<SessionHandle>,
}

impl SignalPump {
    pub fn new(page: Arc<dyn PageControl>) -> Self {
        Self { page, session: None }
    }

    /// Toggle `session` whenever the status badge is clicked.
    pub fn with_toggle(mut self, session: SessionHandle) -> Self {
        self.session = Some(session);
        self
    }

    pub async fn run(
        self,
        mut events: mpsc::UnboundedReceiver<CdpResponse>,
        signals: mpsc::UnboundedSender<FrameSignal>,
        shutdown: CancellationToken,
    ) {
        if self.session.is_some() {
            if let Err(e) = self.page.add_binding(TOGGLE_BINDING).await {
                warn!("Status badge will not be clickable: {}", e);
            }
        }
        self.refresh_document().await;

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => event,
            };
            let Some(event) = event else {
                warn!("Page connection lost, shutting down");
                shutdown.cancel();
                break;
            };

            if is_toggle_request(&event) {
                self.toggle();
                continue;
            }
            let Some(method) = event.method.as_deref() else {
                continue;
            };

            if needs_document_refresh(method) {
                self.refresh_document().await;
            }
            if let Some(signal) = signal_for(method) {
                if signals.send(signal).is_err() {
                    debug!("Frame signal receiver dropped");
                    break;
                }
            }
        }
    }

    fn toggle(&self) {
        let Some(session) = self.session.clone() else {
            debug!("Badge click without a session");
            return;
        };
        tokio::spawn(async move {
            match session.toggle_enabled().await {
                Ok(enabled) => info!(enabled, "Toggled from status badge"),
                Err(e) => warn!("Toggle from status badge refused: {}", e),
            }
        });
    }

    async fn refresh_document(&self) {
        if let Err(e) = self.page.request_document().await {
            warn!("Failed to request document tree: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
