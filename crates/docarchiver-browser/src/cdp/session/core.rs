//! Page session state and command dispatch.

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::CdpResponse;
use crate::cdp::transport::Transport;

/// Commands and events of one attached tab.
pub struct PageSession {
    target_id: String,
    session_id: String,
    transport: Transport,
    events: Mutex<Option<mpsc::UnboundedReceiver<CdpResponse>>>,
}

impl PageSession {
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        transport: Transport,
        events: mpsc::UnboundedReceiver<CdpResponse>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            transport,
            events: Mutex::new(Some(events)),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Protocol events of this tab. Only the first caller gets them.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<CdpResponse>> {
        self.events.lock().take()
    }

    /// Send a command to this tab.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .send(method, params, Some(&self.session_id))
            .await
    }

    /// Page, DOM and Runtime: the events frame observation is built on.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        for domain in ["Page", "DOM", "Runtime"] {
            self.call(&format!("{}.enable", domain), None).await?;
        }
        debug!(session = %self.session_id, "Domains enabled");
        Ok(())
    }
}
