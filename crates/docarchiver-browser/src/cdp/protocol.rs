//! CDP wire messages, limited to what the agent sends and reads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Target session for page-level commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Incoming frame: a reply when `id` is set, an event when `method` is.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorResponse>,
    pub method: Option<String>,
    pub params: Option<Value>,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CdpErrorResponse {
    pub code: i64,
    pub message: String,
}

/// Entry of `/json/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub page_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

impl PageInfo {
    /// A browser tab, as opposed to workers and extensions.
    pub fn is_page(&self) -> bool {
        self.page_type == "page"
    }
}

/// `/json/version`. Chrome uses header-style names for most keys here.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "Protocol-Version")]
    pub protocol_version: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

/// `exceptionDetails` of a failed `Runtime.evaluate`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExceptionDetails {
    pub text: String,
    pub exception: Option<ThrownValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThrownValue {
    pub description: Option<String>,
}

impl ExceptionDetails {
    /// The thrown value's description (usually `Name: message`), falling
    /// back to the summary text.
    pub fn message(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .unwrap_or_else(|| self.text.clone())
    }
}

/// Events the agent subscribes to.
pub mod events {
    pub const FRAME_NAVIGATED: &str = "Page.frameNavigated";
    pub const FRAME_STOPPED_LOADING: &str = "Page.frameStoppedLoading";
    pub const CHILD_NODE_INSERTED: &str = "DOM.childNodeInserted";
    pub const DOCUMENT_UPDATED: &str = "DOM.documentUpdated";
    pub const BINDING_CALLED: &str = "Runtime.bindingCalled";
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
