//! DOM domain requests for the page session.

use serde_json::json;

use crate::cdp::error::CdpError;

use super::core::PageSession;

impl PageSession {
    /// Request the full document tree, frames included.
    ///
    /// Chrome only reports `DOM.childNodeInserted` for nodes the client has
    /// been sent, so this has to be repeated after every
    /// `DOM.documentUpdated`. Returns the root node id.
    pub async fn request_document(&self) -> Result<i64, CdpError> {
        let result = self
            .call("DOM.getDocument", Some(json!({"depth": -1, "pierce": true})))
            .await?;

        result["root"]["nodeId"]
            .as_i64()
            .ok_or_else(|| CdpError::InvalidResponse("Missing root nodeId".to_string()))
    }
}
