//! [`FrameDocument`] over CDP.
//!
//! Every operation is one `Runtime.evaluate` of a small page-side function
//! that resolves the content frame, reads or mutates its document and
//! answers with a tagged status object. Element references are integers
//! stamped on the elements of the current frame document; a new document
//! starts a fresh reference table and a fresh document id. Document ids are
//! random 53-bit integers held only by the document itself, so they stay
//! distinct across reloads of the host page.

use std::sync::Arc;

use async_trait::async_trait;
use docarchiver_core::{
    DomError, DomEvent, ElementSnapshot, FrameDocument, FrameLocation, NodeRef, ReadyState,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::trace;

use crate::cdp::PageSession;

/// Page-side half of the frame bridge: `(frameId, op, args) -> reply`.
const FRAME_SCRIPT: &str = r#"(function (frameId, op, args) {
  var frame = document.getElementById(frameId);
  if (!frame) return { status: "absent" };
  var doc, win;
  try {
    doc = frame.contentDocument;
    win = frame.contentWindow;
  } catch (e) {
    return { status: "cross_origin", message: String(e) };
  }
  if (!doc || !win) return { status: "cross_origin", message: "contentDocument is not readable" };

  if (!doc.__docarchiverId) {
    doc.__docarchiverId = Math.floor(Math.random() * 9007199254740990) + 1;
    doc.__docarchiverNodes = { next: 1, byRef: {} };
  }
  var nodes = doc.__docarchiverNodes;

  function ref(el) {
    if (!el.__docarchiverRef) {
      el.__docarchiverRef = nodes.next++;
      nodes.byRef[el.__docarchiverRef] = el;
    }
    return el.__docarchiverRef;
  }

  function snapshot(el) {
    var attributes = {};
    for (var i = 0; i < el.attributes.length; i++) {
      attributes[el.attributes[i].name] = el.attributes[i].value;
    }
    var text = (el.textContent || "").trim();
    var parent = el.parentElement;
    return {
      node: ref(el),
      tag: el.tagName,
      attributes: attributes,
      text: text.length > 4096 ? text.slice(0, 4096) : text,
      value: typeof el.value === "string" ? el.value : "",
      checked: el.checked === true,
      hasClickHandler: typeof el.onclick === "function",
      parentClasses: parent ? Array.prototype.slice.call(parent.classList) : [],
      optionCount: el.tagName === "SELECT" ? el.options.length : 0
    };
  }

  function ok(value) {
    return { status: "ok", value: value === undefined ? null : value };
  }

  if (op === "location") {
    try {
      return ok({ url: String(win.location.href), documentId: doc.__docarchiverId });
    } catch (e) {
      return { status: "cross_origin", message: String(e) };
    }
  }
  if (op === "readyState") return ok(doc.readyState);

  try {
    if (op === "queryAll") {
      return ok(Array.prototype.map.call(doc.querySelectorAll(args.selector), snapshot));
    }

    var el = nodes.byRef[args.node];
    if (!el || !doc.contains(el)) return { status: "detached", node: args.node };

    switch (op) {
      case "setChecked":
        el.checked = args.checked;
        return ok();
      case "addParentClass":
        if (el.parentElement) el.parentElement.classList.add(args.className);
        return ok();
      case "setValue":
        el.value = args.value;
        return ok(typeof el.value === "string" ? el.value : "");
      case "dispatch":
        el.dispatchEvent(new win.Event(args.event, { bubbles: true }));
        return ok();
      case "click":
        el.click();
        return ok();
    }
    return { status: "error", message: "unknown operation " + op };
  } catch (e) {
    return { status: "error", message: String((e && e.message) || e) };
  }
})"#;

/// Reply of one frame script call.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ScriptReply {
    Ok {
        #[serde(default)]
        value: Value,
    },
    Absent,
    CrossOrigin {
        #[serde(default)]
        message: String,
    },
    Detached {
        node: NodeRef,
    },
    Error {
        message: String,
    },
}

/// The content frame of an attached page.
pub struct CdpFrameDocument {
    page: Arc<PageSession>,
    frame_id: String,
}

impl CdpFrameDocument {
    pub fn new(page: Arc<PageSession>, frame_id: impl Into<String>) -> Self {
        Self {
            page,
            frame_id: frame_id.into(),
        }
    }

    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }

    async fn run<T: DeserializeOwned>(&self, op: &str, args: Value) -> Result<T, DomError> {
        let expression = build_expression(&self.frame_id, op, &args);
        trace!(op, "Frame script");
        let raw = self
            .page
            .evaluate(&expression)
            .await
            .map_err(|e| DomError::Script(e.to_string()))?;
        let value = interpret_reply(&self.frame_id, raw)?;
        serde_json::from_value(value)
            .map_err(|e| DomError::Script(format!("unexpected {} result: {}", op, e)))
    }
}

/// Invocation of the frame script with JSON-encoded arguments.
fn build_expression(frame_id: &str, op: &str, args: &Value) -> String {
    format!(
        "{}({}, {}, {})",
        FRAME_SCRIPT,
        Value::from(frame_id),
        Value::from(op),
        args
    )
}

/// Map a script reply to its value or the matching [`DomError`].
fn interpret_reply(frame_id: &str, raw: Value) -> Result<Value, DomError> {
    let reply: ScriptReply = serde_json::from_value(raw)
        .map_err(|e| DomError::Script(format!("malformed frame reply: {}", e)))?;
    match reply {
        ScriptReply::Ok { value } => Ok(value),
        ScriptReply::Absent => Err(DomError::FrameAbsent(frame_id.to_string())),
        ScriptReply::CrossOrigin { message } => Err(DomError::CrossOrigin(message)),
        ScriptReply::Detached { node } => Err(DomError::Detached(node)),
        ScriptReply::Error { message } => Err(DomError::Script(message)),
    }
}

#[async_trait]
impl FrameDocument for CdpFrameDocument {
    async fn location(&self) -> Result<FrameLocation, DomError> {
        self.run("location", Value::Null).await
    }

    async fn ready_state(&self) -> Result<ReadyState, DomError> {
        let state: String = self.run("readyState", Value::Null).await?;
        Ok(ReadyState::parse(&state))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, DomError> {
        self.run("queryAll", json!({ "selector": selector })).await
    }

    async fn set_checked(&self, node: NodeRef, checked: bool) -> Result<(), DomError> {
        self.run::<Value>("setChecked", json!({ "node": node, "checked": checked }))
            .await
            .map(drop)
    }

    async fn add_parent_class(&self, node: NodeRef, class: &str) -> Result<(), DomError> {
        self.run::<Value>("addParentClass", json!({ "node": node, "className": class }))
            .await
            .map(drop)
    }

    async fn set_value(&self, node: NodeRef, value: &str) -> Result<String, DomError> {
        self.run("setValue", json!({ "node": node, "value": value }))
            .await
    }

    async fn dispatch_event(&self, node: NodeRef, event: DomEvent) -> Result<(), DomError> {
        self.run::<Value>("dispatch", json!({ "node": node, "event": event.as_str() }))
            .await
            .map(drop)
    }

    async fn click(&self, node: NodeRef) -> Result<(), DomError> {
        self.run::<Value>("click", json!({ "node": node })).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_expression_encodes_arguments() {
        let expr = build_expression("dTreeContent", "queryAll", &json!({"selector": "input[value=\"存查\"]"}));
        assert!(expr.starts_with("(function (frameId, op, args)"));
        assert!(expr.ends_with(r#"("dTreeContent", "queryAll", {"selector":"input[value=\"存查\"]"})"#));
    }

    #[test]
    fn test_build_expression_null_args() {
        let expr = build_expression("dTreeContent", "location", &Value::Null);
        assert!(expr.ends_with(r#"("dTreeContent", "location", null)"#));
    }

    #[test]
    fn test_reply_ok_location() {
        let value = interpret_reply(
            "dTreeContent",
            json!({"status": "ok", "value": {"url": "https://x/AOSDA006F_s02.jsp", "documentId": 4}}),
        )
        .unwrap();
        let loc: FrameLocation = serde_json::from_value(value).unwrap();
        assert_eq!(loc.document_id, 4);
    }

    #[test]
    fn test_reply_ok_without_value() {
        let value = interpret_reply("dTreeContent", json!({"status": "ok"})).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_reply_snapshot_list() {
        let value = interpret_reply(
            "dTreeContent",
            json!({"status": "ok", "value": [{
                "node": 3,
                "tag": "INPUT",
                "attributes": {"type": "checkbox", "name": "000011803"},
                "text": "",
                "value": "on",
                "checked": false,
                "hasClickHandler": false,
                "parentClasses": ["icheckbox_minimal-orange"],
                "optionCount": 0
            }]}),
        )
        .unwrap();
        let snaps: Vec<ElementSnapshot> = serde_json::from_value(value).unwrap();
        assert_eq!(snaps[0].node, NodeRef(3));
        assert_eq!(snaps[0].parent_classes, vec!["icheckbox_minimal-orange"]);
    }

    #[test]
    fn test_reply_errors() {
        assert_eq!(
            interpret_reply("dTreeContent", json!({"status": "absent"})),
            Err(DomError::FrameAbsent("dTreeContent".to_string()))
        );
        assert_eq!(
            interpret_reply("f", json!({"status": "cross_origin", "message": "blocked"})),
            Err(DomError::CrossOrigin("blocked".to_string()))
        );
        assert_eq!(
            interpret_reply("f", json!({"status": "detached", "node": 9})),
            Err(DomError::Detached(NodeRef(9)))
        );
        assert_eq!(
            interpret_reply("f", json!({"status": "error", "message": "boom"})),
            Err(DomError::Script("boom".to_string()))
        );
    }

    #[test]
    fn test_reply_malformed() {
        assert!(matches!(
            interpret_reply("f", json!({"status": "maybe"})),
            Err(DomError::Script(_))
        ));
        assert!(matches!(interpret_reply("f", Value::Null), Err(DomError::Script(_))));
    }

    #[test]
    fn test_document_id_not_tied_to_host_window() {
        assert!(!FRAME_SCRIPT.contains("window.__docarchiver"));
        assert!(FRAME_SCRIPT.contains("doc.__docarchiverId = Math.floor(Math.random()"));
    }

    #[test]
    fn test_reply_location_with_wide_document_id() {
        let value = interpret_reply(
            "dTreeContent",
            json!({"status": "ok", "value": {"url": "https://x/AOSDA006F_s02.jsp", "documentId": 9007199254740991u64}}),
        )
        .unwrap();
        let loc: FrameLocation = serde_json::from_value(value).unwrap();
        assert_eq!(loc.document_id, 9_007_199_254_740_991);
    }
}
