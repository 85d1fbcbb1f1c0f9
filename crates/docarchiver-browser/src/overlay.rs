//! Notifications and status rendered into the host page.
//!
//! Both collaborators are fire and forget: the script runs on a spawned
//! task and a failure is only logged. Every notification is also written
//! to the log, so nothing is lost when the page cannot be reached.

use std::sync::Arc;

use docarchiver_core::{Notifier, StatusSink};
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::cdp::PageSession;
use crate::signals::TOGGLE_BINDING;

const TOAST_ID: &str = "docarchiver-toast";
const BADGE_ID: &str = "docarchiver-status";

/// How long a toast stays on the page.
const TOAST_MILLIS: u64 = 5000;

/// Run `script` on the page without waiting for it.
fn spawn_script(page: &Arc<PageSession>, script: String, what: &'static str) {
    let Ok(handle) = Handle::try_current() else {
        debug!("No runtime, {} not rendered", what);
        return;
    };
    let page = page.clone();
    handle.spawn(async move {
        if let Err(e) = page.evaluate(&script).await {
            debug!("Failed to render {}: {}", what, e);
        }
    });
}

/// Script showing a toast in the top-right corner of the host page.
pub fn toast_script(title: &str, message: &str) -> String {
    format!(
        r#"(function (title, message) {{
  var old = document.getElementById({id});
  if (old) old.remove();
  var box = document.createElement("div");
  box.id = {id};
  box.style.cssText = "position:fixed;top:16px;right:16px;z-index:2147483647;max-width:360px;padding:12px 16px;background:#333;color:#fff;border-radius:6px;font-size:14px;box-shadow:0 2px 8px rgba(0,0,0,.3)";
  var head = document.createElement("div");
  head.style.fontWeight = "bold";
  head.textContent = title;
  var body = document.createElement("div");
  body.textContent = message;
  box.appendChild(head);
  box.appendChild(body);
  document.body.appendChild(box);
  setTimeout(function () {{ box.remove(); }}, {millis});
}})({title}, {message})"#,
        id = Value::from(TOAST_ID),
        millis = TOAST_MILLIS,
        title = Value::from(title),
        message = Value::from(message),
    )
}

/// Badge text for a status update.
pub fn badge_text(enabled: bool, processed_count: u32) -> String {
    if enabled {
        format!("自動存查: 啟用 ({})", processed_count)
    } else {
        "自動存查: 禁用".to_string()
    }
}

/// Script creating or updating the status badge of the host page. Clicking
/// the badge calls the [`TOGGLE_BINDING`] page function.
pub fn badge_script(enabled: bool, processed_count: u32) -> String {
    format!(
        r##"(function (text, enabled) {{
  var badge = document.getElementById({id});
  if (!badge) {{
    badge = document.createElement("div");
    badge.id = {id};
    badge.title = "點擊切換自動存查";
    badge.style.cssText = "position:fixed;bottom:12px;right:12px;z-index:2147483647;padding:4px 10px;border-radius:4px;color:#fff;font-size:12px;cursor:pointer";
    badge.onclick = function () {{
      if (typeof window[{binding}] === "function") window[{binding}]("toggle");
    }};
    document.body.appendChild(badge);
  }}
  badge.textContent = text;
  badge.style.background = enabled ? "#2e7d32" : "#757575";
}})({text}, {enabled})"##,
        id = Value::from(BADGE_ID),
        binding = Value::from(TOGGLE_BINDING),
        text = Value::from(badge_text(enabled, processed_count)),
        enabled = enabled,
    )
}

/// [`Notifier`] showing toasts in the host page.
pub struct PageToastNotifier {
    page: Arc<PageSession>,
}

impl PageToastNotifier {
    pub fn new(page: Arc<PageSession>) -> Self {
        Self { page }
    }
}

impl Notifier for PageToastNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(title, "{}", message);
        spawn_script(&self.page, toast_script(title, message), "notification");
    }
}

/// [`StatusSink`] maintaining a badge in the host page.
pub struct PageStatusBadge {
    page: Arc<PageSession>,
}

impl PageStatusBadge {
    pub fn new(page: Arc<PageSession>) -> Self {
        Self { page }
    }
}

impl StatusSink for PageStatusBadge {
    fn status_changed(&self, enabled: bool, processed_count: u32) {
        info!(enabled, processed_count, "Automation status");
        spawn_script(
            &self.page,
            badge_script(enabled, processed_count),
            "status badge",
        );
    }
}
