//! DOM surface of the embedded content frame.
//!
//! Everything the automation reads from or writes to the target pages goes
//! through [`FrameDocument`]. Reads return [`ElementSnapshot`]s, plain values
//! copied out of the page; writes address elements by the [`NodeRef`] of a
//! snapshot taken from the same document.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomError;

/// Opaque reference to an element of the current frame document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(pub u64);

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// `document.readyState` of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    /// Parse the DOM string form. Unknown values count as loading.
    pub fn parse(value: &str) -> Self {
        match value {
            "complete" => ReadyState::Complete,
            "interactive" => ReadyState::Interactive,
            _ => ReadyState::Loading,
        }
    }
}

/// Where the frame currently is.
///
/// `document_id` changes whenever a new document object is loaded into the
/// frame, including reloads of the same URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameLocation {
    pub url: String,
    pub document_id: u64,
}

/// Copy of the parts of an element the automation inspects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementSnapshot {
    pub node: NodeRef,
    /// Upper-case tag name, as `Element.tagName` reports it.
    pub tag: String,
    pub attributes: HashMap<String, String>,
    /// `textContent`, trimmed.
    pub text: String,
    /// `value` property; empty for elements without one.
    pub value: String,
    pub checked: bool,
    /// An `onclick` property handler is installed.
    pub has_click_handler: bool,
    pub parent_classes: Vec<String>,
    /// Number of `<option>`s for selects.
    pub option_count: usize,
}

impl ElementSnapshot {
    /// Attribute value, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Click handler installed either as a property or an inline attribute.
    pub fn is_clickable(&self) -> bool {
        self.has_click_handler || self.has_attr("onclick")
    }

    /// The `name` attribute, for diagnostics.
    pub fn name(&self) -> Option<&str> {
        self.attr("name")
    }
}

/// Synthetic events dispatched on frame elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Change,
    Click,
}

impl DomEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomEvent::Change => "change",
            DomEvent::Click => "click",
        }
    }
}

/// Read and write access to the document loaded in the content frame.
///
/// Implementations fail with [`DomError::FrameAbsent`] or
/// [`DomError::CrossOrigin`] when the frame cannot be read; callers treat
/// those as "skip this cycle".
#[async_trait]
pub trait FrameDocument: Send + Sync {
    /// Current URL and document identity.
    async fn location(&self) -> Result<FrameLocation, DomError>;

    async fn ready_state(&self) -> Result<ReadyState, DomError>;

    /// Snapshot every element matching a CSS selector, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, DomError>;

    /// First element matching a CSS selector.
    async fn query(&self, selector: &str) -> Result<Option<ElementSnapshot>, DomError> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }

    async fn set_checked(&self, node: NodeRef, checked: bool) -> Result<(), DomError>;

    /// Add a class to the parent element of `node`.
    async fn add_parent_class(&self, node: NodeRef, class: &str) -> Result<(), DomError>;

    /// Assign the `value` property and return the value the element reports
    /// afterwards (a select rejects values it has no option for).
    async fn set_value(&self, node: NodeRef, value: &str) -> Result<String, DomError>;

    /// Dispatch a bubbling synthetic event.
    async fn dispatch_event(&self, node: NodeRef, event: DomEvent) -> Result<(), DomError>;

    /// Invoke the element's native `click()`.
    async fn click(&self, node: NodeRef) -> Result<(), DomError>;
}

/// Build an attribute selector fragment with the value quoted for CSS.
pub fn attr_selector(name: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[{}=\"{}\"]", name, escaped)
}
