//! # docarchiver browser
//!
//! Chrome DevTools Protocol bindings for the document archiving agent.
//!
//! - [`CdpClient`]: browser connection and tab discovery
//! - [`PageSession`]: commands and events of one attached tab
//! - [`CdpFrameDocument`]: the content frame as a `FrameDocument`
//! - [`SignalPump`]: load and DOM insertion events as frame signals, badge
//!   clicks as session toggles
//! - [`PageToastNotifier`], [`PageStatusBadge`]: operator feedback in the page

pub mod cdp;
pub mod frame_document;
pub mod overlay;
pub mod signals;

pub use cdp::{CdpClient, CdpError, PageInfo, PageSession};
pub use frame_document::CdpFrameDocument;
pub use overlay::{PageStatusBadge, PageToastNotifier};
pub use signals::{PageControl, SignalPump, TOGGLE_BINDING};
