//! # docarchiver core
//!
//! Page detection and action state machine for the document archiving agent.
//!
//! The agent watches the content frame of the document management system,
//! recognises the review list page and the archive filing page, and performs
//! the clicks and selections an operator would perform on them.
//!
//! ## Architecture
//!
//! ```text
//!  FrameSignal ──► FrameObserver ──FrameChange──► AutomationSession ──► PageClassifier
//!  (load, DOM)        (poll)                          │      ▲
//!                                                     ▼      │ ControllerOutcome
//!                                   ListPageController / ArchivePageController
//!                                                     │
//!                                                     ▼
//!                                   ElementLocator + FrameDocument
//! ```
//!
//! ## Key Components
//!
//! - [`FrameDocument`]: the DOM surface of the embedded frame
//! - [`ElementLocator`]: ordered strategies for finding the review control
//! - [`FrameObserver`]: coalesced change notifications
//! - [`PageClassifier`]: URL to [`PageKind`]
//! - [`ListPageController`], [`ArchivePageController`]: page workflows
//! - [`AutomationSession`]: single-flight orchestration and enable lifecycle
//!
//! With the `test-util` feature, `memory::MemoryDocument` provides an
//! in-memory [`FrameDocument`] and `fixtures` builds the two known pages on
//! top of it. The recording collaborators come with the same feature.

pub mod classifier;
pub mod collaborators;
pub mod controller;
pub mod dom;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod fixtures;
pub mod locator;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod observer;
pub mod session;
pub mod wait;

pub use classifier::{PageClassifier, PageKind};
pub use collaborators::{
    Notifier, SessionStore, StatusSink, StoredSettings, TracingNotifier, TracingStatusSink,
};
#[cfg(any(test, feature = "test-util"))]
pub use collaborators::{MemoryStore, Notification, RecordingNotifier, RecordingStatusSink};
pub use controller::{ArchivePageController, ControllerOutcome, ListPageController};
pub use dom::{DomEvent, ElementSnapshot, FrameDocument, FrameLocation, NodeRef, ReadyState};
pub use error::{AutomationError, DomError, StoreError};
pub use locator::{ControlTarget, ElementLocator, FoundControl, LocateStrategy};
#[cfg(any(test, feature = "test-util"))]
pub use memory::{Element, MemoryDocument, Reaction, RecordedAction};
pub use observer::{ChangeTrigger, FrameChange, FrameObserver, FrameSignal};
pub use session::{
    AutomationSession, InFlight, SessionBuilder, SessionCommand, SessionHandle, SessionPhase,
    SessionState, StatusSnapshot,
};
pub use wait::{WaitPolicy, wait_for, wait_for_selector};

// Re-export CancellationToken for convenience
pub use tokio_util::sync::CancellationToken;
