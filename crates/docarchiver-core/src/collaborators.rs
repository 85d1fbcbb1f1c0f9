//! Collaborators the session reports to and reads from.
//!
//! The settings UI, the persisted key-value store and the rendering of
//! notifications live outside the core. The session only sees these traits.

#[cfg(any(test, feature = "test-util"))]
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StoreError;

/// Operator-facing notification channel. Fire and forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Receives the enabled flag and the processed count on every transition.
pub trait StatusSink: Send + Sync {
    fn status_changed(&self, enabled: bool, processed_count: u32);
}

/// Settings as persisted by the settings UI. Missing keys fall back to the
/// configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    pub file_code: Option<String>,
    pub case_sequence: Option<String>,
}

/// Persisted state. The core reads settings and writes only the enabled flag.
pub trait SessionStore: Send + Sync {
    fn load_settings(&self) -> Result<StoredSettings, StoreError>;

    fn save_enabled(&self, enabled: bool) -> Result<(), StoreError>;
}

#[cfg(any(test, feature = "test-util"))]
/// A notification as delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(title, "{}", message);
    }
}

/// Writes status updates to the log.
#[derive(Debug, Default)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn status_changed(&self, enabled: bool, processed_count: u32) {
        info!(enabled, processed_count, "Automation status");
    }
}

#[cfg(any(test, feature = "test-util"))]
/// Keeps every notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.notifications
            .lock()
            .iter()
            .map(|n| n.title.clone())
            .collect()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.notifications.lock().push(Notification {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

#[cfg(any(test, feature = "test-util"))]
/// Keeps every status update.
#[derive(Debug, Default)]
pub struct RecordingStatusSink {
    updates: Mutex<Vec<(bool, u32)>>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<(bool, u32)> {
        self.updates.lock().clone()
    }

    pub fn last(&self) -> Option<(bool, u32)> {
        self.updates.lock().last().copied()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl StatusSink for RecordingStatusSink {
    fn status_changed(&self, enabled: bool, processed_count: u32) {
        self.updates.lock().push((enabled, processed_count));
    }
}

#[cfg(any(test, feature = "test-util"))]
/// Store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<StoredSettings>,
    enabled_writes: Mutex<Vec<bool>>,
}

#[cfg(any(test, feature = "test-util"))]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: StoredSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
            enabled_writes: Mutex::new(Vec::new()),
        }
    }

    /// Every flag written, in order.
    pub fn enabled_writes(&self) -> Vec<bool> {
        self.enabled_writes.lock().clone()
    }

    /// Last persisted flag.
    pub fn enabled(&self) -> Option<bool> {
        self.enabled_writes.lock().last().copied()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl SessionStore for MemoryStore {
    fn load_settings(&self) -> Result<StoredSettings, StoreError> {
        Ok(self.settings.lock().clone())
    }

    fn save_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.enabled_writes.lock().push(enabled);
        Ok(())
    }
}
