use std::time::Duration;

use docarchiver_core::SessionCommand;
use parking_lot::Mutex;
use serde_json::json;

use super::*;

#[derive(Default)]
struct RecordingPage {
    calls: Mutex<Vec<String>>,
}

impl RecordingPage {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl PageControl for RecordingPage {
    async fn request_document(&self) -> Result<i64, CdpError> {
        self.calls.lock().push("DOM.getDocument".to_string());
        Ok(1)
    }

    async fn add_binding(&self, name: &str) -> Result<(), CdpError> {
        self.calls.lock().push(format!("Runtime.addBinding {}", name));
        Ok(())
    }
}

fn event(method: &str, params: serde_json::Value) -> CdpResponse {
    serde_json::from_value(json!({"method": method, "params": params})).unwrap()
}

fn badge_click() -> CdpResponse {
    event(
        "Runtime.bindingCalled",
        json!({"name": TOGGLE_BINDING, "payload": "toggle", "executionContextId": 1}),
    )
}

#[test]
fn test_signal_for_load_events() {
    assert_eq!(signal_for("Page.frameNavigated"), Some(FrameSignal::Loaded));
    assert_eq!(signal_for("Page.frameStoppedLoading"), Some(FrameSignal::Loaded));
}

#[test]
fn test_signal_for_insertions() {
    assert_eq!(signal_for("DOM.childNodeInserted"), Some(FrameSignal::NodesInserted));
}

#[test]
fn test_signal_for_ignored() {
    assert_eq!(signal_for("DOM.attributeModified"), None);
    assert_eq!(signal_for("Runtime.consoleAPICalled"), None);
    assert_eq!(signal_for("DOM.documentUpdated"), None);
}

#[test]
fn test_document_refresh() {
    assert!(needs_document_refresh("DOM.documentUpdated"));
    assert!(needs_document_refresh("Page.frameStoppedLoading"));
    assert!(!needs_document_refresh("DOM.childNodeInserted"));
}

#[test]
fn test_is_toggle_request() {
    assert!(is_toggle_request(&badge_click()));
    assert!(!is_toggle_request(&event(
        "Runtime.bindingCalled",
        json!({"name": "somethingElse", "payload": ""})
    )));
    assert!(!is_toggle_request(&event("Page.frameNavigated", json!({}))));
}

#[tokio::test]
async fn test_lost_page_cancels_shutdown() {
    let page = Arc::new(RecordingPage::default());
    let (events_tx, events) = mpsc::unbounded_channel();
    let (signals, _signal_rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();

    drop(events_tx);
    SignalPump::new(page.clone())
        .run(events, signals, shutdown.clone())
        .await;

    assert!(shutdown.is_cancelled());
    assert_eq!(page.calls(), vec!["DOM.getDocument"]);
}

#[tokio::test]
async fn test_shutdown_stops_pump() {
    let page = Arc::new(RecordingPage::default());
    let (_events_tx, events) = mpsc::unbounded_channel();
    let (signals, _signal_rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    tokio::time::timeout(
        Duration::from_secs(5),
        SignalPump::new(page).run(events, signals, shutdown),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_load_refreshes_document_and_signals() {
    let page = Arc::new(RecordingPage::default());
    let (events_tx, events) = mpsc::unbounded_channel();
    let (signals, mut signal_rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();
    let pump = tokio::spawn(SignalPump::new(page.clone()).run(events, signals, shutdown.clone()));

    events_tx
        .send(event("Page.frameStoppedLoading", json!({"frameId": "F1"})))
        .unwrap();
    events_tx
        .send(event("DOM.childNodeInserted", json!({"parentNodeId": 4})))
        .unwrap();

    assert_eq!(signal_rx.recv().await, Some(FrameSignal::Loaded));
    assert_eq!(signal_rx.recv().await, Some(FrameSignal::NodesInserted));
    assert_eq!(page.calls(), vec!["DOM.getDocument", "DOM.getDocument"]);

    shutdown.cancel();
    pump.await.unwrap();
}

#[tokio::test]
async fn test_badge_click_toggles_session() {
    let page = Arc::new(RecordingPage::default());
    let (events_tx, events) = mpsc::unbounded_channel();
    let (signals, mut signal_rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();
    let (handle, mut commands) = SessionHandle::channel(shutdown.clone());
    let pump = tokio::spawn(
        SignalPump::new(page.clone())
            .with_toggle(handle)
            .run(events, signals, shutdown.clone()),
    );

    events_tx.send(badge_click()).unwrap();
    let Some(SessionCommand::Toggle { reply }) = commands.recv().await else {
        panic!("expected a toggle command");
    };
    reply.send(Ok(true)).unwrap();

    assert_eq!(
        page.calls(),
        vec![
            format!("Runtime.addBinding {}", TOGGLE_BINDING),
            "DOM.getDocument".to_string()
        ]
    );
    assert!(signal_rx.try_recv().is_err());

    shutdown.cancel();
    pump.await.unwrap();
}

#[tokio::test]
async fn test_badge_click_without_session_is_ignored() {
    let page = Arc::new(RecordingPage::default());
    let (events_tx, events) = mpsc::unbounded_channel();
    let (signals, _signal_rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();

    events_tx.send(badge_click()).unwrap();
    drop(events_tx);
    SignalPump::new(page.clone())
        .run(events, signals, shutdown)
        .await;

    assert_eq!(page.calls(), vec!["DOM.getDocument"]);
}
