//! Wiring of the browser connection, observer, session and console.

use std::sync::Arc;

use docarchiver_browser::{
    CdpClient, CdpError, CdpFrameDocument, PageStatusBadge, PageToastNotifier, SignalPump,
};
use docarchiver_config::{Config, ConfigLoader};
use docarchiver_core::{
    CancellationToken, FrameDocument, FrameObserver, SessionBuilder, SessionHandle,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::console;
use crate::error::AgentError;
use crate::store::JsonFileStore;

/// Attach to the browser and run until `quit`, Ctrl-C or the page goes away.
/// The signal pump cancels `shutdown` when the connection to the tab drops.
pub async fn run(config: Config) -> Result<(), AgentError> {
    let client = CdpClient::connect(&config.browser.endpoint).await?;
    let target = client
        .find_page(config.browser.page_url_contains.as_deref())
        .await?;
    info!(url = %target.url, title = %target.title, "Using tab");

    let page = Arc::new(client.attach_page(&target.id).await?);
    let events = page.take_events().ok_or(CdpError::SessionClosed)?;

    let doc: Arc<dyn FrameDocument> =
        Arc::new(CdpFrameDocument::new(page.clone(), &config.browser.frame_id));

    let state_file = ConfigLoader::expand_path(&config.storage.state_file);
    let store = Arc::new(JsonFileStore::new(state_file));
    info!(path = %store.path().display(), "State file");

    let mut builder = SessionBuilder::new(doc.clone(), &config).store(store.clone());
    if config.browser.page_notifications {
        builder = builder
            .notifier(Arc::new(PageToastNotifier::new(page.clone())))
            .status_sink(Arc::new(PageStatusBadge::new(page.clone())));
    }
    let session = builder.build()?;

    let shutdown = CancellationToken::new();
    let (handle, commands) = SessionHandle::channel(shutdown.clone());
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    let (change_tx, change_rx) = FrameObserver::channel();

    let mut pump = SignalPump::new(page.clone());
    if config.browser.page_notifications {
        pump = pump.with_toggle(handle.clone());
    }

    let tasks = vec![
        tokio::spawn(pump.run(events, signal_tx, shutdown.clone())),
        tokio::spawn(
            FrameObserver::new(doc, config.timing.clone()).run(
                signal_rx,
                change_tx,
                shutdown.clone(),
            ),
        ),
        tokio::spawn(console::run(
            console::spawn_stdin_reader(),
            handle.clone(),
            store,
            shutdown.clone(),
        )),
    ];

    {
        let handle = handle.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                result = tokio::signal::ctrl_c() => {
                    if result.is_ok() {
                        info!("Received Ctrl-C, shutting down");
                        handle.shutdown();
                    }
                }
            }
        });
    }

    let state = session.run(change_rx, commands, shutdown.clone()).await;
    shutdown.cancel();

    for task in tasks {
        if let Err(e) = task.await {
            warn!("Agent task failed: {}", e);
        }
    }

    info!(processed = state.processed_count, "Agent stopped");
    Ok(())
}
