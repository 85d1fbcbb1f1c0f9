//! Frame change detection.
//!
//! Three sources feed the observer: a fixed-interval poll of the frame
//! location, load signals and node-insertion signals from the browser. All
//! of them end up as a [`FrameChange`] on one capacity-1 channel, so a burst
//! of triggers while the session is busy collapses into a single pending
//! change.

use std::sync::Arc;

use docarchiver_config::TimingConfig;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::dom::{FrameDocument, FrameLocation};

/// Raw signals from the browser side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSignal {
    /// The frame finished loading a document.
    Loaded,
    /// Nodes were inserted into the frame document.
    NodesInserted,
}

/// What caused a [`FrameChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeTrigger {
    /// Poll interval elapsed on an unchanged frame.
    Poll,
    /// The poll saw a new URL or a new document.
    UrlChanged,
    /// Settle delay after a load signal.
    Load,
    /// Debounced node insertions.
    Mutation,
    /// Explicit check, e.g. right after enabling.
    Manual,
}

/// One observation of the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameChange {
    pub location: FrameLocation,
    pub trigger: ChangeTrigger,
}

/// Watches the content frame and reports changes.
pub struct FrameObserver {
    doc: Arc<dyn FrameDocument>,
    timing: TimingConfig,
    last_observed: Option<FrameLocation>,
}

impl FrameObserver {
    pub fn new(doc: Arc<dyn FrameDocument>, timing: TimingConfig) -> Self {
        Self {
            doc,
            timing,
            last_observed: None,
        }
    }

    /// The change channel. Capacity 1: a full channel means a change is
    /// already pending and the new one is coalesced into it.
    pub fn channel() -> (mpsc::Sender<FrameChange>, mpsc::Receiver<FrameChange>) {
        mpsc::channel(1)
    }

    /// Location seen by the last successful read.
    pub fn last_observed(&self) -> Option<&FrameLocation> {
        self.last_observed.as_ref()
    }

    /// Read the frame location once. A poll that sees a new location is
    /// reported as [`ChangeTrigger::UrlChanged`].
    pub async fn observe(&mut self, trigger: ChangeTrigger) -> Option<FrameChange> {
        let location = match self.doc.location().await {
            Ok(location) => location,
            Err(e) => {
                debug!("Frame not readable: {}", e);
                return None;
            }
        };

        let changed = self.last_observed.as_ref() != Some(&location);
        let trigger = match trigger {
            ChangeTrigger::Poll if changed => ChangeTrigger::UrlChanged,
            other => other,
        };
        if changed {
            debug!(
                url = %location.url,
                document = location.document_id,
                "Frame location changed"
            );
            self.last_observed = Some(location.clone());
        }

        Some(FrameChange { location, trigger })
    }

    /// Run until `shutdown` is cancelled or the receiving side goes away.
    pub async fn run(
        mut self,
        mut signals: mpsc::UnboundedReceiver<FrameSignal>,
        out: mpsc::Sender<FrameChange>,
        shutdown: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(self.timing.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut pending: Option<Pending> = None;
        let mut signals_open = true;

        info!(
            poll_ms = self.timing.poll_interval_ms,
            "Frame observer started"
        );

        loop {
            let deadline = pending.map(|p| p.at);
            let trigger = tokio::select! {
                _ = shutdown.cancelled() => break,

                _ = ticker.tick() => ChangeTrigger::Poll,

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    match pending.take() {
                        Some(p) => p.trigger,
                        None => continue,
                    }
                }

                signal = signals.recv(), if signals_open => {
                    match signal {
                        Some(FrameSignal::Loaded) => {
                            pending = Some(schedule(pending, Instant::now(), self.timing.load_settle(), ChangeTrigger::Load));
                        }
                        Some(FrameSignal::NodesInserted) => {
                            pending = Some(schedule(pending, Instant::now(), self.timing.mutation_debounce(), ChangeTrigger::Mutation));
                        }
                        None => {
                            debug!("Frame signal source closed, polling only");
                            signals_open = false;
                        }
                    }
                    continue;
                }
            };

            let Some(change) = self.observe(trigger).await else {
                continue;
            };
            match out.try_send(change) {
                Ok(()) => {}
                Err(TrySendError::Full(change)) => {
                    trace!(trigger = ?change.trigger, "Change coalesced into pending one");
                }
                Err(TrySendError::Closed(_)) => break,
            }
        }

        info!("Frame observer stopped");
    }
}

/// A signal-triggered check waiting for its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    /// When the first signal of the burst arrived.
    since: Instant,
    at: Instant,
    trigger: ChangeTrigger,
}

/// A burst of signals never defers its check past `since + delay * MAX_DEFERRAL`.
const MAX_DEFERRAL: u32 = 2;

/// Fold a new signal into the pending check.
///
/// Signals push the deadline out to `now + delay`, capped at
/// [`MAX_DEFERRAL`] delays after the first signal of the burst. A pending
/// load is never postponed by insertions and outranks them.
fn schedule(
    pending: Option<Pending>,
    now: Instant,
    delay: std::time::Duration,
    trigger: ChangeTrigger,
) -> Pending {
    let Some(current) = pending else {
        return Pending {
            since: now,
            at: now + delay,
            trigger,
        };
    };

    if current.trigger == ChangeTrigger::Load && trigger != ChangeTrigger::Load {
        return current;
    }

    let cap = current.since + delay * MAX_DEFERRAL;
    Pending {
        since: current.since,
        at: (now + delay).min(cap).max(current.at),
        trigger: if current.trigger == ChangeTrigger::Load {
            current.trigger
        } else {
            trigger
        },
    }
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
