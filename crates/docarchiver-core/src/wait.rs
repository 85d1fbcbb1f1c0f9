//! Bounded poll-until-ready waits.
//!
//! Every "wait for the page" step of the controllers goes through
//! [`wait_for`], so a control that never appears ends in `None` after the
//! policy's budget instead of an open-ended sleep.

use std::future::Future;
use std::time::Duration;

use docarchiver_config::TimingConfig;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::dom::{ElementSnapshot, FrameDocument};
use crate::error::DomError;

/// Timeout and poll interval of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(timing.wait_timeout(), timing.wait_interval())
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_millis(100))
    }
}

/// Poll `probe` until it yields a value or the policy's timeout elapses.
///
/// Probe errors count as "not yet": the frame is often mid-navigation while
/// a controller waits. The last error is logged when the wait gives up.
pub async fn wait_for<T, F, Fut>(policy: WaitPolicy, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, DomError>>,
{
    let start = Instant::now();
    let mut last_error: Option<DomError> = None;

    loop {
        match probe().await {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(e) => {
                trace!("Wait probe failed: {}", e);
                last_error = Some(e);
            }
        }

        if start.elapsed() >= policy.timeout {
            if let Some(e) = last_error {
                debug!("Wait gave up after {:?}, last error: {}", policy.timeout, e);
            }
            return None;
        }

        tokio::time::sleep(policy.interval).await;
    }
}

/// Wait until `selector` matches an element of the frame document.
pub async fn wait_for_selector(
    doc: &dyn FrameDocument,
    selector: &str,
    policy: WaitPolicy,
) -> Option<ElementSnapshot> {
    wait_for(policy, move || doc.query(selector)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_immediate() {
        let found = wait_for(WaitPolicy::default(), || async { Ok(Some(1)) }).await;
        assert_eq!(found, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_after_polls() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let found = wait_for(WaitPolicy::default(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(if n >= 3 { Some(n) } else { None }) }
        })
        .await;
        assert_eq!(found, Some(3));
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_times_out() {
        let start = Instant::now();
        let found: Option<u32> = wait_for(WaitPolicy::default(), || async { Ok(None) }).await;
        assert!(found.is_none());
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_treats_errors_as_pending() {
        let calls = AtomicU32::new(0);
        let found = wait_for(WaitPolicy::default(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(DomError::FrameAbsent("dTreeContent".to_string()))
                } else {
                    Ok(Some("ready"))
                }
            }
        })
        .await;
        assert_eq!(found, Some("ready"));
    }

    #[test]
    fn test_policy_from_timing() {
        let policy = WaitPolicy::from_timing(&TimingConfig::default());
        assert_eq!(policy, WaitPolicy::default());
        assert_eq!(policy.timeout_ms(), 5000);
    }
}
