use anyhow::Result;
use sphere_client::{CallEvent, CallHandle, RoomView};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for engine reactions (ms).
pub const EVENT_TIMEOUT_MS: u64 = 3000;

/// Poll interval used by the wait helpers (ms).
pub const POLL_INTERVAL_MS: u64 = 10;

/// Wait for the first event matching `pred`, skipping the others.
pub async fn wait_for_event(
    events: &mut mpsc::UnboundedReceiver<CallEvent>,
    pred: impl Fn(&CallEvent) -> bool,
) -> Result<CallEvent> {
    let deadline = Duration::from_millis(EVENT_TIMEOUT_MS);
    let found = tokio::time::timeout(deadline, async {
        while let Some(event) = events.recv().await {
            if pred(&event) {
                return Some(event);
            }
        }
        None
    })
    .await;

    match found {
        Ok(Some(event)) => Ok(event),
        Ok(None) => anyhow::bail!("Event channel closed"),
        Err(_) => anyhow::bail!("Timeout waiting for event"),
    }
}

/// Poll snapshots until `pred` holds.
pub async fn wait_for_view(
    handle: &CallHandle,
    pred: impl Fn(&RoomView) -> bool,
) -> Result<RoomView> {
    let start = tokio::time::Instant::now();
    loop {
        let view = handle.snapshot().await?;
        if pred(&view) {
            return Ok(view);
        }
        if start.elapsed() > Duration::from_millis(EVENT_TIMEOUT_MS) {
            anyhow::bail!("Timeout waiting for room view, last: {:?}", view.phase);
        }
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
}

/// Poll an async check until it returns true.
pub async fn wait_until<F, Fut>(check: F) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    while !check().await {
        if start.elapsed() > Duration::from_millis(EVENT_TIMEOUT_MS) {
            anyhow::bail!("Timeout waiting for condition");
        }
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
    Ok(())
}
