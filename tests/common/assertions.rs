//! Event-driven waiting helpers

use gallery_fetch::{BatchId, BatchReport, Event};
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;

/// Wait for the `BatchComplete` event of `batch_id`
///
/// # Panics
/// Panics if the event does not arrive within `timeout` or the channel closes.
pub async fn wait_for_batch(
    events: &mut Receiver<Event>,
    batch_id: BatchId,
    timeout: Duration,
) -> BatchReport {
    tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(Event::BatchComplete(report)) if report.batch_id == batch_id => return report,
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => panic!("event receiver lagged by {n} events"),
                Err(RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for BatchComplete")
}

/// Count `ItemSettled` events already buffered on `events`
pub fn drain_settled(events: &mut Receiver<Event>) -> usize {
    let mut settled = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, Event::ItemSettled { .. }) {
            settled += 1;
        }
    }
    settled
}
