//! Background drain of the message queue.

use tokio::sync::mpsc;

use crate::observability::metrics;
use crate::queue::QueuedMessage;

/// Drain `rx` until every sender is gone. Returns the number of messages seen.
pub async fn run_delivery(mut rx: mpsc::Receiver<QueuedMessage>) -> u64 {
    let mut delivered = 0u64;
    while let Some(message) = rx.recv().await {
        delivered += 1;
        metrics::record_delivered(&message.topic);
        tracing::info!(
            topic = %message.topic,
            request_id = %message.request_id,
            sender = message.sender.as_ref().map(|s| s.id.as_str()).unwrap_or("-"),
            bytes = message.payload.len(),
            "Message delivered"
        );
    }
    tracing::info!(delivered, "Message queue drained");
    delivered
}
