//! Handle to one job's progress-stream subscription.
//!
//! The reader task (see [`crate::socket`]) forwards typed messages over
//! an in-process channel; this handle owns the receiving end plus the
//! [`CancellationToken`] that stops the reader. Closing consumes the
//! handle, so a double close is unrepresentable.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::messages::StreamMessage;

/// Buffer between the stream reader and the controller. Events are
/// processed one at a time in arrival order.
pub const SUBSCRIPTION_BUFFER: usize = 32;

/// A fatal condition on the progress stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// A frame that could not be parsed into a known message.
    #[error("malformed stream event: {0}")]
    Malformed(String),

    /// A transport-level failure or disconnect.
    #[error("stream transport error: {0}")]
    Transport(String),
}

/// Exclusive handle to a single job's event feed.
pub struct Subscription {
    events: mpsc::Receiver<Result<StreamMessage, StreamError>>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn new(
        events: mpsc::Receiver<Result<StreamMessage, StreamError>>,
        cancel: CancellationToken,
    ) -> Self {
        Self { events, cancel }
    }

    /// Next item from the feed, in arrival order. `None` means the
    /// reader ended the stream; reaching it without a prior terminal
    /// message is a transport failure.
    pub async fn next_item(&mut self) -> Option<Result<StreamMessage, StreamError>> {
        self.events.recv().await
    }

    /// Close the subscription, stopping the reader task. Consumes the
    /// handle: the controller closes on exactly one of finished, error
    /// or cancelled.
    pub fn close(self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn close_cancels_the_reader_token() {
        let (_tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let token = CancellationToken::new();
        let sub = Subscription::new(rx, token.clone());

        sub.close();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn items_arrive_in_order() {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let mut sub = Subscription::new(rx, CancellationToken::new());

        tx.send(Ok(StreamMessage::Queued)).await.unwrap();
        tx.send(Ok(StreamMessage::Processing { progress: 12.0 }))
            .await
            .unwrap();
        drop(tx);

        assert_eq!(sub.next_item().await, Some(Ok(StreamMessage::Queued)));
        assert_eq!(
            sub.next_item().await,
            Some(Ok(StreamMessage::Processing { progress: 12.0 }))
        );
        assert_eq!(sub.next_item().await, None);
    }
}
