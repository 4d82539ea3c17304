//! Async stream view of a subscription.

use super::Subscription;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_stream::wrappers::UnboundedReceiverStream;

/// A subscription delivered as a [`Stream`] of values.
///
/// Emissions are queued on an unbounded channel during the mutating call and
/// read at the consumer's pace. Dropping the stream unsubscribes. The stream
/// ends once the store (and every clone of it) is dropped.
///
/// # Example
///
/// ```rust
/// use futures::StreamExt;
/// use rxbox::Store;
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = Store::new();
/// let mut counts = store.stream(Some("count"));
///
/// store.assign_state(&json!({"count": 1})).unwrap();
/// store.assign_state(&json!({"count": 2})).unwrap();
///
/// assert_eq!(counts.next().await, Some(json!(1)));
/// assert_eq!(counts.next().await, Some(json!(2)));
/// # }
/// ```
#[derive(Debug)]
pub struct WatchStream {
    inner: UnboundedReceiverStream<Value>,
    subscription: Subscription,
}

impl WatchStream {
    pub(crate) fn new(inner: UnboundedReceiverStream<Value>, subscription: Subscription) -> Self {
        Self {
            inner,
            subscription,
        }
    }

    /// The underlying subscription handle.
    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Stream for WatchStream {
    type Item = Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl Drop for WatchStream {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
