//! # Change Subscriber
//!
//! The receiving side of the sync bus: per-dataset subscription handles and
//! a stream adapter for combinator-style consumers.

use crate::events::{ChangeEvent, ChangeFilter};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The change bus was closed.
    #[error("Change bus closed")]
    Closed,
}

/// Trait for subscribing to change events from the bus.
pub trait ChangeSubscriber: Send + Sync {
    /// Open a subscription for events matching `filter`.
    fn subscribe(&self, filter: ChangeFilter) -> Subscription;
}

/// A live subscription to the push channel.
///
/// Dropping the handle unregisters it from the bus's tracking map.
pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    filter: ChangeFilter,
    /// Shared tracking map, decremented on drop.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,
    dataset_key: String,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<ChangeEvent>,
        filter: ChangeFilter,
        subscriptions: Arc<RwLock<HashMap<String, usize>>>,
        dataset_key: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            subscriptions,
            dataset_key,
        }
    }

    /// Await the next event matching the filter, or `None` once the bus is
    /// dropped. Lagged gaps are logged and skipped, not surfaced.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {} // other dataset, keep waiting
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Subscriber lagged, events dropped");
                }
            }
        }
    }

    /// Non-blocking variant of [`Self::recv`]: `Ok(None)` when no matching
    /// event is buffered.
    pub fn try_recv(&mut self) -> Result<Option<ChangeEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
            }
        }
    }

    /// The filter this subscription was opened with.
    #[must_use]
    pub fn filter(&self) -> &ChangeFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Ok(mut subs) = self.subscriptions.write() else {
            return;
        };
        if let Some(count) = subs.get_mut(&self.dataset_key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                subs.remove(&self.dataset_key);
            }
        }
        debug!(dataset = %self.dataset_key, "Subscription dropped");
    }
}

/// `tokio_stream::Stream` adapter over a [`Subscription`].
pub struct ChangeStream {
    subscription: Subscription,
}

impl ChangeStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// The filter of the underlying subscription.
    #[must_use]
    pub fn filter(&self) -> &ChangeFilter {
        self.subscription.filter()
    }
}

impl Stream for ChangeStream {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.subscription.try_recv() {
            Ok(Some(event)) => Poll::Ready(Some(event)),
            Ok(None) => {
                // Nothing buffered; re-schedule instead of registering with
                // the broadcast channel directly.
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(SubscriptionError::Closed) => Poll::Ready(None),
        }
    }
}
