//! # Change Publisher
//!
//! Defines the publishing side of the sync bus.

use crate::events::{ChangeEvent, ChangeFilter};
use crate::subscriber::{ChangeStream, ChangeSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing change notifications to the bus.
///
/// In production this is driven by the remote store's push feed; in tests the
/// suite publishes directly to simulate out-of-band changes.
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    /// Publish a change event, returning how many subscribers received it.
    async fn publish(&self, event: ChangeEvent) -> usize;

    /// Total events published so far, delivered or not.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the sync bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer
/// semantics. Suitable for a single client process; a real deployment plugs
/// the remote push transport (e.g. a websocket feed) into `publish`.
pub struct InMemoryChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
    /// Live subscription count per dataset key, for observability.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryChangeBus {
    /// A bus with the default per-subscriber buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// A bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Open a subscription for events matching `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let dataset_key = format!("{:?}", filter.datasets);
        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(dataset_key.clone()).or_insert(0) += 1;
        }
        debug!(datasets = ?filter.datasets, "Subscription opened");

        Subscription::new(receiver, filter, self.subscriptions.clone(), dataset_key)
    }

    /// Same subscription, wrapped as a `Stream`.
    #[must_use]
    pub fn change_stream(&self, filter: ChangeFilter) -> ChangeStream {
        ChangeStream::new(self.subscribe(filter))
    }

    /// Number of live subscription handles.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Per-subscriber buffer size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeSubscriber for InMemoryChangeBus {
    fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        Self::subscribe(self, filter)
    }
}

#[async_trait]
impl ChangePublisher for InMemoryChangeBus {
    async fn publish(&self, event: ChangeEvent) -> usize {
        // Counted even when nobody is listening.
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let dataset = event.dataset.clone();
        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(
                    dataset = %dataset,
                    receivers = receiver_count,
                    "Change event published"
                );
                receiver_count
            }
            Err(_) => {
                warn!(dataset = %dataset, "No subscribers for change event");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
