//! # Sync Bus - Push Channel for Remote Change Notifications
//!
//! The client-side end of the remote store's push channel. The remote store
//! emits discrete insert/update/delete notifications per record; this crate
//! delivers them to per-dataset subscribers with no ordering guarantee
//! relative to local writes.
//!
//! ## Delivery Model
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Remote store │                    │  Reconciler  │
//! │ (push feed)  │    publish()       │ (per dataset)│
//! └──────────────┘ ──────┐            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Change Bus  │ ─────────┘
//!                  └──────────────┘  subscribe(dataset)
//! ```
//!
//! Notifications carry no revision number; consumers must merge
//! last-arrival-wins. A lagged subscriber drops events rather than blocking
//! the feed.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{Change, ChangeEvent, ChangeFilter};
pub use publisher::{ChangePublisher, InMemoryChangeBus};
pub use subscriber::{ChangeStream, ChangeSubscriber, Subscription, SubscriptionError};

/// Events buffered per subscriber; older events are dropped once a
/// subscriber lags past this.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
