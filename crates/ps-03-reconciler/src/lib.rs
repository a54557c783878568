//! # ps-03-reconciler
//!
//! Push Reconciler subsystem for pipeline-sync.
//!
//! ## Role in System
//!
//! - **Out-of-Band Merge**: consumes insert/update/delete notifications from
//!   the sync bus, in arrival order, and folds them into the cache
//! - **Race Tolerant**: an insert for an id already present (the optimistic
//!   confirmation won, or a duplicate notification) is silently ignored
//! - **Field-Level Only**: merges by id and never refetches the dataset, so
//!   locally-derived display fields absent from raw payloads survive
//!
//! Notifications carry no revision number; merges are last-arrival-wins.

pub mod reconciler;
pub mod resolve;

pub use reconciler::Reconciler;
pub use resolve::DisplayResolver;
