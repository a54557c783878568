//! # ps-01-read-cache
//!
//! Read-Model Cache subsystem for pipeline-sync.
//!
//! ## Role in System
//!
//! - **Single Source of Truth**: the one authoritative in-memory store of
//!   denormalized view records for a dataset
//! - **Atomic Updates**: every mutation flows through `write`, which applies
//!   a pure updater under a short-lived lock
//! - **No Divergent Copies**: consumers never retain a private copy across a
//!   suspension point; they re-read after every await

pub mod cache;

pub use cache::{CacheRead, DealCache};
