//! # Deal Cache
//!
//! The single authoritative in-memory store for one dataset.
//!
//! ## Problem
//!
//! Optimistic writes, write confirmations, and push notifications all touch
//! the same records from different tasks. Ad hoc field mutation across await
//! points would let one consumer observe another's half-applied update.
//!
//! ## Solution: Pure Updaters Under a Short-Lived Lock
//!
//! All mutation goes through [`DealCache::write`], which takes a synchronous
//! pure function `Vec<DealRecord> -> Vec<DealRecord>` and swaps the sequence
//! atomically. The lock is never held across an await, so interleavings only
//! occur between discrete, fully-applied updates.

use shared_types::{CacheError, DealId, DealRecord, PipelineId};
use std::sync::RwLock;
use tracing::debug;

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead {
    /// The initial dataset fetch has not completed yet.
    NotLoaded,
    /// The current denormalized sequence.
    Loaded(Vec<DealRecord>),
}

impl CacheRead {
    /// The records, if loaded.
    #[must_use]
    pub fn records(self) -> Option<Vec<DealRecord>> {
        match self {
            Self::NotLoaded => None,
            Self::Loaded(records) => Some(records),
        }
    }
}

#[derive(Debug)]
enum CacheState {
    NotLoaded,
    Loaded(Vec<DealRecord>),
}

/// The authoritative read-model store for one dataset key.
///
/// Exactly one `DealCache` exists per dataset; every subsystem holds the same
/// shared instance and mutates it only through [`DealCache::write`].
pub struct DealCache {
    dataset: PipelineId,
    state: RwLock<CacheState>,
}

impl DealCache {
    /// Create an unloaded cache for one dataset.
    #[must_use]
    pub fn new(dataset: PipelineId) -> Self {
        Self {
            dataset,
            state: RwLock::new(CacheState::NotLoaded),
        }
    }

    /// The dataset this cache is authoritative for.
    #[must_use]
    pub fn dataset(&self) -> &PipelineId {
        &self.dataset
    }

    /// Current sequence, or `NotLoaded` before the initial fetch completes.
    pub fn read(&self) -> Result<CacheRead, CacheError> {
        let state = self.state.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(match &*state {
            CacheState::NotLoaded => CacheRead::NotLoaded,
            CacheState::Loaded(records) => CacheRead::Loaded(records.clone()),
        })
    }

    /// Prime the cache with the initial dataset fetch.
    ///
    /// Replaces any previous content; callers load once per dataset.
    pub fn load(&self, records: Vec<DealRecord>) -> Result<(), CacheError> {
        let mut state = self.state.write().map_err(|_| CacheError::LockPoisoned)?;
        debug!(dataset = %self.dataset, count = records.len(), "Cache loaded");
        *state = CacheState::Loaded(records);
        Ok(())
    }

    /// Apply a pure updater to the current sequence, atomically.
    ///
    /// The updater runs synchronously under the lock; no reader ever observes
    /// a partially-applied update. Fails with [`CacheError::NotLoaded`]
    /// before the initial load.
    pub fn write<F>(&self, updater: F) -> Result<(), CacheError>
    where
        F: FnOnce(Vec<DealRecord>) -> Vec<DealRecord>,
    {
        let mut state = self.state.write().map_err(|_| CacheError::LockPoisoned)?;
        match std::mem::replace(&mut *state, CacheState::NotLoaded) {
            CacheState::NotLoaded => Err(CacheError::NotLoaded(self.dataset.to_string())),
            CacheState::Loaded(records) => {
                *state = CacheState::Loaded(updater(records));
                Ok(())
            }
        }
    }

    /// Look up one record by id.
    pub fn get(&self, id: &DealId) -> Result<Option<DealRecord>, CacheError> {
        let state = self.state.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(match &*state {
            CacheState::NotLoaded => None,
            CacheState::Loaded(records) => records.iter().find(|r| &r.id == id).cloned(),
        })
    }

    /// Whether a record with this id is present.
    pub fn contains(&self, id: &DealId) -> Result<bool, CacheError> {
        Ok(self.get(id)?.is_some())
    }

    /// Number of records, or `None` before the initial load.
    pub fn len(&self) -> Result<Option<usize>, CacheError> {
        let state = self.state.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(match &*state {
            CacheState::NotLoaded => None,
            CacheState::Loaded(records) => Some(records.len()),
        })
    }

    /// Whether the initial load has completed.
    pub fn is_loaded(&self) -> Result<bool, CacheError> {
        let state = self.state.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(matches!(&*state, CacheState::Loaded(_)))
    }
}
