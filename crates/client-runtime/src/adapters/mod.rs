//! In-memory implementations of the remote-store ports.

mod memory;

pub use memory::{MemoryContactStore, MemoryDealStore, MemoryHistoryStore, MemoryPipelineStore};
