//! # Client Runtime
//!
//! The composition root for pipeline-sync: wires one dataset's cache,
//! mutation pipeline, push reconciler, and stage automator into a single
//! [`PipelineClient`] facade for the UI layer.
//!
//! ## Wiring
//!
//! ```text
//! UI ──create/update/delete/move──→ PipelineClient
//!                                       │
//!                 ┌─────────────────────┼──────────────────────┐
//!                 ↓                     ↓                      ↓
//!         MutationPipeline       StageAutomator          Reconciler
//!                 │                     │                      ↑
//!                 └────→ DealCache ←────┘          Sync Bus ───┘
//!                            ↑                        ↑
//!                       remote ports            push channel
//! ```
//!
//! The in-memory adapters in [`adapters`] implement the remote ports for
//! wiring and tests; a real deployment swaps them for transport-backed
//! implementations.

pub mod adapters;
pub mod client;
pub mod telemetry;

pub use client::PipelineClient;
