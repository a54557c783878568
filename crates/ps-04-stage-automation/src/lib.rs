//! # ps-04-stage-automation
//!
//! Stage-Transition Automator subsystem for pipeline-sync.
//!
//! ## Role in System
//!
//! - **Explicit State Machine**: the `{open, won, lost}` transition is a pure
//!   tagged-variant function, testable without any orchestration
//! - **Optimistic Primary**: the stage-and-flags update runs through the
//!   Mutation Pipeline before any side effect fires
//! - **Best-Effort Cascade**: history logging, lifecycle propagation, and
//!   forwarding run after the primary write confirms, each wrapped
//!   catch-and-log; a failed side effect never rolls back the move
//!
//! Side effects are at-least-once, not idempotent: repeated moves into a
//! qualifying stage after a manual reopen can forward the same deal again.

pub mod automator;
pub mod effects;
pub mod errors;
pub mod transition;

pub use automator::{MoveRequest, StageAutomator};
pub use errors::AutomationError;
pub use transition::{resolve_transition, LifecycleFlags, OutcomeOverride, Transition};
