//! # ps-02-mutation
//!
//! Mutation Pipeline subsystem for pipeline-sync.
//!
//! ## Role in System
//!
//! - **Optimistic First**: every mutation applies to the cache synchronously
//!   at begin, before the remote call is dispatched
//! - **Exact Rollback**: a rejected write restores the begin snapshot for the
//!   mutation's own target record, leaving concurrent mutations on other
//!   records untouched
//! - **Race-Safe Confirmation**: a create confirmation that loses the race
//!   against a push insert drops the temp record instead of duplicating

pub mod errors;
pub mod pipeline;

pub use errors::MutationError;
pub use pipeline::MutationPipeline;
