//! # Shared Types Crate
//!
//! This crate contains all domain entities, patch types, and the remote-store
//! ports shared across the pipeline-sync subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **View Records, Not Rows**: `DealRecord` is a denormalized read-model
//!   projection; raw remote payloads never carry the display fields.
//! - **Ports at the Boundary**: Remote collaborators are reachable only
//!   through the traits in `ports`.

pub mod entities;
pub mod errors;
pub mod ports;

pub use entities::*;
pub use errors::*;
pub use ports::*;
