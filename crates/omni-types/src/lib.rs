//! Common types module for the omniwire toolkit.
//!
//! This module defines the core data types and structures shared by every
//! other crate in the workspace: the coordinate model locating contracts in
//! the omniverse, the graph value types carrying declared configuration, the
//! transaction model consumed by the sign-and-send pipeline, and the
//! canonical configuration shapes reconciled by the configurators.

/// Canonical cross-chain configuration shapes (ULN, executor, OApp).
pub mod config;
/// Coordinate model types locating deployments and connections.
pub mod coordinates;
/// Graph value types carrying declared configuration.
pub mod graph;
/// Execution-options encoding for enforced options.
pub mod options;
/// Transaction model and submission outcome types.
pub mod transaction;
/// Utility functions for address normalization.
pub mod utils;

// Re-export all types for convenient access
pub use config::*;
pub use coordinates::*;
pub use graph::*;
pub use options::*;
pub use transaction::*;
pub use utils::{addresses_equal, normalize_address};
