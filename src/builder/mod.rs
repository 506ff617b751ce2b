//! Builder API for bridges and effect routers.
//!
//! This module provides fluent builders and macros for wiring connections,
//! stream transformations and effect handlers with minimal boilerplate.

pub mod bridge;
pub mod error;
pub mod macros;
pub mod router;

pub use bridge::BridgeBuilder;
pub use error::BuildError;
pub use router::{EffectRouterBuilder, DEFAULT_BRANCH_CAPACITY};
