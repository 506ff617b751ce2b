//! Build errors for bridges and effect routers.

use thiserror::Error;

/// Errors that can occur when building bridges and effect routers.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("No tokio runtime available. Call .handle(handle) or build inside a runtime")]
    MissingRuntime,

    #[error("Bounded channel capacity must be greater than zero")]
    ZeroCapacity,

    #[error("Effect category {category} already has a handler")]
    DuplicateCategory { category: String },
}
