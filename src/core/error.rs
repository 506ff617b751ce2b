//! Failure classification for bridged streams.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error raised by user code inside a stream stage.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Terminal failure of a [`FlowStream`](crate::core::FlowStream).
///
/// A caller observing a bridged stream sees at most one of these, after
/// which the stream ends.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The stream driving a loop failed. Always fatal to that execution.
    #[error("Unrecoverable failure in incoming stream: {0}")]
    Unrecoverable(#[source] Box<FlowError>),

    /// An effect matched none of the categories a router was built with.
    #[error("Unknown effect: {0}")]
    UnknownEffect(UnknownEffect),

    /// A stage (typically an effect handler) failed on its own.
    #[error("{0}")]
    Handler(#[source] BoxError),
}

impl FlowError {
    /// Wrap a failure of the driving input stream.
    pub fn unrecoverable(cause: FlowError) -> Self {
        FlowError::Unrecoverable(Box::new(cause))
    }

    /// Build a handler-local failure from any error or message.
    ///
    /// ```rust
    /// use mindflow::core::FlowError;
    ///
    /// let err = FlowError::handler("disk full");
    /// assert_eq!(err.to_string(), "disk full");
    /// ```
    pub fn handler<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        FlowError::Handler(error.into())
    }

    pub fn unknown_effect<F>(effect: F) -> Self
    where
        F: fmt::Debug + Send + Sync + 'static,
    {
        FlowError::UnknownEffect(UnknownEffect::new(effect))
    }

    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, FlowError::Unrecoverable(_))
    }

    pub fn is_unknown_effect(&self) -> bool {
        matches!(self, FlowError::UnknownEffect(_))
    }

    /// The failure wrapped by an unrecoverable error.
    pub fn cause(&self) -> Option<&FlowError> {
        match self {
            FlowError::Unrecoverable(cause) => Some(cause),
            _ => None,
        }
    }
}

/// An effect value that no router category includes.
///
/// Holds the effect itself so callers can inspect it with
/// [`UnknownEffect::effect`].
#[derive(Clone)]
pub struct UnknownEffect {
    effect: Arc<dyn Any + Send + Sync>,
    description: String,
}

impl UnknownEffect {
    pub fn new<F>(effect: F) -> Self
    where
        F: fmt::Debug + Send + Sync + 'static,
    {
        Self {
            description: format!("{effect:?}"),
            effect: Arc::new(effect),
        }
    }

    /// Downcast the offending effect to its concrete type.
    pub fn effect<F: 'static>(&self) -> Option<&F> {
        self.effect.downcast_ref::<F>()
    }

    /// `Debug` rendering of the offending effect.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for UnknownEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnknownEffect")
            .field(&self.description)
            .finish()
    }
}

impl fmt::Display for UnknownEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
