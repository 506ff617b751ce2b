//! Event-driven state-machine loops over streams.
//!
//! An [`EventLoop`] folds events into a model with a pure [`Update`]
//! function and hands the resulting effects to an effect handler. The
//! helpers here wire it to streams:
//!
//! - [`effect_handler`] turns an effect [`Transformer`] (typically an
//!   [`EffectRouter`](crate::router::EffectRouter)) into the connectable
//!   the loop dispatches to
//! - [`event_loop`] builds a loop from an update function and an effect
//!   transformer
//! - [`loop_from`] exposes a loop as a `Transformer` from events to models
//!
//! # Example
//!
//! ```rust
//! use futures::{stream, StreamExt};
//! use mindflow::core::{map_transformer, FlowError};
//! use mindflow::machine::{event_loop, loop_from, next, Next};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let update = |model: &u32, event: u32| -> Next<u32, ()> { next(model + event, []) };
//! let effects = map_transformer(|(): ()| 0u32);
//!
//! let counter = loop_from(event_loop(update, effects, 0).unwrap()).unwrap();
//! let models: Vec<Result<u32, FlowError>> = counter
//!     .apply(stream::iter(vec![Ok(1), Ok(2)]).boxed())
//!     .collect()
//!     .await;
//!
//! let models: Vec<u32> = models.into_iter().map(Result::unwrap).collect();
//! assert_eq!(models, vec![1, 3]);
//! # });
//! ```

mod driver;
mod next;
mod update;

pub use driver::EventLoop;
pub use next::{dispatch, first, next, no_change, First, Next};
pub use update::Update;

use crate::bridge::{ConnectableStream, StreamConnectable, TransformerExt};
use crate::builder::{BridgeBuilder, BuildError};
use crate::core::Transformer;

/// Run `transform` as the effect handler of a loop, on the current runtime.
pub fn effect_handler<F, E, T>(transform: T) -> Result<StreamConnectable<F, E>, BuildError>
where
    F: Send + 'static,
    E: Send + 'static,
    T: Transformer<F, E> + 'static,
{
    transform.into_connectable()
}

/// Build an event loop whose effects run through `effects`.
pub fn event_loop<M, E, F, U, T>(
    update: U,
    effects: T,
    start_model: M,
) -> Result<EventLoop<M, E, F>, BuildError>
where
    M: Clone + Send + Sync + 'static,
    E: Send + 'static,
    F: Clone + Send + Sync + 'static,
    U: Update<M, E, F> + 'static,
    T: Transformer<F, E> + 'static,
{
    Ok(EventLoop::new(update, effect_handler(effects)?, start_model))
}

/// Expose `event_loop` as a stream transformation from events to models.
///
/// Each application starts a fresh loop. A failure of the event stream ends
/// the model stream with
/// [`FlowError::Unrecoverable`](crate::core::FlowError::Unrecoverable) after
/// the models already produced. A failure of the effect handler, such as an
/// effect no router category includes, stops the loop and ends the model
/// stream with that failure.
pub fn loop_from<M, E, F>(
    event_loop: EventLoop<M, E, F>,
) -> Result<ConnectableStream<E, M>, BuildError>
where
    M: Clone + Send + Sync + 'static,
    E: Send + 'static,
    F: Clone + Send + Sync + 'static,
{
    BridgeBuilder::new().connectable_stream(event_loop)
}
