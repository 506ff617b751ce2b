//! Bridges between stream transformations and connections.
//!
//! - [`StreamConnectable`] turns a [`Transformer`] into a [`Connectable`]
//! - [`ConnectableStream`] turns a [`Connectable`] into a [`Transformer`]
//!
//! Both spawn one task per connection on an explicitly supplied
//! `tokio::runtime::Handle`. Disposing the connection, or dropping the
//! produced stream, cancels that task.

mod channel;
mod config;
mod connectable_stream;
mod stream_connectable;

pub use config::{Backpressure, BridgeConfig, ChannelCapacity};
pub use connectable_stream::ConnectableStream;
pub use stream_connectable::StreamConnectable;

use crate::builder::{BridgeBuilder, BuildError};
use crate::core::{Connectable, FlowStream, Transformer};

/// Conversions from a [`Transformer`] into a connection factory.
pub trait TransformerExt<I, O>: Transformer<I, O> + Sized + 'static
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Convert into a [`StreamConnectable`] with default settings on the
    /// current runtime.
    fn into_connectable(self) -> Result<StreamConnectable<I, O>, BuildError> {
        BridgeBuilder::new().stream_connectable(self)
    }
}

impl<I, O, T> TransformerExt<I, O> for T
where
    T: Transformer<I, O> + 'static,
    I: Send + 'static,
    O: Send + 'static,
{
}

/// Conversions from a [`Connectable`] into a stream transformation.
pub trait ConnectableExt<I, O>: Connectable<I, O> + Sized + 'static
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Convert into a [`ConnectableStream`] on the current runtime.
    fn into_transformer(self) -> Result<ConnectableStream<I, O>, BuildError> {
        BridgeBuilder::new().connectable_stream(self)
    }

    /// Run `input` through a new connection of this connectable.
    fn transform_stream(self, input: FlowStream<I>) -> Result<FlowStream<O>, BuildError> {
        Ok(self.into_transformer()?.apply(input))
    }
}

impl<I, O, C> ConnectableExt<I, O> for C
where
    C: Connectable<I, O> + 'static,
    I: Send + 'static,
    O: Send + 'static,
{
}
