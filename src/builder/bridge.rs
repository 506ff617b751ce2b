//! Builder for stream/connection bridges.

use crate::bridge::{BridgeConfig, ChannelCapacity, ConnectableStream, StreamConnectable};
use crate::builder::error::BuildError;
use crate::core::{Connectable, Transformer};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Builder for bridges with a fluent API.
///
/// The runtime handle defaults to the one the builder is used in; outside
/// a runtime it must be given explicitly.
///
/// # Example
///
/// ```rust
/// use mindflow::bridge::ChannelCapacity;
/// use mindflow::builder::BridgeBuilder;
/// use mindflow::core::map_transformer;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
///
/// let connectable = BridgeBuilder::new()
///     .handle(runtime.handle().clone())
///     .capacity(ChannelCapacity::bounded(32))
///     .stream_connectable::<u64, u64, _>(map_transformer(|n: u64| n * 2))
///     .unwrap();
/// # drop(connectable);
/// ```
#[derive(Clone, Debug, Default)]
pub struct BridgeBuilder {
    config: BridgeConfig,
    handle: Option<Handle>,
}

impl BridgeBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all settings.
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the input channel capacity of stream connectables.
    pub fn capacity(mut self, capacity: ChannelCapacity) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the runtime bridge tasks are spawned on.
    pub fn handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    fn resolve_handle(&self) -> Result<Handle, BuildError> {
        match &self.handle {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|_| BuildError::MissingRuntime),
        }
    }

    /// Build a connection factory running `transform` per connection.
    pub fn stream_connectable<I, O, T>(
        self,
        transform: T,
    ) -> Result<StreamConnectable<I, O>, BuildError>
    where
        T: Transformer<I, O> + 'static,
    {
        let handle = self.resolve_handle()?;
        StreamConnectable::new(Arc::new(transform), self.config, handle)
    }

    /// Build a stream transformation backed by `connectable`.
    pub fn connectable_stream<I, O, C>(
        self,
        connectable: C,
    ) -> Result<ConnectableStream<I, O>, BuildError>
    where
        C: Connectable<I, O> + 'static,
        I: Send + 'static,
        O: Send + 'static,
    {
        let handle = self.resolve_handle()?;
        Ok(ConnectableStream::new(Arc::new(connectable), handle))
    }
}
