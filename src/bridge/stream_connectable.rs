//! Stream transformation → connection factory.

use super::channel::{input_channel, InputSender, Offer};
use super::config::{BridgeConfig, ChannelCapacity};
use crate::builder::BuildError;
use crate::core::{Connectable, Connection, Consumer, Disposable, FlowError, FlowStream, Transformer};
use futures::StreamExt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A [`Connectable`] that runs a [`Transformer`] for every connection.
///
/// Connecting opens an input channel, spawns a bridge task that feeds the
/// channel through the transformer and hands every output to the
/// connection's consumer, and returns a connection that writes into the
/// channel. Disposing the connection cancels the bridge task, which drops
/// the receiving end and closes the channel.
pub struct StreamConnectable<I, O> {
    transform: Arc<dyn Transformer<I, O>>,
    capacity: ChannelCapacity,
    handle: Handle,
}

impl<I, O> StreamConnectable<I, O> {
    pub fn new(
        transform: Arc<dyn Transformer<I, O>>,
        config: BridgeConfig,
        handle: Handle,
    ) -> Result<Self, BuildError> {
        if let ChannelCapacity::Bounded { capacity: 0, .. } = config.capacity {
            return Err(BuildError::ZeroCapacity);
        }
        Ok(Self {
            transform,
            capacity: config.capacity,
            handle,
        })
    }
}

impl<I, O> Connectable<I, O> for StreamConnectable<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn connect(&self, output: Arc<dyn Consumer<O>>) -> Box<dyn Connection<I>> {
        self.open(output, None)
    }

    fn connect_observed(
        &self,
        output: Arc<dyn Consumer<O>>,
        failure: Arc<dyn Consumer<FlowError>>,
    ) -> Box<dyn Connection<I>> {
        self.open(output, Some(failure))
    }
}

impl<I, O> StreamConnectable<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn open(
        &self,
        output: Arc<dyn Consumer<O>>,
        failure: Option<Arc<dyn Consumer<FlowError>>>,
    ) -> Box<dyn Connection<I>> {
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let (sender, inputs) = input_channel(self.capacity);
        let outputs = self.transform.transform(inputs.map(Ok).boxed());

        self.handle
            .spawn(run_bridge(id, outputs, output, failure, cancel.clone()));
        tracing::debug!(connection_id = %id, capacity = ?self.capacity, "Stream connection opened");

        Box::new(StreamConnection { id, sender, cancel })
    }
}

/// Deliver `outputs` to `sink` until cancelled, completed or failed. A
/// failure is handed to `failure` unless the connection was disposed first.
async fn run_bridge<O>(
    id: Uuid,
    mut outputs: FlowStream<O>,
    sink: Arc<dyn Consumer<O>>,
    failure: Option<Arc<dyn Consumer<FlowError>>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            item = outputs.next() => match item {
                Some(Ok(value)) => {
                    if cancel.is_cancelled() {
                        break;
                    }
                    tracing::trace!(connection_id = %id, "Delivering output");
                    sink.accept(value);
                }
                Some(Err(error)) => {
                    if cancel.is_cancelled() {
                        break;
                    }
                    tracing::error!(connection_id = %id, error = %error, "Stream connection transformation failed");
                    cancel.cancel();
                    if let Some(failure) = &failure {
                        failure.accept(error);
                    }
                    break;
                }
                None => {
                    tracing::debug!(connection_id = %id, "Stream connection output completed");
                    break;
                }
            }
        }
    }
    cancel.cancel();
}

/// Connection returned by [`StreamConnectable::connect`].
struct StreamConnection<I> {
    id: Uuid,
    sender: InputSender<I>,
    cancel: CancellationToken,
}

impl<I> Consumer<I> for StreamConnection<I>
where
    I: Send,
{
    fn accept(&self, value: I) {
        if self.cancel.is_cancelled() {
            return;
        }
        match self.sender.offer(value) {
            Offer::Accepted => {}
            Offer::Full => {
                tracing::warn!(connection_id = %self.id, "Input channel full, dropping value");
            }
            Offer::Closed => {
                tracing::trace!(connection_id = %self.id, "Input channel closed, dropping value");
            }
        }
    }
}

impl<I> Disposable for StreamConnection<I>
where
    I: Send,
{
    fn dispose(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!(connection_id = %self.id, "Stream connection disposed");
        }
        self.cancel.cancel();
    }
}
