//! Per-connection input channel.

use super::config::{Backpressure, ChannelCapacity};
use futures::stream::{BoxStream, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::{ReceiverStream, UnboundedReceiverStream};

/// Outcome of offering a value to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Offer {
    Accepted,
    Full,
    Closed,
}

pub(crate) enum InputSender<I> {
    Unbounded(mpsc::UnboundedSender<I>),
    Bounded(mpsc::Sender<I>, Backpressure),
}

impl<I> InputSender<I> {
    /// Write a value without waiting, except under `Backpressure::Block`
    /// outside a runtime.
    pub(crate) fn offer(&self, value: I) -> Offer {
        match self {
            InputSender::Unbounded(tx) => match tx.send(value) {
                Ok(()) => Offer::Accepted,
                Err(_) => Offer::Closed,
            },
            InputSender::Bounded(tx, Backpressure::Reject) => match tx.try_send(value) {
                Ok(()) => Offer::Accepted,
                Err(TrySendError::Full(_)) => Offer::Full,
                Err(TrySendError::Closed(_)) => Offer::Closed,
            },
            InputSender::Bounded(tx, Backpressure::Block) => {
                if Handle::try_current().is_ok() {
                    return match tx.try_send(value) {
                        Ok(()) => Offer::Accepted,
                        Err(TrySendError::Full(_)) => {
                            tracing::debug!("Blocking offer on a runtime thread, rejecting instead");
                            Offer::Full
                        }
                        Err(TrySendError::Closed(_)) => Offer::Closed,
                    };
                }
                match tx.blocking_send(value) {
                    Ok(()) => Offer::Accepted,
                    Err(_) => Offer::Closed,
                }
            }
        }
    }
}

/// Create the channel. `capacity` must not be a zero-sized bound.
pub(crate) fn input_channel<I>(capacity: ChannelCapacity) -> (InputSender<I>, BoxStream<'static, I>)
where
    I: Send + 'static,
{
    match capacity {
        ChannelCapacity::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                InputSender::Unbounded(tx),
                UnboundedReceiverStream::new(rx).boxed(),
            )
        }
        ChannelCapacity::Bounded {
            capacity,
            backpressure,
        } => {
            let (tx, rx) = mpsc::channel(capacity);
            (
                InputSender::Bounded(tx, backpressure),
                ReceiverStream::new(rx).boxed(),
            )
        }
    }
}
