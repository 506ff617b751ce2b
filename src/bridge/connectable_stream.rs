//! Connection factory → stream transformation.

use crate::core::{
    consumer, Connectable, Connection, Consumer, Disposable, FlowError, FlowStream, Transformer,
};
use crate::dispose::DiscardAfterDisposeConnectable;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Exposes a [`Connectable`] as a [`Transformer`].
///
/// Each produced stream connects lazily on first poll, feeds every input
/// value to the connection's `accept` from a driver task and yields the
/// connection's outputs. The connection is disposed exactly once, when the
/// produced stream terminates or is dropped.
///
/// A failure of the input stream ends the produced stream with
/// [`FlowError::Unrecoverable`] wrapping that failure, after the outputs
/// already emitted. A failure the connection reports on its own (see
/// [`Connectable::connect_observed`]) ends it with that failure unchanged.
pub struct ConnectableStream<I, O> {
    connectable: Arc<dyn Connectable<I, O>>,
    handle: Handle,
}

impl<I, O> ConnectableStream<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new(connectable: Arc<dyn Connectable<I, O>>, handle: Handle) -> Self {
        Self {
            connectable: Arc::new(DiscardAfterDisposeConnectable::new(connectable)),
            handle,
        }
    }

    /// Run `input` through a fresh connection.
    pub fn apply(&self, input: FlowStream<I>) -> FlowStream<O> {
        ConnectedStream {
            phase: Phase::Idle {
                input,
                connectable: Arc::clone(&self.connectable),
                handle: self.handle.clone(),
            },
        }
        .boxed()
    }
}

impl<I, O> Transformer<I, O> for ConnectableStream<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn transform(&self, input: FlowStream<I>) -> FlowStream<O> {
        self.apply(input)
    }
}

enum Signal<O> {
    Output(O),
    Completed,
    Failed(FlowError),
}

enum Phase<I, O> {
    Idle {
        input: FlowStream<I>,
        connectable: Arc<dyn Connectable<I, O>>,
        handle: Handle,
    },
    Connected {
        id: Uuid,
        signals: mpsc::UnboundedReceiver<Signal<O>>,
        connection: Arc<dyn Connection<I>>,
        cancel: CancellationToken,
    },
    Done,
}

struct ConnectedStream<I, O> {
    phase: Phase<I, O>,
}

impl<I, O> ConnectedStream<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn connect(&mut self) {
        if !matches!(self.phase, Phase::Idle { .. }) {
            return;
        }
        let Phase::Idle {
            input,
            connectable,
            handle,
        } = std::mem::replace(&mut self.phase, Phase::Done)
        else {
            return;
        };

        let id = Uuid::new_v4();
        let (tx, signals) = mpsc::unbounded_channel();
        let emitter = {
            let tx = tx.clone();
            consumer(move |output: O| {
                let _ = tx.send(Signal::Output(output));
            })
        };
        let failure = {
            let tx = tx.clone();
            consumer(move |error: FlowError| {
                tracing::warn!(connection_id = %id, error = %error, "Connection failed");
                let _ = tx.send(Signal::Failed(error));
            })
        };
        let connection: Arc<dyn Connection<I>> =
            Arc::from(connectable.connect_observed(Arc::new(emitter), Arc::new(failure)));
        let cancel = CancellationToken::new();

        handle.spawn(drive(
            id,
            input,
            Arc::clone(&connection),
            tx,
            cancel.clone(),
        ));
        tracing::debug!(connection_id = %id, "Connectable stream connected");

        self.phase = Phase::Connected {
            id,
            signals,
            connection,
            cancel,
        };
    }

    /// Tear the connection down and move to `Done`.
    fn finish(&mut self, outcome: &'static str) {
        if let Phase::Connected {
            id,
            connection,
            cancel,
            ..
        } = std::mem::replace(&mut self.phase, Phase::Done)
        {
            tracing::debug!(connection_id = %id, outcome, "Connectable stream finished");
            cancel.cancel();
            connection.dispose();
        }
    }
}

impl<I, O> Stream for ConnectedStream<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    type Item = Result<O, FlowError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.connect();

        let polled = match &mut this.phase {
            Phase::Connected { signals, .. } => signals.poll_recv(cx),
            Phase::Idle { .. } | Phase::Done => return Poll::Ready(None),
        };

        match polled {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Signal::Output(output))) => Poll::Ready(Some(Ok(output))),
            Poll::Ready(Some(Signal::Failed(error))) => {
                this.finish("failed");
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(Some(Signal::Completed)) | Poll::Ready(None) => {
                this.finish("completed");
                Poll::Ready(None)
            }
        }
    }
}

impl<I, O> Drop for ConnectedStream<I, O> {
    fn drop(&mut self) {
        if let Phase::Connected {
            id,
            connection,
            cancel,
            ..
        } = &self.phase
        {
            tracing::debug!(connection_id = %id, "Connectable stream cancelled");
            cancel.cancel();
            connection.dispose();
        }
    }
}

async fn drive<I, O>(
    id: Uuid,
    mut input: FlowStream<I>,
    connection: Arc<dyn Connection<I>>,
    signals: mpsc::UnboundedSender<Signal<O>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            item = input.next() => match item {
                Some(Ok(value)) => connection.accept(value),
                Some(Err(error)) => {
                    tracing::warn!(connection_id = %id, error = %error, "Incoming stream failed");
                    let _ = signals.send(Signal::Failed(FlowError::unrecoverable(error)));
                    return;
                }
                None => {
                    let _ = signals.send(Signal::Completed);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Synchronously emits `prefix + input` for every input.
    struct Prefixer {
        prefix: &'static str,
        connects: AtomicUsize,
        disposals: Arc<AtomicUsize>,
    }

    /// Reports a failure instead of emitting when it sees "boom".
    struct PrefixConnection {
        prefix: &'static str,
        output: Arc<dyn Consumer<String>>,
        failure: Option<Arc<dyn Consumer<FlowError>>>,
        disposals: Arc<AtomicUsize>,
    }

    impl Prefixer {
        fn open(
            &self,
            output: Arc<dyn Consumer<String>>,
            failure: Option<Arc<dyn Consumer<FlowError>>>,
        ) -> Box<dyn Connection<String>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Box::new(PrefixConnection {
                prefix: self.prefix,
                output,
                failure,
                disposals: Arc::clone(&self.disposals),
            })
        }
    }

    impl Connectable<String, String> for Prefixer {
        fn connect(&self, output: Arc<dyn Consumer<String>>) -> Box<dyn Connection<String>> {
            self.open(output, None)
        }

        fn connect_observed(
            &self,
            output: Arc<dyn Consumer<String>>,
            failure: Arc<dyn Consumer<FlowError>>,
        ) -> Box<dyn Connection<String>> {
            self.open(output, Some(failure))
        }
    }

    impl Consumer<String> for PrefixConnection {
        fn accept(&self, value: String) {
            match (&self.failure, value.as_str()) {
                (Some(failure), "boom") => failure.accept(FlowError::handler("boom")),
                _ => self.output.accept(format!("{}{}", self.prefix, value)),
            }
        }
    }

    impl Disposable for PrefixConnection {
        fn dispose(&self) {
            self.disposals.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn prefixer() -> Arc<Prefixer> {
        Arc::new(Prefixer {
            prefix: ">",
            connects: AtomicUsize::new(0),
            disposals: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn strings(items: &[&str]) -> FlowStream<String> {
        stream::iter(
            items
                .iter()
                .map(|s| Ok(s.to_string()))
                .collect::<Vec<_>>(),
        )
        .boxed()
    }

    #[tokio::test]
    async fn completes_when_input_completes() {
        let connectable = prefixer();
        let bridge = ConnectableStream::new(connectable.clone(), Handle::current());

        let output = bridge.apply(strings(&["a", "b"])).collect::<Vec<_>>().await;

        let values: Vec<String> = output.into_iter().map(Result::unwrap).collect();
        assert_eq!(values, vec![">a", ">b"]);
        assert_eq!(connectable.disposals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn input_failure_is_unrecoverable() {
        let connectable = prefixer();
        let bridge = ConnectableStream::new(connectable.clone(), Handle::current());
        let input = stream::iter(vec![
            Ok("1".to_string()),
            Ok("2".to_string()),
            Err(FlowError::handler("expected")),
        ])
        .boxed();

        let output = bridge.apply(input).collect::<Vec<_>>().await;

        assert_eq!(output.len(), 3);
        assert_eq!(output[0].as_ref().unwrap(), ">1");
        assert_eq!(output[1].as_ref().unwrap(), ">2");
        let error = output[2].as_ref().unwrap_err();
        assert!(error.is_unrecoverable());
        assert_eq!(error.cause().unwrap().to_string(), "expected");
        assert_eq!(connectable.disposals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn connection_failure_ends_the_stream_unwrapped() {
        let connectable = prefixer();
        let bridge = ConnectableStream::new(connectable.clone(), Handle::current());
        let input = strings(&["1", "boom", "2"]).chain(stream::pending()).boxed();

        let output = bridge.apply(input).collect::<Vec<_>>().await;

        assert_eq!(output.len(), 2);
        assert_eq!(output[0].as_ref().unwrap(), ">1");
        let error = output[1].as_ref().unwrap_err();
        assert!(matches!(error, FlowError::Handler(_)));
        assert_eq!(error.to_string(), "boom");
        assert_eq!(connectable.disposals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn connects_lazily() {
        let connectable = prefixer();
        let bridge = ConnectableStream::new(connectable.clone(), Handle::current());

        let mut output = bridge.apply(strings(&["a"]));
        assert_eq!(connectable.connects.load(Ordering::SeqCst), 0);

        assert_eq!(output.next().await.unwrap().unwrap(), ">a");
        assert_eq!(connectable.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropping_the_stream_disposes_the_connection() {
        let connectable = prefixer();
        let bridge = ConnectableStream::new(connectable.clone(), Handle::current());
        let endless = strings(&["a"]).chain(stream::pending()).boxed();

        let mut output = bridge.apply(endless);
        assert_eq!(output.next().await.unwrap().unwrap(), ">a");
        drop(output);

        assert_eq!(connectable.disposals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropping_an_unpolled_stream_never_connects() {
        let connectable = prefixer();
        let bridge = ConnectableStream::new(connectable.clone(), Handle::current());

        drop(bridge.apply(strings(&["a"])));

        assert_eq!(connectable.connects.load(Ordering::SeqCst), 0);
        assert_eq!(connectable.disposals.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn every_application_gets_its_own_connection() {
        let connectable = prefixer();
        let bridge = ConnectableStream::new(connectable.clone(), Handle::current());

        let first = bridge.apply(strings(&["a"])).collect::<Vec<_>>().await;
        let second = bridge.apply(strings(&["b"])).collect::<Vec<_>>().await;

        assert_eq!(first[0].as_ref().unwrap(), ">a");
        assert_eq!(second[0].as_ref().unwrap(), ">b");
        assert_eq!(connectable.connects.load(Ordering::SeqCst), 2);
        assert_eq!(connectable.disposals.load(Ordering::SeqCst), 2);
    }
}
