//! Property-based tests for connections and bridges.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use futures::{stream, StreamExt};
use mindflow::bridge::{ChannelCapacity, StreamConnectable};
use mindflow::builder::BridgeBuilder;
use mindflow::core::{
    consumer, map_transformer, Connectable, Connection, Consumer, Disposable, FlowError,
};
use mindflow::dispose::DiscardAfterDispose;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::runtime::Runtime;

struct CountingConnection {
    disposals: Arc<AtomicUsize>,
}

impl Consumer<i32> for CountingConnection {
    fn accept(&self, _value: i32) {}
}

impl Disposable for CountingConnection {
    fn dispose(&self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

fn collecting() -> (Arc<Mutex<Vec<i32>>>, Arc<dyn Consumer<i32>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let output: Arc<dyn Consumer<i32>> = Arc::new(consumer(move |value: i32| {
        sink.lock().unwrap().push(value);
    }));
    (seen, output)
}

prop_compose! {
    fn arbitrary_capacity()(bounded in any::<bool>(), capacity in 1..64usize) -> ChannelCapacity {
        if bounded {
            ChannelCapacity::Bounded {
                capacity,
                backpressure: Default::default(),
            }
        } else {
            ChannelCapacity::Unbounded
        }
    }
}

proptest! {
    #[test]
    fn dispose_is_idempotent(calls in 1..16usize) {
        let disposals = Arc::new(AtomicUsize::new(0));
        let connection: Arc<dyn Connection<i32>> = Arc::new(CountingConnection {
            disposals: Arc::clone(&disposals),
        });
        let wrapper = DiscardAfterDispose::wrap_connection(connection);

        for _ in 0..calls {
            wrapper.dispose();
        }

        prop_assert_eq!(disposals.load(Ordering::SeqCst), 1);
        prop_assert!(wrapper.is_disposed());
    }

    #[test]
    fn nothing_is_delivered_after_dispose(
        before in prop::collection::vec(any::<i32>(), 0..32),
        after in prop::collection::vec(any::<i32>(), 0..32),
    ) {
        let (seen, output) = collecting();
        let wrapper = DiscardAfterDispose::wrap_consumer(output);

        for value in &before {
            wrapper.accept(*value);
        }
        wrapper.dispose();
        for value in &after {
            wrapper.accept(*value);
        }

        prop_assert_eq!(&*seen.lock().unwrap(), &before);
    }

    #[test]
    fn concurrent_accept_and_dispose_deliver_a_prefix(
        values in prop::collection::vec(any::<i32>(), 1..64),
    ) {
        let (seen, output) = collecting();
        let wrapper = Arc::new(DiscardAfterDispose::wrap_consumer(output));

        let producer = {
            let wrapper = Arc::clone(&wrapper);
            let values = values.clone();
            thread::spawn(move || {
                for value in values {
                    wrapper.accept(value);
                }
            })
        };
        wrapper.dispose();
        producer.join().unwrap();
        wrapper.accept(0);

        let delivered = seen.lock().unwrap().clone();
        prop_assert!(delivered.len() <= values.len());
        prop_assert_eq!(&delivered[..], &values[..delivered.len()]);
    }

    #[test]
    fn stream_connection_preserves_order(
        values in prop::collection::vec(any::<i32>(), 0..64),
        capacity in arbitrary_capacity(),
    ) {
        let runtime = Runtime::new().unwrap();
        let connectable: StreamConnectable<i32, i32> = BridgeBuilder::new()
            .handle(runtime.handle().clone())
            .capacity(capacity)
            .stream_connectable(map_transformer(|n: i32| n.wrapping_mul(3)))
            .unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let received = runtime.block_on(async {
            let connection = connectable.connect(Arc::new(consumer(move |n: i32| {
                let _ = tx.send(n);
            })));
            let mut received = Vec::with_capacity(values.len());
            for value in &values {
                connection.accept(*value);
                received.push(rx.recv().await);
            }
            connection.dispose();
            received
        });

        let expected: Vec<Option<i32>> = values.iter().map(|n| Some(n.wrapping_mul(3))).collect();
        prop_assert_eq!(received, expected);
    }

    #[test]
    fn connectable_stream_preserves_order(values in prop::collection::vec(any::<i32>(), 0..64)) {
        let runtime = Runtime::new().unwrap();
        let handle = runtime.handle().clone();

        let output = runtime.block_on(async move {
            let inner: StreamConnectable<i32, i32> = BridgeBuilder::new()
                .handle(handle.clone())
                .stream_connectable(map_transformer(|n: i32| n))
                .unwrap();
            let transformer = BridgeBuilder::new()
                .handle(handle)
                .connectable_stream::<i32, i32, _>(inner)
                .unwrap();
            let count = values.len();
            let input = stream::iter(values.clone().into_iter().map(Ok))
                .chain(stream::pending())
                .boxed();
            let output: Vec<Result<i32, FlowError>> =
                transformer.apply(input).take(count).collect().await;
            (values, output)
        });

        let (values, output) = output;
        let output: Vec<i32> = output.into_iter().map(Result::unwrap).collect();
        prop_assert_eq!(output, values);
    }
}
