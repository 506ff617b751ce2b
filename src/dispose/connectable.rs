//! Connectable wrapper that guards both sides of every connection.

use super::wrapper::DiscardAfterDispose;
use crate::core::{
    CompositeDisposable, Connectable, Connection, Consumer, Disposable, FlowError,
};
use std::sync::Arc;

/// A [`Connectable`] ensuring that connections created by the wrapped
/// connectable neither receive nor emit values after being disposed.
///
/// This is a safeguard only. The wrapped connectable is still responsible
/// for releasing its own resources on dispose.
pub struct DiscardAfterDisposeConnectable<I, O> {
    actual: Arc<dyn Connectable<I, O>>,
}

impl<I, O> DiscardAfterDisposeConnectable<I, O> {
    pub fn new(actual: Arc<dyn Connectable<I, O>>) -> Self {
        Self { actual }
    }
}

impl<I, O> Connectable<I, O> for DiscardAfterDisposeConnectable<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn connect(&self, output: Arc<dyn Consumer<O>>) -> Box<dyn Connection<I>> {
        self.guard(output, None)
    }

    fn connect_observed(
        &self,
        output: Arc<dyn Consumer<O>>,
        failure: Arc<dyn Consumer<FlowError>>,
    ) -> Box<dyn Connection<I>> {
        self.guard(output, Some(failure))
    }
}

impl<I, O> DiscardAfterDisposeConnectable<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn guard(
        &self,
        output: Arc<dyn Consumer<O>>,
        failure: Option<Arc<dyn Consumer<FlowError>>>,
    ) -> Box<dyn Connection<I>> {
        let safe_output = Arc::new(DiscardAfterDispose::wrap_consumer(output));
        let mut members: Vec<Arc<dyn Disposable>> = Vec::with_capacity(3);
        let connection = match failure {
            Some(failure) => {
                let safe_failure = Arc::new(DiscardAfterDispose::wrap_consumer(failure));
                members.push(Arc::clone(&safe_failure) as Arc<dyn Disposable>);
                self.actual.connect_observed(
                    Arc::clone(&safe_output) as Arc<dyn Consumer<O>>,
                    safe_failure,
                )
            }
            None => self
                .actual
                .connect(Arc::clone(&safe_output) as Arc<dyn Consumer<O>>),
        };
        let safe_input = Arc::new(DiscardAfterDispose::wrap_connection(Arc::from(connection)));
        members.insert(0, Arc::clone(&safe_input) as Arc<dyn Disposable>);
        members.push(safe_output);

        Box::new(SafeConnection {
            input: safe_input,
            disposable: CompositeDisposable::new(members),
        })
    }
}

struct SafeConnection<I> {
    input: Arc<DiscardAfterDispose<I>>,
    disposable: CompositeDisposable,
}

impl<I> Consumer<I> for SafeConnection<I> {
    fn accept(&self, value: I) {
        self.input.accept(value);
    }
}

impl<I> Disposable for SafeConnection<I> {
    fn dispose(&self) {
        self.disposable.dispose();
    }
}
