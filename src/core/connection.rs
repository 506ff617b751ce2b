//! Push-based connection abstraction.
//!
//! A [`Connectable`] is a connection factory. Connecting it with an output
//! [`Consumer`] yields a [`Connection`] that accepts inputs one at a time
//! until it is disposed.

use super::error::FlowError;
use std::sync::Arc;

/// Capability that accepts one value at a time.
///
/// Implementations are shared between the party that owns the value
/// producer and the party that delivers values, so `accept` takes `&self`.
pub trait Consumer<T>: Send + Sync {
    fn accept(&self, value: T);
}

/// A resource that can be torn down.
///
/// `dispose` must never panic. Calling it more than once should have the
/// same effect as calling it once.
pub trait Disposable: Send + Sync {
    fn dispose(&self);
}

/// A live connection bound to an output consumer at construction time.
///
/// After `dispose` returns, no further output is delivered to the bound
/// consumer and `accept` has no observable effect.
pub trait Connection<I>: Consumer<I> + Disposable {}

impl<I, C> Connection<I> for C where C: Consumer<I> + Disposable + ?Sized {}

/// Factory for connections.
///
/// Each call to `connect` creates an independent connection that delivers
/// its outputs to `output`.
pub trait Connectable<I, O>: Send + Sync {
    fn connect(&self, output: Arc<dyn Consumer<O>>) -> Box<dyn Connection<I>>;

    /// Like [`connect`](Connectable::connect), but a connection that fails
    /// on its own reports the failure to `failure` and stops emitting.
    ///
    /// At most one failure is reported per connection, and none once it has
    /// been disposed. The default implementation never fails, so `failure`
    /// is unused.
    fn connect_observed(
        &self,
        output: Arc<dyn Consumer<O>>,
        failure: Arc<dyn Consumer<FlowError>>,
    ) -> Box<dyn Connection<I>> {
        drop(failure);
        self.connect(output)
    }
}

impl<T, C> Consumer<T> for Arc<C>
where
    C: Consumer<T> + ?Sized,
{
    fn accept(&self, value: T) {
        (**self).accept(value);
    }
}

impl<C> Disposable for Arc<C>
where
    C: Disposable + ?Sized,
{
    fn dispose(&self) {
        (**self).dispose();
    }
}

impl<T, C> Consumer<T> for Box<C>
where
    C: Consumer<T> + ?Sized,
{
    fn accept(&self, value: T) {
        (**self).accept(value);
    }
}

impl<C> Disposable for Box<C>
where
    C: Disposable + ?Sized,
{
    fn dispose(&self) {
        (**self).dispose();
    }
}

/// Consumer backed by a closure.
pub struct FnConsumer<F> {
    f: F,
}

impl<T, F> Consumer<T> for FnConsumer<F>
where
    F: Fn(T) + Send + Sync,
{
    fn accept(&self, value: T) {
        (self.f)(value);
    }
}

/// Create a consumer from a closure.
///
/// # Example
///
/// ```rust
/// use mindflow::core::{consumer, Consumer};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let total = Arc::new(AtomicUsize::new(0));
/// let sink = {
///     let total = Arc::clone(&total);
///     consumer(move |n: usize| {
///         total.fetch_add(n, Ordering::SeqCst);
///     })
/// };
///
/// sink.accept(2);
/// sink.accept(3);
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// ```
pub fn consumer<T, F>(f: F) -> FnConsumer<F>
where
    F: Fn(T) + Send + Sync,
{
    FnConsumer { f }
}

/// Disposes a fixed set of disposables together.
pub struct CompositeDisposable {
    members: Vec<Arc<dyn Disposable>>,
}

impl CompositeDisposable {
    pub fn new(members: Vec<Arc<dyn Disposable>>) -> Self {
        Self { members }
    }
}

impl Disposable for CompositeDisposable {
    fn dispose(&self) {
        for member in &self.members {
            member.dispose();
        }
    }
}
