//! Consumer wrapper that drops values once disposed.

use crate::core::{Connection, Consumer, Disposable};
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

thread_local! {
    /// Addresses of the wrappers currently delivering a value on this thread.
    static DELIVERING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

enum Target<T> {
    Consumer(Arc<dyn Consumer<T>>),
    Connection(Arc<dyn Connection<T>>),
}

/// Wraps a consumer, or a whole connection, and blocks every value accepted
/// after the wrapper has been disposed.
///
/// `dispose` waits for deliveries already in progress on other threads
/// before it returns, so once it has returned the wrapped consumer sees no
/// further value. A delivery that disposes its own wrapper is not waited
/// for.
pub struct DiscardAfterDispose<T> {
    target: Target<T>,
    disposed: AtomicBool,
    in_flight: AtomicUsize,
}

impl<T> DiscardAfterDispose<T> {
    /// Guard a consumer. Disposing the wrapper only stops delivery.
    pub fn wrap_consumer(consumer: Arc<dyn Consumer<T>>) -> Self {
        Self::guarding(Target::Consumer(consumer))
    }

    /// Guard a connection. Disposing the wrapper also disposes the
    /// connection, exactly once.
    pub fn wrap_connection(connection: Arc<dyn Connection<T>>) -> Self {
        Self::guarding(Target::Connection(connection))
    }

    fn guarding(target: Target<T>) -> Self {
        Self {
            target,
            disposed: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn address(&self) -> usize {
        self as *const Self as *const () as usize
    }

    fn wait_for_deliveries(&self) {
        let address = self.address();
        let own = DELIVERING
            .try_with(|active| active.borrow().iter().filter(|&&a| a == address).count())
            .unwrap_or(0);
        let mut spins = 0u32;
        while self.in_flight.load(Ordering::SeqCst) > own {
            if spins < 64 {
                spins += 1;
                std::hint::spin_loop();
            } else {
                std::thread::yield_now();
            }
        }
    }
}

/// Marks one delivery through a wrapper as in progress until dropped.
struct Delivery<'a> {
    in_flight: &'a AtomicUsize,
    address: usize,
}

impl<'a> Delivery<'a> {
    fn enter(in_flight: &'a AtomicUsize, address: usize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        let _ = DELIVERING.try_with(|active| active.borrow_mut().push(address));
        Self { in_flight, address }
    }
}

impl Drop for Delivery<'_> {
    fn drop(&mut self) {
        let _ = DELIVERING.try_with(|active| {
            let mut active = active.borrow_mut();
            if let Some(position) = active.iter().rposition(|&a| a == self.address) {
                active.remove(position);
            }
        });
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<T> Consumer<T> for DiscardAfterDispose<T> {
    fn accept(&self, value: T) {
        let _delivery = Delivery::enter(&self.in_flight, self.address());
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        match &self.target {
            Target::Consumer(consumer) => consumer.accept(value),
            Target::Connection(connection) => connection.accept(value),
        }
    }
}

impl<T> Disposable for DiscardAfterDispose<T> {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.wait_for_deliveries();
        if let Target::Connection(connection) = &self.target {
            connection.dispose();
        }
    }
}
