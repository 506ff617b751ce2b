//! Reference event loop.

use super::next::First;
use super::update::Update;
use crate::core::{Connectable, Connection, Consumer, Disposable, FlowError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use uuid::Uuid;

/// An event loop as a [`Connectable`] from events to models.
///
/// Every connection is an independent loop starting from the same
/// [`First`]. Accepted events run through `update` one at a time in accept
/// order. Each [`Next`](super::Next) carrying a model replaces the current
/// model and emits it to the output; its effects go to a connection of the
/// effect handler, whose events feed back into the same loop.
///
/// The start model itself is not emitted. If the effect handler fails on
/// its own, the loop stops and reports that failure through
/// [`Connectable::connect_observed`], or logs it when connected without an
/// observer.
pub struct EventLoop<M, E, F> {
    update: Arc<dyn Update<M, E, F>>,
    effect_handler: Arc<dyn Connectable<F, E>>,
    first: First<M, F>,
}

impl<M, E, F> EventLoop<M, E, F>
where
    M: Clone + Send + Sync + 'static,
    E: Send + 'static,
    F: Clone + Send + Sync + 'static,
{
    pub fn new<U, H>(update: U, effect_handler: H, start_model: M) -> Self
    where
        U: Update<M, E, F> + 'static,
        H: Connectable<F, E> + 'static,
    {
        Self::with_first(update, effect_handler, First::new(start_model, Vec::new()))
    }

    /// Start every connection from `first`, dispatching its effects on connect.
    pub fn with_first<U, H>(update: U, effect_handler: H, first: First<M, F>) -> Self
    where
        U: Update<M, E, F> + 'static,
        H: Connectable<F, E> + 'static,
    {
        Self {
            update: Arc::new(update),
            effect_handler: Arc::new(effect_handler),
            first,
        }
    }
}

impl<M, E, F> Connectable<E, M> for EventLoop<M, E, F>
where
    M: Clone + Send + Sync + 'static,
    E: Send + 'static,
    F: Clone + Send + Sync + 'static,
{
    fn connect(&self, output: Arc<dyn Consumer<M>>) -> Box<dyn Connection<E>> {
        self.start(output, None)
    }

    fn connect_observed(
        &self,
        output: Arc<dyn Consumer<M>>,
        failure: Arc<dyn Consumer<FlowError>>,
    ) -> Box<dyn Connection<E>> {
        self.start(output, Some(failure))
    }
}

impl<M, E, F> EventLoop<M, E, F>
where
    M: Clone + Send + Sync + 'static,
    E: Send + 'static,
    F: Clone + Send + Sync + 'static,
{
    fn start(
        &self,
        output: Arc<dyn Consumer<M>>,
        failure: Option<Arc<dyn Consumer<FlowError>>>,
    ) -> Box<dyn Connection<E>> {
        let (model, effects) = self.first.clone().into_parts();
        let id = Uuid::new_v4();

        let core = Arc::new_cyclic(|weak: &Weak<LoopCore<M, E, F>>| {
            let feedback = Feedback { core: weak.clone() };
            let effect_failure = EffectFailure { core: weak.clone() };
            LoopCore {
                id,
                update: Arc::clone(&self.update),
                output,
                failure,
                effects: self
                    .effect_handler
                    .connect_observed(Arc::new(feedback), Arc::new(effect_failure)),
                model: Mutex::new(model),
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
            }
        });
        tracing::debug!(loop_id = %id, start_effects = effects.len(), "Event loop connected");

        for effect in effects {
            core.effects.accept(effect);
        }

        Box::new(LoopConnection { core })
    }
}

struct LoopCore<M, E, F> {
    id: Uuid,
    update: Arc<dyn Update<M, E, F>>,
    output: Arc<dyn Consumer<M>>,
    failure: Option<Arc<dyn Consumer<FlowError>>>,
    effects: Box<dyn Connection<F>>,
    model: Mutex<M>,
    queue: Mutex<VecDeque<E>>,
    draining: AtomicBool,
    disposed: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<M, E, F> LoopCore<M, E, F>
where
    M: Clone,
{
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn enqueue(&self, event: E) {
        if self.is_disposed() {
            return;
        }
        lock(&self.queue).push_back(event);
        self.drain();
    }

    /// Process queued events until the queue is empty. Re-entrant and
    /// concurrent callers leave their event to whoever is draining.
    fn drain(&self) {
        loop {
            if self.draining.swap(true, Ordering::AcqRel) {
                return;
            }

            loop {
                let event = lock(&self.queue).pop_front();
                match event {
                    Some(event) if !self.is_disposed() => self.step(event),
                    _ => break,
                }
            }

            self.draining.store(false, Ordering::Release);
            if self.is_disposed() || lock(&self.queue).is_empty() {
                return;
            }
        }
    }

    fn step(&self, event: E) {
        let next = {
            let model = lock(&self.model);
            self.update.update(&model, event)
        };
        let (model, effects) = next.into_parts();

        if let Some(model) = model {
            *lock(&self.model) = model.clone();
            tracing::trace!(loop_id = %self.id, "Model changed");
            self.output.accept(model);
        }
        for effect in effects {
            self.effects.accept(effect);
        }
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        lock(&self.queue).clear();
        self.effects.dispose();
        tracing::debug!(loop_id = %self.id, "Event loop disposed");
    }

    /// Stop the loop after its effect handler failed.
    fn fail(&self, error: FlowError) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::error!(loop_id = %self.id, error = %error, "Effect handler failed, stopping loop");
        lock(&self.queue).clear();
        self.effects.dispose();
        if let Some(failure) = &self.failure {
            failure.accept(error);
        }
    }
}

/// Routes events from the effect handler back into the loop.
struct Feedback<M, E, F> {
    core: Weak<LoopCore<M, E, F>>,
}

impl<M, E, F> Consumer<E> for Feedback<M, E, F>
where
    M: Clone + Send + Sync,
    E: Send,
    F: Send + Sync,
{
    fn accept(&self, event: E) {
        match self.core.upgrade() {
            Some(core) => core.enqueue(event),
            None => tracing::trace!("Dropping event for a finished loop"),
        }
    }
}

/// Stops the loop when its effect handler connection fails.
struct EffectFailure<M, E, F> {
    core: Weak<LoopCore<M, E, F>>,
}

impl<M, E, F> Consumer<FlowError> for EffectFailure<M, E, F>
where
    M: Clone + Send + Sync,
    E: Send,
    F: Send + Sync,
{
    fn accept(&self, error: FlowError) {
        match self.core.upgrade() {
            Some(core) => core.fail(error),
            None => tracing::trace!(error = %error, "Dropping failure for a finished loop"),
        }
    }
}

struct LoopConnection<M, E, F> {
    core: Arc<LoopCore<M, E, F>>,
}

impl<M, E, F> Consumer<E> for LoopConnection<M, E, F>
where
    M: Clone + Send + Sync,
    E: Send,
    F: Send + Sync,
{
    fn accept(&self, event: E) {
        self.core.enqueue(event);
    }
}

impl<M, E, F> Disposable for LoopConnection<M, E, F>
where
    M: Clone + Send + Sync,
    E: Send,
    F: Send + Sync,
{
    fn dispose(&self) {
        self.core.dispose();
    }
}
