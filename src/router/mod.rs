//! Effect routing.
//!
//! An [`EffectRouter`] is a [`Transformer`] from effects to events. It
//! multicasts the incoming effect stream to one handler per category, runs
//! every handler concurrently and merges their event streams back into one.
//!
//! # Failure handling
//!
//! - An effect that no category includes ends the merged stream with
//!   [`FlowError::UnknownEffect`]
//! - A handler failure ends the merged stream with that failure
//! - The first failure wins and every other handler stream is dropped at
//!   that point
//!
//! # Backpressure
//!
//! Every branch buffers at most
//! [`branch_capacity`](crate::builder::EffectRouterBuilder::branch_capacity)
//! effects. When a branch is full the router stops reading effects until
//! that handler catches up, so a handler that never reads its input stalls
//! routing once its buffer fills.

mod category;
mod unknown;

pub use category::Categorized;

use crate::core::{FlowError, FlowStream, Transformer};
use futures::stream::{self, select_all};
use futures::{future, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use unknown::UnknownEffects;

/// A handler registered for one effect category.
pub(crate) struct Route<F: Categorized, E> {
    pub(crate) category: F::Category,
    pub(crate) handler: Arc<dyn Transformer<F, E>>,
}

/// Routes effects to per-category handlers and merges their events.
///
/// Build one with [`EffectRouterBuilder`](crate::builder::EffectRouterBuilder).
///
/// # Example
///
/// ```rust
/// use futures::{stream, StreamExt};
/// use mindflow::builder::EffectRouterBuilder;
/// use mindflow::core::Transformer;
/// use mindflow::effect_enum;
///
/// effect_enum! {
///     enum Effect {
///         Greet(String),
///         Count(u32),
///     }
///     category: EffectKind
/// }
///
/// let router = EffectRouterBuilder::<Effect, String>::new()
///     .add_function(EffectKind::Greet, |effect| match effect {
///         Effect::Greet(name) => format!("hello {name}"),
///         other => unreachable!("{other:?}"),
///     })
///     .add_consumer(EffectKind::Count, |_effect| {})
///     .build()
///     .unwrap();
///
/// let effects = stream::iter(vec![Ok(Effect::Count(1)), Ok(Effect::Greet("ann".into()))]);
/// let events = futures::executor::block_on(router.transform(effects.boxed()).collect::<Vec<_>>());
///
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].as_ref().unwrap(), "hello ann");
/// ```
pub struct EffectRouter<F: Categorized, E> {
    routes: Vec<Route<F, E>>,
    branch_capacity: usize,
}

impl<F: Categorized, E> EffectRouter<F, E> {
    pub(crate) fn new(routes: Vec<Route<F, E>>, branch_capacity: usize) -> Self {
        Self {
            routes,
            branch_capacity,
        }
    }

    /// Registered categories, in priority order.
    pub fn categories(&self) -> Vec<F::Category> {
        self.routes.iter().map(|route| route.category).collect()
    }
}

/// Sending side of one multicast branch. `None` receives every effect.
struct Branch<F: Categorized> {
    category: Option<F::Category>,
    tx: mpsc::Sender<Result<F, FlowError>>,
}

impl<F: Categorized> Branch<F> {
    fn wants(&self, effect: &F) -> bool {
        self.category.map_or(true, |category| effect.belongs_to(category))
    }
}

/// Reads `effects` once and forwards every effect to each branch that wants
/// it, waiting for room in full branches. An upstream failure goes to the
/// catch-all branch only, which passes it on as its own failure.
async fn multicast<F: Categorized>(mut effects: FlowStream<F>, branches: Vec<Branch<F>>) {
    while let Some(item) = effects.next().await {
        match item {
            Ok(effect) => {
                tracing::trace!(effect = ?effect, "Routing effect");
                for branch in branches.iter().filter(|branch| branch.wants(&effect)) {
                    // A closed branch belongs to a handler that already ended.
                    let _ = branch.tx.send(Ok(effect.clone())).await;
                }
            }
            Err(error) => {
                if let Some(catch_all) = branches.iter().find(|branch| branch.category.is_none()) {
                    let _ = catch_all.tx.send(Err(error)).await;
                }
                return;
            }
        }
    }
}

fn branch<F: Categorized>(
    category: Option<F::Category>,
    capacity: usize,
) -> (Branch<F>, FlowStream<F>) {
    let (tx, rx) = mpsc::channel(capacity);
    (Branch { category, tx }, ReceiverStream::new(rx).boxed())
}

impl<F, E> Transformer<F, E> for EffectRouter<F, E>
where
    F: Categorized,
    E: Send + 'static,
{
    fn transform(&self, effects: FlowStream<F>) -> FlowStream<E> {
        let mut senders = Vec::with_capacity(self.routes.len() + 1);
        let mut outputs: Vec<FlowStream<E>> = Vec::with_capacity(self.routes.len() + 2);

        for route in &self.routes {
            let (sender, input) = branch(Some(route.category), self.branch_capacity);
            senders.push(sender);
            outputs.push(route.handler.transform(input));
        }

        let (sender, input) = branch(None, self.branch_capacity);
        senders.push(sender);
        outputs.push(UnknownEffects::<F>::new(self.categories()).transform(input));

        // The multicast pump yields nothing; merging it drives it from the
        // consumer's task and drops it together with the merged stream.
        outputs.push(
            stream::once(multicast(effects, senders))
                .filter_map(|()| future::ready(None))
                .boxed(),
        );

        merge_until_failure(outputs)
    }
}

/// Merge `streams` by readiness. The first failure is yielded and then the
/// merged stream ends, dropping every other stream.
fn merge_until_failure<E>(streams: Vec<FlowStream<E>>) -> FlowStream<E>
where
    E: Send + 'static,
{
    stream::unfold(Some(select_all(streams)), |state| async move {
        let mut merged = state?;
        let item = merged.next().await?;
        if let Err(error) = &item {
            tracing::debug!(error = %error, "Effect routing failed");
            return Some((item, None));
        }
        Some((item, Some(merged)))
    })
    .boxed()
}
