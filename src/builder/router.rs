//! Builder for effect routers.

use crate::builder::error::BuildError;
use crate::core::{BoxError, FlowError, FlowStream, Transformer};
use crate::router::{Categorized, EffectRouter, Route};
use futures::{future, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

/// Builder for [`EffectRouter`] with a fluent API.
///
/// Handlers are registered per category. Registering two handlers for the
/// same category is reported by [`build`](Self::build).
///
/// # Example
///
/// ```rust
/// use mindflow::builder::{BuildError, EffectRouterBuilder};
/// use mindflow::effect_enum;
///
/// effect_enum! {
///     enum Effect {
///         Load(u32),
///         Log(String),
///     }
///     category: Kind
/// }
///
/// let result = EffectRouterBuilder::<Effect, ()>::new()
///     .add_consumer(Kind::Log, |_effect| {})
///     .add_consumer(Kind::Log, |_effect| {})
///     .build();
///
/// assert!(matches!(result, Err(BuildError::DuplicateCategory { .. })));
/// ```
pub struct EffectRouterBuilder<F: Categorized, E> {
    routes: Vec<Route<F, E>>,
    branch_capacity: usize,
}

/// Effects buffered per handler before the router waits for it.
pub const DEFAULT_BRANCH_CAPACITY: usize = 32;

impl<F, E> EffectRouterBuilder<F, E>
where
    F: Categorized,
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            branch_capacity: DEFAULT_BRANCH_CAPACITY,
        }
    }

    /// Number of effects buffered for each handler. Must be non-zero.
    pub fn branch_capacity(mut self, capacity: usize) -> Self {
        self.branch_capacity = capacity;
        self
    }

    /// Route `category` to a stream transformation.
    pub fn add_transformer<T>(mut self, category: F::Category, handler: T) -> Self
    where
        T: Transformer<F, E> + 'static,
    {
        self.routes.push(Route {
            category,
            handler: Arc::new(handler),
        });
        self
    }

    /// Route `category` to a side-effecting callback that produces no events.
    pub fn add_consumer<C>(self, category: F::Category, callback: C) -> Self
    where
        C: Fn(F) + Send + Sync + 'static,
    {
        self.add_transformer(
            category,
            ConsumerHandler {
                callback: Arc::new(callback),
            },
        )
    }

    /// Route `category` to a function producing one event per effect.
    pub fn add_function<M>(self, category: F::Category, function: M) -> Self
    where
        M: Fn(F) -> E + Send + Sync + 'static,
    {
        self.add_try_function(category, move |effect| Ok(function(effect)))
    }

    /// Route `category` to a fallible function. The first error ends the
    /// router's output with [`FlowError::Handler`].
    pub fn add_try_function<M>(self, category: F::Category, function: M) -> Self
    where
        M: Fn(F) -> Result<E, BoxError> + Send + Sync + 'static,
    {
        self.add_transformer(
            category,
            FunctionHandler {
                function: Arc::new(function),
            },
        )
    }

    pub fn build(self) -> Result<EffectRouter<F, E>, BuildError> {
        if self.branch_capacity == 0 {
            return Err(BuildError::ZeroCapacity);
        }
        let mut seen = HashSet::with_capacity(self.routes.len());
        for route in &self.routes {
            if !seen.insert(route.category) {
                return Err(BuildError::DuplicateCategory {
                    category: format!("{:?}", route.category),
                });
            }
        }

        tracing::debug!(
            routes = self.routes.len(),
            branch_capacity = self.branch_capacity,
            "Built effect router"
        );
        Ok(EffectRouter::new(self.routes, self.branch_capacity))
    }
}

impl<F, E> Default for EffectRouterBuilder<F, E>
where
    F: Categorized,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

struct ConsumerHandler<C> {
    callback: Arc<C>,
}

impl<F, E, C> Transformer<F, E> for ConsumerHandler<C>
where
    F: Send + 'static,
    E: Send + 'static,
    C: Fn(F) + Send + Sync + 'static,
{
    fn transform(&self, effects: FlowStream<F>) -> FlowStream<E> {
        let callback = Arc::clone(&self.callback);
        effects
            .filter_map(move |item| {
                future::ready(match item {
                    Ok(effect) => {
                        callback(effect);
                        None
                    }
                    Err(error) => Some(Err(error)),
                })
            })
            .boxed()
    }
}

struct FunctionHandler<M> {
    function: Arc<M>,
}

impl<F, E, M> Transformer<F, E> for FunctionHandler<M>
where
    F: Send + 'static,
    E: Send + 'static,
    M: Fn(F) -> Result<E, BoxError> + Send + Sync + 'static,
{
    fn transform(&self, effects: FlowStream<F>) -> FlowStream<E> {
        let function = Arc::clone(&self.function);
        effects
            .map(move |item| item.and_then(|effect| function(effect).map_err(FlowError::Handler)))
            .scan(false, |failed, item| {
                if *failed {
                    return future::ready(None);
                }
                *failed = item.is_err();
                future::ready(Some(item))
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::map_transformer;
    use futures::stream;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    enum Effect {
        Fetch(u32),
        Notify(String),
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Kind {
        Fetch,
        Notify,
    }

    impl Categorized for Effect {
        type Category = Kind;

        fn category(&self) -> Kind {
            match self {
                Self::Fetch(_) => Kind::Fetch,
                Self::Notify(_) => Kind::Notify,
            }
        }
    }

    fn effects(items: Vec<Effect>) -> FlowStream<Effect> {
        stream::iter(items.into_iter().map(Ok)).boxed()
    }

    #[test]
    fn duplicate_category_is_rejected() {
        let result = EffectRouterBuilder::<Effect, u32>::new()
            .add_function(Kind::Fetch, |_| 1)
            .add_transformer(Kind::Fetch, map_transformer(|_: Effect| 2u32))
            .build();

        assert_eq!(
            result.err(),
            Some(BuildError::DuplicateCategory {
                category: "Fetch".to_string()
            })
        );
    }

    #[test]
    fn zero_branch_capacity_is_rejected() {
        let result = EffectRouterBuilder::<Effect, u32>::new()
            .add_function(Kind::Fetch, |_| 1)
            .branch_capacity(0)
            .build();

        assert_eq!(result.err(), Some(BuildError::ZeroCapacity));
    }

    #[test]
    fn categories_keep_registration_order() {
        let router = EffectRouterBuilder::<Effect, u32>::new()
            .add_consumer(Kind::Notify, |_| {})
            .add_function(Kind::Fetch, |_| 0)
            .build()
            .unwrap();

        assert_eq!(router.categories(), vec![Kind::Notify, Kind::Fetch]);
    }

    #[tokio::test]
    async fn consumer_sees_effects_and_emits_nothing() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let router = EffectRouterBuilder::<Effect, u32>::new()
            .add_consumer(Kind::Notify, move |effect| sink.lock().unwrap().push(effect))
            .build()
            .unwrap();

        let output = router
            .transform(effects(vec![
                Effect::Notify("a".into()),
                Effect::Notify("b".into()),
            ]))
            .collect::<Vec<_>>()
            .await;

        assert!(output.is_empty());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Effect::Notify("a".into()), Effect::Notify("b".into())]
        );
    }

    #[tokio::test]
    async fn function_maps_each_effect_to_an_event() {
        let router = EffectRouterBuilder::<Effect, u32>::new()
            .add_function(Kind::Fetch, |effect| match effect {
                Effect::Fetch(id) => id * 10,
                Effect::Notify(_) => 0,
            })
            .build()
            .unwrap();

        let output = router
            .transform(effects(vec![Effect::Fetch(1), Effect::Fetch(2)]))
            .collect::<Vec<_>>()
            .await;

        let events: Vec<u32> = output.into_iter().map(Result::unwrap).collect();
        assert_eq!(events, vec![10, 20]);
    }

    #[tokio::test]
    async fn try_function_error_becomes_handler_failure() {
        let router = EffectRouterBuilder::<Effect, u32>::new()
            .add_try_function(Kind::Fetch, |effect| match effect {
                Effect::Fetch(0) => Err("no such record".into()),
                Effect::Fetch(id) => Ok(id),
                Effect::Notify(_) => Ok(0),
            })
            .build()
            .unwrap();

        let output = router
            .transform(effects(vec![Effect::Fetch(3), Effect::Fetch(0), Effect::Fetch(4)]))
            .collect::<Vec<_>>()
            .await;

        assert_eq!(output.len(), 2);
        assert_eq!(*output[0].as_ref().unwrap(), 3);
        let error = output[1].as_ref().unwrap_err();
        assert!(matches!(error, FlowError::Handler(_)));
        assert_eq!(error.to_string(), "no such record");
    }
}
