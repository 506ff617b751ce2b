//! Stream abstraction and stream transformations.
//!
//! A [`FlowStream`] yields `Ok` values until it ends. An `Err` item is a
//! terminal failure: producers stop after yielding one and consumers stop
//! reading after receiving one. Dropping a stream cancels it.

use super::error::FlowError;
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;

/// Lazily-produced, possibly infinite sequence of values.
pub type FlowStream<T> = BoxStream<'static, Result<T, FlowError>>;

/// Function from an input stream to an output stream.
///
/// Each call to `transform` is an independent execution.
pub trait Transformer<I, O>: Send + Sync {
    fn transform(&self, input: FlowStream<I>) -> FlowStream<O>;
}

impl<I, O, T> Transformer<I, O> for Arc<T>
where
    T: Transformer<I, O> + ?Sized,
{
    fn transform(&self, input: FlowStream<I>) -> FlowStream<O> {
        (**self).transform(input)
    }
}

impl<I, O, T> Transformer<I, O> for Box<T>
where
    T: Transformer<I, O> + ?Sized,
{
    fn transform(&self, input: FlowStream<I>) -> FlowStream<O> {
        (**self).transform(input)
    }
}

/// Transformer backed by a closure.
pub struct FnTransformer<F> {
    f: F,
}

impl<I, O, F> Transformer<I, O> for FnTransformer<F>
where
    F: Fn(FlowStream<I>) -> FlowStream<O> + Send + Sync,
{
    fn transform(&self, input: FlowStream<I>) -> FlowStream<O> {
        (self.f)(input)
    }
}

/// Create a transformer from a closure over whole streams.
///
/// # Example
///
/// ```rust
/// use futures::StreamExt;
/// use mindflow::core::{transformer, FlowStream, Transformer};
///
/// let doubled = transformer(|input: FlowStream<i32>| {
///     input.map(|item| item.map(|n| n * 2)).boxed()
/// });
///
/// let output = doubled.transform(futures::stream::iter(vec![Ok(1), Ok(2)]).boxed());
/// let values: Vec<i32> = futures::executor::block_on(output.collect::<Vec<_>>())
///     .into_iter()
///     .map(Result::unwrap)
///     .collect();
/// assert_eq!(values, vec![2, 4]);
/// ```
pub fn transformer<I, O, F>(f: F) -> FnTransformer<F>
where
    F: Fn(FlowStream<I>) -> FlowStream<O> + Send + Sync,
{
    FnTransformer { f }
}

/// Create a transformer that maps every value with `f`.
///
/// Failures pass through unchanged.
pub fn map_transformer<I, O, F>(
    f: F,
) -> FnTransformer<impl Fn(FlowStream<I>) -> FlowStream<O> + Send + Sync>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> O + Clone + Send + Sync + 'static,
{
    transformer(move |input: FlowStream<I>| {
        let f = f.clone();
        input.map(move |item| item.map(&f)).boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn values<T>(items: Vec<Result<T, FlowError>>) -> Vec<T> {
        items.into_iter().map(|item| item.unwrap()).collect()
    }

    #[tokio::test]
    async fn fn_transformer_applies_closure() {
        let upper = transformer(|input: FlowStream<String>| {
            input.map(|item| item.map(|s| s.to_uppercase())).boxed()
        });

        let output = upper
            .transform(stream::iter(vec![Ok("a".to_string()), Ok("b".to_string())]).boxed())
            .collect::<Vec<_>>()
            .await;

        assert_eq!(values(output), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn map_transformer_passes_failures_through() {
        let plus_one = map_transformer(|n: i32| n + 1);

        let output = plus_one
            .transform(stream::iter(vec![Ok(1), Err(FlowError::handler("stop"))]).boxed())
            .collect::<Vec<_>>()
            .await;

        assert_eq!(output.len(), 2);
        assert_eq!(*output[0].as_ref().unwrap(), 2);
        assert_eq!(output[1].as_ref().unwrap_err().to_string(), "stop");
    }

    #[tokio::test]
    async fn arc_transformer_delegates() {
        let shared: Arc<dyn Transformer<i32, i32>> = Arc::new(map_transformer(|n: i32| n * 10));

        let output = shared
            .transform(stream::iter(vec![Ok(3)]).boxed())
            .collect::<Vec<_>>()
            .await;

        assert_eq!(values(output), vec![30]);
    }
}
