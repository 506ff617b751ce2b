//! Synthetic handler for effects no category includes.

use super::category::Categorized;
use crate::core::{FlowError, FlowStream, Transformer};
use futures::{future, StreamExt};
use std::sync::Arc;

/// Fails with [`FlowError::UnknownEffect`] on the first effect that none of
/// `categories` includes. Upstream failures pass through.
pub(crate) struct UnknownEffects<F: Categorized> {
    categories: Arc<[F::Category]>,
}

impl<F: Categorized> UnknownEffects<F> {
    pub(crate) fn new(categories: Vec<F::Category>) -> Self {
        Self {
            categories: categories.into(),
        }
    }
}

impl<F, E> Transformer<F, E> for UnknownEffects<F>
where
    F: Categorized,
    E: Send + 'static,
{
    fn transform(&self, effects: FlowStream<F>) -> FlowStream<E> {
        let categories = Arc::clone(&self.categories);
        effects
            .filter_map(move |item| {
                future::ready(match item {
                    Ok(effect) if categories.iter().any(|c| effect.belongs_to(*c)) => None,
                    Ok(effect) => {
                        tracing::error!(effect = ?effect, "No handler registered for effect");
                        Some(Err(FlowError::unknown_effect(effect)))
                    }
                    Err(error) => Some(Err(error)),
                })
            })
            .boxed()
    }
}
