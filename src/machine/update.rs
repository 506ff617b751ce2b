//! Pure state-transition functions.

use super::next::Next;

/// Pure function from the current model and an event to a [`Next`].
///
/// Implemented for every `Fn(&M, E) -> Next<M, F>` closure.
pub trait Update<M, E, F>: Send + Sync {
    fn update(&self, model: &M, event: E) -> Next<M, F>;
}

impl<M, E, F, U> Update<M, E, F> for U
where
    U: Fn(&M, E) -> Next<M, F> + Send + Sync,
{
    fn update(&self, model: &M, event: E) -> Next<M, F> {
        self(model, event)
    }
}
