//! Values returned by update and init functions.

/// Outcome of handling one event: an optional new model and the effects to
/// dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct Next<M, F> {
    model: Option<M>,
    effects: Vec<F>,
}

impl<M, F> Next<M, F> {
    pub fn new(model: Option<M>, effects: Vec<F>) -> Self {
        Self { model, effects }
    }

    /// The new model, if the event changed it.
    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    pub fn effects(&self) -> &[F] {
        &self.effects
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    pub fn into_parts(self) -> (Option<M>, Vec<F>) {
        (self.model, self.effects)
    }
}

/// Initial model of a loop plus the effects to dispatch when it starts.
#[derive(Clone, Debug, PartialEq)]
pub struct First<M, F> {
    model: M,
    effects: Vec<F>,
}

impl<M, F> First<M, F> {
    pub fn new(model: M, effects: Vec<F>) -> Self {
        Self { model, effects }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn effects(&self) -> &[F] {
        &self.effects
    }

    pub fn into_parts(self) -> (M, Vec<F>) {
        (self.model, self.effects)
    }
}

/// Change the model and dispatch `effects`.
///
/// # Example
///
/// ```rust
/// use mindflow::machine::{dispatch, next, no_change, Next};
///
/// let changed: Next<u32, &str> = next(2, ["save"]);
/// assert_eq!(changed.model(), Some(&2));
///
/// let effects_only: Next<u32, &str> = dispatch(["log"]);
/// assert!(!effects_only.has_model());
///
/// let idle: Next<u32, &str> = no_change();
/// assert!(!idle.has_model() && !idle.has_effects());
/// ```
pub fn next<M, F>(model: M, effects: impl IntoIterator<Item = F>) -> Next<M, F> {
    Next::new(Some(model), effects.into_iter().collect())
}

/// Keep the model and dispatch `effects`.
pub fn dispatch<M, F>(effects: impl IntoIterator<Item = F>) -> Next<M, F> {
    Next::new(None, effects.into_iter().collect())
}

pub fn no_change<M, F>() -> Next<M, F> {
    Next::new(None, Vec::new())
}

/// Start from `model` and dispatch `effects` on connect.
pub fn first<M, F>(model: M, effects: impl IntoIterator<Item = F>) -> First<M, F> {
    First::new(model, effects.into_iter().collect())
}
