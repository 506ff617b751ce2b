//! Closed effect categories.

use std::fmt::Debug;
use std::hash::Hash;

/// An effect type whose values belong to a closed set of categories.
///
/// Category membership is a pure function of the value. Implement it by
/// hand, or derive it for a plain enum with [`effect_enum!`](crate::effect_enum).
///
/// # Example
///
/// ```rust
/// use mindflow::router::Categorized;
///
/// #[derive(Clone, Debug)]
/// enum Effect {
///     Load(u32),
///     Save(String),
/// }
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum Kind {
///     Load,
///     Save,
/// }
///
/// impl Categorized for Effect {
///     type Category = Kind;
///
///     fn category(&self) -> Kind {
///         match self {
///             Self::Load(_) => Kind::Load,
///             Self::Save(_) => Kind::Save,
///         }
///     }
/// }
///
/// assert!(Effect::Load(1).belongs_to(Kind::Load));
/// assert!(!Effect::Load(1).belongs_to(Kind::Save));
/// ```
pub trait Categorized: Clone + Debug + Send + Sync + 'static {
    type Category: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// The category this value is tagged with.
    fn category(&self) -> Self::Category;

    /// Whether `category` includes this value.
    ///
    /// Defaults to tag equality. Override it when categories overlap; a
    /// value included by several categories is routed to each of them.
    fn belongs_to(&self, category: Self::Category) -> bool {
        self.category() == category
    }
}
