//! Macros for ergonomic effect declarations.

/// Declare an effect enum together with its category enum.
///
/// Generates the effect enum (deriving `Clone` and `Debug`), a fieldless
/// category enum with one variant per effect variant, and the
/// [`Categorized`](crate::router::Categorized) implementation tying them
/// together.
///
/// # Example
///
/// ```
/// use mindflow::effect_enum;
/// use mindflow::router::Categorized;
///
/// effect_enum! {
///     pub enum DownloadEffect {
///         Fetch(String),
///         Retry(String, u32),
///         Cancel,
///     }
///     category: DownloadKind
/// }
///
/// let effect = DownloadEffect::Retry("a.txt".into(), 2);
/// assert_eq!(effect.category(), DownloadKind::Retry);
/// assert!(DownloadEffect::Cancel.belongs_to(DownloadKind::Cancel));
/// ```
#[macro_export]
macro_rules! effect_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( ( $($field:ty),* $(,)? ) )?
            ),* $(,)?
        }

        category: $category:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $( ( $($field),* ) )?
            ),*
        }

        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $category {
            $($variant),*
        }

        impl $crate::router::Categorized for $name {
            type Category = $category;

            fn category(&self) -> $category {
                match self {
                    $(Self::$variant { .. } => $category::$variant),*
                }
            }
        }
    };
}
