//! Mindflow: stream bridges for event-driven state-machine loops
//!
//! Mindflow connects two ways of wiring a loop together. A *connection* is
//! a push-based object: values go in through `accept`, results come out
//! through a bound consumer, and `dispose` ends it. A *stream
//! transformation* is pull-based: a function from one stream to another.
//! The bridges convert between the two so a pure update function, its
//! effect handlers and the surrounding async code can be composed freely.
//!
//! # Core Concepts
//!
//! - **Connections**: `Consumer`, `Disposable`, `Connection` and
//!   `Connectable` in [`core`]
//! - **Dispose safety**: wrappers that silence a connection once disposed,
//!   in [`dispose`]
//! - **Bridges**: `StreamConnectable` and `ConnectableStream` in [`bridge`]
//! - **Effect routing**: per-category effect handlers merged into one event
//!   stream, in [`router`]
//! - **Loops**: the pure `Update` function and the `EventLoop` driver, in
//!   [`machine`]
//!
//! # Example
//!
//! ```rust
//! use futures::{stream, StreamExt};
//! use mindflow::builder::EffectRouterBuilder;
//! use mindflow::effect_enum;
//! use mindflow::machine::{dispatch, event_loop, loop_from, next, Next};
//!
//! effect_enum! {
//!     enum Effect {
//!         Lookup(String),
//!     }
//!     category: EffectKind
//! }
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Event {
//!     Search(String),
//!     Found(usize),
//! }
//!
//! fn update(hits: &usize, event: Event) -> Next<usize, Effect> {
//!     match event {
//!         Event::Search(term) => dispatch([Effect::Lookup(term)]),
//!         Event::Found(count) => next(hits + count, []),
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let router = EffectRouterBuilder::<Effect, Event>::new()
//!     .add_function(EffectKind::Lookup, |Effect::Lookup(term)| Event::Found(term.len()))
//!     .build()
//!     .unwrap();
//!
//! let search = loop_from(event_loop(update, router, 0).unwrap()).unwrap();
//! let events = stream::iter(vec![Ok(Event::Search("rust".into()))]).chain(stream::pending());
//!
//! let hits = search.apply(events.boxed()).next().await.unwrap().unwrap();
//! assert_eq!(hits, 4);
//! # });
//! ```

pub mod bridge;
pub mod builder;
pub mod core;
pub mod dispose;
pub mod machine;
pub mod router;

// Re-export commonly used types
pub use bridge::{ConnectableStream, StreamConnectable};
pub use crate::core::{
    Connectable, Connection, Consumer, Disposable, FlowError, FlowStream, Transformer,
};
pub use machine::{EventLoop, Next, Update};
pub use router::{Categorized, EffectRouter};
