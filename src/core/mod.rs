//! Core bridge abstractions.
//!
//! This module contains the two concurrency abstractions the rest of the
//! crate converts between:
//! - Push-based connections via `Connectable`, `Connection` and `Consumer`
//! - Asynchronous streams via `FlowStream` and `Transformer`
//!
//! It also defines `FlowError`, the terminal failure classification shared
//! by every bridged stream.

mod connection;
mod error;
mod stream;

pub use connection::{
    consumer, CompositeDisposable, Connectable, Connection, Consumer, Disposable, FnConsumer,
};
pub use error::{BoxError, FlowError, UnknownEffect};
pub use stream::{map_transformer, transformer, FlowStream, FnTransformer, Transformer};
