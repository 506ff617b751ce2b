//! Dispose-safety for connections.
//!
//! Every value crossing a bridge boundary passes through a
//! [`DiscardAfterDispose`] wrapper, so nothing flows once a connection has
//! been torn down, even when `accept` and `dispose` race on different
//! threads.

mod connectable;
mod wrapper;

pub use connectable::DiscardAfterDisposeConnectable;
pub use wrapper::DiscardAfterDispose;
