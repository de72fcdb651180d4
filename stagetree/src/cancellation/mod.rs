//! Cooperative cancellation for tree traversal.
//!
//! A [`CancellationToken`] can be cloned into a signal handler or another
//! thread; the executor checks it before visiting each node and treats a
//! cancelled token exactly like an interrupt raised by a stage handler.

mod token;

pub use token::CancellationToken;
