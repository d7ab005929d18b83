//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, memos, and
//! effects, plus the batching, cleanup and ownership rules that tie them
//! together.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a running computation (such as a memo or effect), the signal is
//! recorded as a dependency of that computation. When the signal's value
//! changes, all dependents are notified.
//!
//! ## Memos
//!
//! A Memo is a derived value that caches its result. It re-evaluates only
//! when one of its dependencies changes, and only once it is read again.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change. Effects are used to synchronize reactive state with
//! external systems, such as updating a render tree or logging.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to automatically
//! detect dependencies. When a signal is read, we check if there is a
//! running computation and, if so, record the read against it. Dependencies
//! are rebuilt on every run, so a computation is only ever subscribed to the
//! sources it read last time.
//!
//! Everything here is single-threaded: handles are `Rc`-based and each
//! thread owns an independent runtime.

mod batch;
mod context;
mod effect;
mod memo;
mod node;
mod runtime;
mod scope;
mod signal;
mod subscriber;

pub use batch::batch;
pub use context::untrack;
pub use effect::{effect, Effect};
pub use memo::{computed, Memo, MemoState};
pub use runtime::{config, configure, reset_context, Runtime};
pub use scope::{on_cleanup, Scope};
pub use signal::{pulse, pulse_eq, pulse_with, Signal};
pub use subscriber::{SourceId, SubscriberId};

pub(crate) use context::ReactiveContext;

/// The read half shared by [`Signal`] and [`Memo`].
///
/// Bindings that only need to observe a value can accept `impl Read<T>`
/// and work with either.
pub trait Read<T> {
    /// Current value, tracked by the running computation.
    fn get(&self) -> T;

    /// Current value, never tracked.
    fn peek(&self) -> T;

    /// Borrow the current value, tracked by the running computation.
    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R;
}
