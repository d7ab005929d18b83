//! Error types for the Pulse runtime.
//!
//! Most of the reactive core is infallible: a body that panics simply
//! propagates to whoever triggered the run. The variants here cover the
//! two situations the runtime itself refuses to continue from (a runaway
//! update loop and a memo reading itself) plus configuration loading.
//!
//! The runtime-detected variants are raised with [`std::panic::panic_any`]
//! so an error boundary can recover them:
//!
//! ```rust,ignore
//! let payload = std::panic::catch_unwind(|| count.set(1)).unwrap_err();
//! if let Some(err) = payload.downcast_ref::<pulse_core::Error>() {
//!     eprintln!("render aborted: {err}");
//! }
//! ```

use thiserror::Error;

use crate::reactive::SubscriberId;

/// Errors produced by the Pulse runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// A single flush ran more computations than the configured limit.
    ///
    /// This almost always means two effects keep writing each other's
    /// dependencies.
    #[error("update loop ran {runs} computations in one flush (limit {limit})")]
    FlushLimitExceeded { limit: usize, runs: usize },

    /// A memo was read while it was recomputing.
    #[error("memo {id:?} read itself while recomputing")]
    CircularMemo { id: SubscriberId },

    /// The runtime configuration could not be parsed.
    #[error("failed to parse runtime config: {0}")]
    Config(#[from] serde_json::Error),

    /// The runtime configuration parsed but holds an unusable value.
    #[error("invalid runtime config: {0}")]
    InvalidConfig(String),
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Log `err` and unwind with it as the panic payload.
pub(crate) fn raise(err: Error) -> ! {
    tracing::error!(error = %err, "reactive runtime aborted");
    std::panic::panic_any(err)
}
