//! Reactive Runtime
//!
//! The runtime is the per-thread coordinator behind signals, memos and
//! effects. It owns:
//!
//! - the pending queue of effects waiting to re-run;
//! - the batch depth, which defers flushing while writes are coalesced;
//! - the root set, which keeps effects created outside any owner alive
//!   until they are disposed;
//! - the thread's [`RuntimeConfig`].
//!
//! # Flushing
//!
//! A write notifies subscribers, which queue themselves here, and then asks
//! for a flush. The flush is skipped while a batch is open or another flush
//! is already draining the queue; otherwise it runs queued computations in
//! first-scheduled order until the queue is empty. Writes made by effects
//! during the flush enqueue more work for the same loop.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::context::ReactiveContext;
use super::subscriber::{Computation, SubscriberId};
use crate::config::RuntimeConfig;
use crate::error::{raise, Error};

struct RuntimeState {
    batch_depth: Cell<usize>,
    flushing: Cell<bool>,
    queue: RefCell<VecDeque<Rc<dyn Computation>>>,
    roots: RefCell<IndexMap<SubscriberId, Rc<dyn Computation>>>,
    config: RefCell<RuntimeConfig>,
}

impl RuntimeState {
    fn new() -> Self {
        Self {
            batch_depth: Cell::new(0),
            flushing: Cell::new(false),
            queue: RefCell::new(VecDeque::new()),
            roots: RefCell::new(IndexMap::new()),
            config: RefCell::new(RuntimeConfig::default()),
        }
    }
}

thread_local! {
    static RUNTIME: RuntimeState = RuntimeState::new();
}

/// Resets the flushing flag on every exit path.
struct FlushGuard;

impl FlushGuard {
    fn enter() -> Self {
        RUNTIME.with(|rt| rt.flushing.set(true));
        FlushGuard
    }
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        let _ = RUNTIME.try_with(|rt| rt.flushing.set(false));
    }
}

/// The thread-local reactive runtime.
///
/// All functions act on the calling thread's runtime; each thread is an
/// independent reactive world.
pub struct Runtime;

impl Runtime {
    /// Queue `computation` to run on the next flush. Queuing is
    /// de-duplicated by identity.
    pub(crate) fn schedule(computation: Rc<dyn Computation>) {
        if computation.node().is_disposed() || !computation.node().mark_queued() {
            return;
        }
        trace!(computation = ?computation.node().id(), "scheduled");
        RUNTIME.with(|rt| rt.queue.borrow_mut().push_back(computation));
    }

    fn next_pending() -> Option<Rc<dyn Computation>> {
        let next = RUNTIME.with(|rt| rt.queue.borrow_mut().pop_front());
        if let Some(computation) = &next {
            computation.node().clear_queued();
        }
        next
    }

    fn drop_pending() -> usize {
        let pending = RUNTIME.with(|rt| std::mem::take(&mut *rt.queue.borrow_mut()));
        for computation in &pending {
            computation.node().clear_queued();
        }
        pending.len()
    }

    /// Run every queued computation, unless a batch is open, a flush is
    /// already in progress further up the stack, or a computation body is
    /// running. In the last case the computation flushes once its body
    /// returns.
    pub(crate) fn flush() {
        let idle = RUNTIME
            .try_with(|rt| rt.batch_depth.get() == 0 && !rt.flushing.get())
            .unwrap_or(false);
        if !idle || ReactiveContext::in_computation() {
            return;
        }

        let _guard = FlushGuard::enter();
        let limit = Self::config().max_flush_runs;
        let mut runs = 0usize;

        while let Some(computation) = Self::next_pending() {
            runs += 1;
            if runs > limit {
                let dropped = Self::drop_pending();
                debug!(dropped, "discarding queue of runaway flush");
                raise(Error::FlushLimitExceeded { limit, runs });
            }
            computation.run();
        }

        if runs > 0 {
            debug!(runs, "flush complete");
        }
    }

    pub(crate) fn enter_batch() {
        RUNTIME.with(|rt| rt.batch_depth.set(rt.batch_depth.get() + 1));
    }

    pub(crate) fn exit_batch() {
        RUNTIME.with(|rt| rt.batch_depth.set(rt.batch_depth.get().saturating_sub(1)));
    }

    /// Keep an owner-less effect alive until it is disposed.
    pub(crate) fn hold_root(computation: Rc<dyn Computation>) {
        let id = computation.node().id();
        RUNTIME.with(|rt| rt.roots.borrow_mut().insert(id, computation));
    }

    pub(crate) fn release_root(id: SubscriberId) {
        // Dropping the last root can drop the runtime itself at thread exit.
        let released = RUNTIME
            .try_with(|rt| rt.roots.borrow_mut().shift_remove(&id))
            .ok()
            .flatten();
        drop(released);
    }

    /// Whether writes are currently being coalesced by [`batch`](crate::batch).
    pub fn is_batching() -> bool {
        RUNTIME.with(|rt| rt.batch_depth.get() > 0)
    }

    /// Whether a signal read right now would create a dependency.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_tracking()
    }

    /// Number of computations waiting for the next flush.
    #[cfg(test)]
    pub(crate) fn pending_count() -> usize {
        RUNTIME.with(|rt| rt.queue.borrow().len())
    }

    /// Number of owner-less effects currently alive.
    pub fn root_count() -> usize {
        RUNTIME.with(|rt| rt.roots.borrow().len())
    }

    /// A copy of this thread's configuration.
    pub fn config() -> RuntimeConfig {
        RUNTIME
            .try_with(|rt| rt.config.borrow().clone())
            .unwrap_or_default()
    }
}

/// Install `config` for the calling thread's runtime.
pub fn configure(config: RuntimeConfig) {
    debug!(?config, "runtime configured");
    RUNTIME.with(|rt| *rt.config.borrow_mut() = config);
}

/// A copy of the calling thread's runtime configuration.
pub fn config() -> RuntimeConfig {
    Runtime::config()
}

/// Return the calling thread's runtime to a pristine state.
///
/// Clears the tracking stack, closes any open batch, drops the pending
/// queue and disposes every owner-less effect. Intended to isolate test
/// cases from each other; the configuration is left untouched.
pub fn reset_context() {
    ReactiveContext::clear();
    let dropped = Runtime::drop_pending();

    let roots = RUNTIME.with(|rt| {
        rt.batch_depth.set(0);
        rt.flushing.set(false);
        std::mem::take(&mut *rt.roots.borrow_mut())
    });
    let disposed = roots.len();
    for root in roots.into_values() {
        root.dispose();
    }

    debug!(dropped, disposed, "reactive context reset");
}
