//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! the current computation records it as a dependency.
//!
//! # Implementation
//!
//! We use a thread-local stack of frames. Each frame names two things:
//!
//! - the *observer*: the computation that reads are attributed to, or none
//!   inside [`untrack`];
//! - the *owner*: the computation or scope that adopts newly created
//!   computations and receives [`on_cleanup`](crate::on_cleanup) callbacks.
//!
//! Frames are pushed by a guard and popped when the guard drops, so the
//! stack is restored on every exit path, including unwinding out of a
//! panicking body.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use super::subscriber::{Computation, Source, SourceId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
    static NEXT_FRAME: Cell<u64> = const { Cell::new(0) };
}

/// An entry in the reactive context stack.
#[derive(Clone)]
struct Frame {
    id: u64,
    owner: Option<Rc<dyn Computation>>,
    observer: Option<Rc<dyn Computation>>,
    /// Set on the frame that runs a computation's body; popping it commits
    /// the dependencies tracked during the run.
    commits: bool,
}

/// Guard that pops its frame when dropped.
///
/// Frames are matched by id, not by stack depth: after [`clear`](Self::clear)
/// a surviving guard must not pop a frame pushed later at the same depth.
pub(crate) struct ReactiveContext {
    frame: u64,
}

impl ReactiveContext {
    fn push(mut frame: Frame) -> Self {
        let id = NEXT_FRAME.with(|next| next.replace(next.get().wrapping_add(1)));
        frame.id = id;
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(frame));
        Self { frame: id }
    }

    /// Enter the frame that runs `computation`'s body. Reads are attributed
    /// to it and it owns anything created during the run.
    pub(crate) fn enter_run(computation: Rc<dyn Computation>) -> Self {
        computation.node().set_running(true);
        Self::push(Frame {
            id: 0,
            owner: Some(Rc::clone(&computation)),
            observer: Some(computation),
            commits: true,
        })
    }

    /// Make `owner` the current owner without changing who observes reads.
    pub(crate) fn enter_owner(owner: Rc<dyn Computation>) -> Self {
        Self::push(Frame {
            id: 0,
            owner: Some(owner),
            observer: Self::current_observer(),
            commits: false,
        })
    }

    /// Make `owner` the current owner and stop tracking reads.
    pub(crate) fn enter_owner_untracked(owner: Rc<dyn Computation>) -> Self {
        Self::push(Frame {
            id: 0,
            owner: Some(owner),
            observer: None,
            commits: false,
        })
    }

    /// Stop tracking reads; the current owner stays in place.
    pub(crate) fn enter_untracked() -> Self {
        Self::push(Frame {
            id: 0,
            owner: Self::current_owner(),
            observer: None,
            commits: false,
        })
    }

    /// Whether a read right now would create a dependency.
    pub fn is_tracking() -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .is_some_and(|frame| frame.observer.is_some())
        })
    }

    /// Whether some computation's body is on the stack.
    pub(crate) fn in_computation() -> bool {
        CONTEXT_STACK.with(|stack| stack.borrow().iter().any(|frame| frame.commits))
    }

    /// Number of frames currently on this thread's stack.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }

    pub(crate) fn current_owner() -> Option<Rc<dyn Computation>> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|frame| frame.owner.clone()))
    }

    pub(crate) fn current_observer() -> Option<Rc<dyn Computation>> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|frame| frame.observer.clone())
        })
    }

    /// Record a read of `source` against the current observer, if any.
    pub(crate) fn track(source: Rc<dyn Source>) {
        if let Some(observer) = Self::current_observer() {
            observer.node().track(source);
        }
    }

    /// Notify computations on the stack that read `source` during their
    /// current run but are not subscribed to it yet. Such readers only
    /// join the source's subscriber set when their run commits.
    pub(crate) fn notify_running_readers(source: SourceId) {
        let readers: Vec<Rc<dyn Computation>> = CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .filter(|frame| frame.commits)
                .filter_map(|frame| frame.observer.clone())
                .filter(|observer| observer.node().read_pending(source))
                .collect()
        });
        for reader in readers {
            reader.notify();
        }
    }

    /// Drop every frame. Guards still alive become no-ops.
    pub(crate) fn clear() {
        let frames = CONTEXT_STACK.with(|stack| std::mem::take(&mut *stack.borrow_mut()));
        for frame in frames.iter().filter(|frame| frame.commits) {
            if let Some(observer) = &frame.observer {
                observer.node().set_running(false);
            }
        }
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        let popped = CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.last().is_some_and(|top| top.id == self.frame) {
                stack.pop()
            } else {
                // The stack was cleared while this guard was alive.
                None
            }
        });

        let Some(frame) = popped else {
            trace!(frame = self.frame, "context frame already gone");
            return;
        };

        if frame.commits {
            if let Some(observer) = frame.observer {
                observer.node().set_running(false);
                observer.node().commit(&Rc::downgrade(&observer));
            }
        }
    }
}

/// Run `f` without tracking any reads, then restore the previous tracking
/// state.
///
/// Signals read inside `f` do not become dependencies of the enclosing
/// computation. Ownership is unaffected: effects created and cleanups
/// registered inside `f` still belong to the enclosing owner.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::enter_untracked();
    f()
}
