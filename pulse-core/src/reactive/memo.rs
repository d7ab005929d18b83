//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Memos Work
//!
//! 1. On creation, the memo runs its computation once and caches the result.
//!
//! 2. When a dependency changes, the memo is marked dirty and forwards the
//!    notification to its own subscribers, so effects reading the memo are
//!    queued.
//!
//! 3. On next access, a dirty memo recomputes (rebuilding its dependency
//!    set) before returning. A clean memo returns its cache.
//!
//! Because recomputation is pulled at read time, a read never observes a
//! value computed against dependencies that have since changed.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::context::ReactiveContext;
use super::node::Node;
use super::runtime::Runtime;
use super::subscriber::{Computation, Source, SourceId, SubscriberId, Subscribers};
use super::Read;
use crate::error::{raise, Error};

/// Dirty state for a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    /// The cached value is up-to-date.
    Clean,

    /// A dependency changed since the cached value was computed.
    Dirty,
}

struct MemoInner<T> {
    node: Node,
    source_id: SourceId,
    compute: Box<dyn Fn() -> T>,
    /// Empty only while the first computation is on the stack.
    value: RefCell<Option<T>>,
    state: Cell<MemoState>,
    /// Set once a change has been forwarded to subscribers; cleared when a
    /// recompute is attempted. A failed recompute leaves the memo dirty but
    /// still forwards the next change.
    forwarded: Cell<bool>,
    subscribers: Subscribers,
}

impl<T: 'static> MemoInner<T> {
    fn check_cycle(&self) {
        if self.node.is_running() {
            raise(Error::CircularMemo { id: self.node.id() });
        }
    }

    /// Recompute if dirty. Disposed memos keep serving their last value.
    fn refresh(self: &Rc<Self>) {
        self.check_cycle();
        if self.state.get() == MemoState::Dirty && !self.node.is_disposed() {
            self.recompute();
        }
    }

    fn recompute(self: &Rc<Self>) {
        self.forwarded.set(false);
        self.node.clean();

        trace!(memo = ?self.node.id(), "recomputing memo");
        let value = {
            let _ctx = ReactiveContext::enter_run(Rc::clone(self) as Rc<dyn Computation>);
            (self.compute)()
        };

        *self.value.borrow_mut() = Some(value);
        self.state.set(MemoState::Clean);
        self.forwarded.set(false);
        Runtime::flush();
    }
}

impl<T: 'static> Computation for MemoInner<T> {
    fn node(&self) -> &Node {
        &self.node
    }

    fn notify(self: Rc<Self>) {
        if self.node.is_disposed() || self.forwarded.replace(true) {
            return;
        }
        self.state.set(MemoState::Dirty);
        self.subscribers.notify();
        ReactiveContext::notify_running_readers(self.source_id);
    }

    fn run(self: Rc<Self>) {
        self.refresh();
    }

    fn dispose(&self) {
        if self.node.dispose() {
            trace!(memo = ?self.node.id(), "memo disposed");
        }
    }
}

impl<T: 'static> Source for MemoInner<T> {
    fn source_id(&self) -> SourceId {
        self.source_id
    }

    fn subscribe(&self, id: SubscriberId, observer: Weak<dyn Computation>) {
        self.subscribers.insert(id, observer);
    }

    fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.remove(id);
    }
}

/// A cached derived value that recomputes only when dependencies change.
///
/// Cloning a memo produces another handle to the same cache.
///
/// # Example
///
/// ```rust,ignore
/// let count = pulse(2);
/// let c = count.clone();
/// let doubled = computed(move || c.get() * 2);
///
/// assert_eq!(doubled.get(), 4);
/// count.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Memo<T: 'static> {
    inner: Rc<MemoInner<T>>,
}

/// Create a memo and compute its first value.
pub fn computed<T: 'static>(f: impl Fn() -> T + 'static) -> Memo<T> {
    Memo::new(f)
}

impl<T: 'static> Memo<T> {
    /// Create a new memo with the given computation function.
    ///
    /// The computation runs immediately. A panic from it propagates to the
    /// caller.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        let inner = Rc::new(MemoInner {
            node: Node::new(),
            source_id: SourceId::new(),
            compute: Box::new(compute),
            value: RefCell::new(None),
            state: Cell::new(MemoState::Dirty),
            forwarded: Cell::new(false),
            subscribers: Subscribers::new(),
        });

        if let Some(owner) = ReactiveContext::current_owner() {
            owner.node().adopt(inner.clone());
        }

        inner.recompute();

        Self { inner }
    }

    /// Get the memo's unique source ID.
    pub fn id(&self) -> SourceId {
        self.inner.source_id
    }

    /// Get the current value, recomputing if necessary.
    ///
    /// If called within a running computation, the memo becomes one of its
    /// dependencies.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Borrow the current value, tracking it like [`get`](Self::get).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        // A memo reading itself must fail before it can subscribe to
        // itself. Tracking comes before the recompute so that a reader whose
        // run is cut short by a failing memo still depends on it.
        self.inner.check_cycle();
        let source: Rc<dyn Source> = self.inner.clone();
        ReactiveContext::track(source);
        self.inner.refresh();
        self.cached(f)
    }

    /// Get the current value, recomputing if necessary, without tracking.
    pub fn peek(&self) -> T
    where
        T: Clone,
    {
        self.inner.refresh();
        self.cached(T::clone)
    }

    fn cached<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.inner.value.borrow();
        match value.as_ref() {
            Some(value) => f(value),
            // Only reachable when the memo's first computation reads itself.
            None => raise(Error::CircularMemo {
                id: self.inner.node.id(),
            }),
        }
    }

    /// Stop tracking dependencies. The last computed value stays readable.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Check if the memo has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.node.is_disposed()
    }

    /// Get the current dirty state.
    pub fn state(&self) -> MemoState {
        self.inner.state.get()
    }

    /// Get the number of dependents.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Get the number of dependencies from the last computation.
    pub fn dependency_count(&self) -> usize {
        self.inner.node.source_count()
    }
}

impl<T: Clone + 'static> Read<T> for Memo<T> {
    fn get(&self) -> T {
        Memo::get(self)
    }

    fn peek(&self) -> T {
        Memo::peek(self)
    }

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        Memo::with(self, f)
    }
}

impl<T: 'static> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug + 'static> Debug for Memo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.inner.source_id)
            .field("state", &self.state())
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
