//! Computation Nodes
//!
//! The bookkeeping shared by every computation: the sources it read on its
//! last run, the sources it is reading on the current run, its cleanup
//! callbacks and the children it owns.
//!
//! # Dependency updates
//!
//! Reads during a run are collected into `tracked`. When the run ends
//! (normally or by unwinding) [`Node::commit`] diffs `tracked` against
//! `sources`: sources that were not read again are unsubscribed, newly read
//! sources are subscribed. A source's subscriber set therefore only ever
//! contains computations that read it on their most recent run.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::trace;

use super::subscriber::{Computation, Source, SourceId, SubscriberId};

/// Deferred callback registered with [`on_cleanup`](crate::on_cleanup).
pub(crate) type Cleanup = Box<dyn FnOnce()>;

/// Shared runtime state of an effect, memo or scope.
pub(crate) struct Node {
    id: SubscriberId,

    /// Sources read during the last completed run, in first-read order.
    sources: RefCell<IndexMap<SourceId, Rc<dyn Source>>>,

    /// Sources read so far during the current run.
    tracked: RefCell<IndexMap<SourceId, Rc<dyn Source>>>,

    /// Cleanups registered since the last run started, in registration order.
    cleanups: RefCell<Vec<Cleanup>>,

    /// Computations created while this node was the current owner.
    children: RefCell<Vec<Rc<dyn Computation>>>,

    disposed: Cell<bool>,
    running: Cell<bool>,
    queued: Cell<bool>,
}

impl Node {
    pub(crate) fn new() -> Self {
        Self {
            id: SubscriberId::new(),
            sources: RefCell::new(IndexMap::new()),
            tracked: RefCell::new(IndexMap::new()),
            cleanups: RefCell::new(Vec::new()),
            children: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
            running: Cell::new(false),
            queued: Cell::new(false),
        }
    }

    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.get()
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.set(running);
    }

    /// Mark as queued. Returns `false` if it already was.
    pub(crate) fn mark_queued(&self) -> bool {
        !self.queued.replace(true)
    }

    pub(crate) fn clear_queued(&self) {
        self.queued.set(false);
    }

    pub(crate) fn source_count(&self) -> usize {
        self.sources.borrow().len()
    }

    /// Record a read of `source` during the current run.
    pub(crate) fn track(&self, source: Rc<dyn Source>) {
        let id = source.source_id();
        self.tracked.borrow_mut().entry(id).or_insert(source);
    }

    /// Whether `source` was read during the current run without being
    /// subscribed from an earlier one.
    pub(crate) fn read_pending(&self, source: SourceId) -> bool {
        self.tracked.borrow().contains_key(&source) && !self.sources.borrow().contains_key(&source)
    }

    pub(crate) fn add_cleanup(&self, cleanup: Cleanup) {
        self.cleanups.borrow_mut().push(cleanup);
    }

    /// Take ownership of `child`. A disposed node cannot own anything, so
    /// the child is disposed on the spot.
    pub(crate) fn adopt(&self, child: Rc<dyn Computation>) {
        if self.is_disposed() {
            trace!(owner = ?self.id, child = ?child.node().id(), "owner already disposed");
            child.dispose();
            return;
        }
        self.children.borrow_mut().push(child);
    }

    /// Dispose owned children, then run cleanups front to back.
    ///
    /// Called before every re-run. Each list is detached before it is
    /// drained, so callbacks may register new cleanups without touching
    /// the list being drained.
    pub(crate) fn clean(&self) {
        let children = std::mem::take(&mut *self.children.borrow_mut());
        for child in children {
            child.dispose();
        }

        let cleanups = std::mem::take(&mut *self.cleanups.borrow_mut());
        for cleanup in cleanups {
            cleanup();
        }
    }

    /// Replace the previous dependency set with the one tracked during the
    /// run that just ended.
    pub(crate) fn commit(&self, this: &Weak<dyn Computation>) {
        let tracked = std::mem::take(&mut *self.tracked.borrow_mut());

        if self.is_disposed() {
            // Disposed mid-run: nothing read during the run may subscribe.
            return;
        }

        let previous = std::mem::replace(&mut *self.sources.borrow_mut(), tracked);

        let (stale, fresh): (Vec<Rc<dyn Source>>, Vec<Rc<dyn Source>>) = {
            let current = self.sources.borrow();
            let stale = previous
                .iter()
                .filter(|(id, _)| !current.contains_key(*id))
                .map(|(_, source)| Rc::clone(source))
                .collect();
            let fresh = current
                .iter()
                .filter(|(id, _)| !previous.contains_key(*id))
                .map(|(_, source)| Rc::clone(source))
                .collect();
            (stale, fresh)
        };

        for source in &stale {
            source.unsubscribe(self.id);
        }
        for source in &fresh {
            source.subscribe(self.id, Weak::clone(this));
        }

        trace!(
            node = ?self.id,
            subscribed = fresh.len(),
            unsubscribed = stale.len(),
            "dependencies updated"
        );
    }

    /// Tear the node down: children, cleanups (including any registered by
    /// other cleanups), then every subscription.
    ///
    /// Returns `false` if the node was already disposed.
    pub(crate) fn dispose(&self) -> bool {
        if self.disposed.replace(true) {
            return false;
        }

        loop {
            let has_work =
                !self.children.borrow().is_empty() || !self.cleanups.borrow().is_empty();
            if !has_work {
                break;
            }
            self.clean();
        }

        let sources = std::mem::take(&mut *self.sources.borrow_mut());
        for source in sources.values() {
            source.unsubscribe(self.id);
        }
        self.tracked.borrow_mut().clear();

        true
    }
}
