//! Subscriber types for the reactive system.
//!
//! A subscriber is any computation that depends on reactive values: effects,
//! memos, and the scopes that own them. A source is anything a computation
//! can read and subscribe to: signals and memos.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::node::Node;

/// Unique identifier for a subscriber.
///
/// Each computation (memo, effect, or scope) gets a unique ID when created.
/// Sources key their subscriber sets by this ID, which makes subscriptions
/// identity-based and idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a readable reactive source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    /// Generate a new unique source ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

/// A node in the ownership tree that may also observe sources.
///
/// Effects, memos and scopes implement this. The runtime only ever holds
/// computations behind `Rc<dyn Computation>` (owners, the root set, the
/// pending queue) or `Weak<dyn Computation>` (source subscriber sets).
pub(crate) trait Computation {
    /// The shared bookkeeping for this computation.
    fn node(&self) -> &Node;

    /// One of the sources read during the last run changed.
    fn notify(self: Rc<Self>);

    /// Re-run the body. Called by the flush loop for queued computations.
    fn run(self: Rc<Self>);

    /// Permanently stop this computation. Must be idempotent.
    fn dispose(&self);
}

/// Something a computation can depend on.
pub(crate) trait Source {
    fn source_id(&self) -> SourceId;

    fn subscribe(&self, id: SubscriberId, observer: Weak<dyn Computation>);

    fn unsubscribe(&self, id: SubscriberId);
}

/// The subscriber set of a source.
///
/// Insertion-ordered, so notification order follows subscription order.
/// Entries are weak: a computation that has been dropped is pruned the next
/// time the set is notified.
#[derive(Default)]
pub(crate) struct Subscribers {
    entries: RefCell<IndexMap<SubscriberId, Weak<dyn Computation>>>,
}

impl Subscribers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, id: SubscriberId, observer: Weak<dyn Computation>) {
        self.entries.borrow_mut().insert(id, observer);
    }

    pub(crate) fn remove(&self, id: SubscriberId) {
        self.entries.borrow_mut().shift_remove(&id);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Notify every live subscriber.
    ///
    /// The set is snapshotted first; subscribers may subscribe or
    /// unsubscribe while being notified.
    pub(crate) fn notify(&self) {
        let live: Vec<Rc<dyn Computation>> = {
            let mut entries = self.entries.borrow_mut();
            entries.retain(|_, weak| weak.strong_count() > 0);
            entries.values().filter_map(Weak::upgrade).collect()
        };

        for subscriber in live {
            subscriber.notify();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Listener {
        node: Node,
        notified: Cell<usize>,
    }

    impl Computation for Listener {
        fn node(&self) -> &Node {
            &self.node
        }

        fn notify(self: Rc<Self>) {
            self.notified.set(self.notified.get() + 1);
        }

        fn run(self: Rc<Self>) {}

        fn dispose(&self) {}
    }

    fn listener() -> Rc<Listener> {
        Rc::new(Listener {
            node: Node::new(),
            notified: Cell::new(0),
        })
    }

    #[test]
    fn ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
        assert_ne!(SourceId::new(), SourceId::new());
    }

    #[test]
    fn insert_is_idempotent_per_id() {
        let subscribers = Subscribers::new();
        let p = listener();
        let as_dyn: Rc<dyn Computation> = p.clone();

        subscribers.insert(p.node.id(), Rc::downgrade(&as_dyn));
        subscribers.insert(p.node.id(), Rc::downgrade(&as_dyn));
        assert_eq!(subscribers.len(), 1);

        subscribers.notify();
        assert_eq!(p.notified.get(), 1);

        subscribers.remove(p.node.id());
        subscribers.notify();
        assert_eq!(p.notified.get(), 1);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let subscribers = Subscribers::new();
        {
            let p: Rc<dyn Computation> = listener();
            subscribers.insert(p.node().id(), Rc::downgrade(&p));
            assert_eq!(subscribers.len(), 1);
        }

        subscribers.notify();
        assert_eq!(subscribers.len(), 0);
    }
}
