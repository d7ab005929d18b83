//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency changes, the effect is queued on the runtime and
//!    re-runs on the next flush (immediately, unless a batch is open).
//!
//! 3. Before re-running, the effect disposes the computations it created on
//!    its previous run and runs its cleanups. Dependencies are rebuilt from
//!    scratch on every run.
//!
//! # Lifetime
//!
//! An effect created inside another computation or a [`Scope`](crate::Scope)
//! belongs to it and is disposed with it. An effect created outside any
//! owner stays alive until [`Effect::dispose`] is called; dropping the
//! handle does not stop it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, trace};

use super::context::ReactiveContext;
use super::node::Node;
use super::runtime::Runtime;
use super::subscriber::{Computation, SubscriberId};

struct EffectInner {
    node: Node,
    body: RefCell<Box<dyn FnMut()>>,
    run_count: Cell<usize>,
}

impl EffectInner {
    fn execute(self: &Rc<Self>) {
        if self.node.is_disposed() {
            return;
        }
        if self.node.is_running() {
            // Re-entered from its own body; run again once this run is over.
            Runtime::schedule(Rc::clone(self) as Rc<dyn Computation>);
            return;
        }

        self.node.clean();
        // Cleanups may have disposed us.
        if self.node.is_disposed() {
            return;
        }

        trace!(effect = ?self.node.id(), "running effect");
        {
            let _ctx = ReactiveContext::enter_run(Rc::clone(self) as Rc<dyn Computation>);
            (self.body.borrow_mut())();
        }
        self.run_count.set(self.run_count.get() + 1);

        // Writes made by the body were held until it returned.
        Runtime::flush();
    }
}

impl Computation for EffectInner {
    fn node(&self) -> &Node {
        &self.node
    }

    fn notify(self: Rc<Self>) {
        Runtime::schedule(self);
    }

    fn run(self: Rc<Self>) {
        self.execute();
    }

    fn dispose(&self) {
        if self.node.dispose() {
            debug!(effect = ?self.node.id(), "effect disposed");
            Runtime::release_root(self.node.id());
        }
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let count = pulse(0);
///
/// let c = count.clone();
/// let logger = effect(move || {
///     println!("Count is: {}", c.get());
/// });
///
/// count.set(5);  // Prints: "Count is: 5"
/// logger.dispose();
/// count.set(6);  // Prints nothing
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

/// Create an effect and run it once.
pub fn effect(f: impl FnMut() + 'static) -> Effect {
    Effect::new(f)
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies.
    /// A panic from that first run propagates to the caller; the effect
    /// stays registered with whatever dependencies it read before the
    /// panic.
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut() + 'static,
    {
        let inner = Rc::new(EffectInner {
            node: Node::new(),
            body: RefCell::new(Box::new(f)),
            run_count: Cell::new(0),
        });

        let computation: Rc<dyn Computation> = inner.clone();
        match ReactiveContext::current_owner() {
            Some(owner) => owner.node().adopt(computation),
            None => Runtime::hold_root(computation),
        }

        inner.execute();

        Self { inner }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.inner.node.id()
    }

    /// Stop the effect.
    ///
    /// Runs pending cleanups, disposes owned computations and removes every
    /// subscription. Calling this again does nothing.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.node.is_disposed()
    }

    /// Get the number of times the effect body has completed.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Get the number of dependencies from the last run.
    pub fn dependency_count(&self) -> usize {
        self.inner.node.source_count()
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
