//! Ownership scopes.
//!
//! A [`Scope`] is an owner without a body. Computations created inside
//! [`Scope::run`] belong to it, and cleanups registered there run when the
//! scope is disposed. The list reconciler gives each entry its own scope so
//! that removing the entry tears down whatever its template set up.

use std::rc::Rc;

use tracing::trace;

use super::context::ReactiveContext;
use super::node::Node;
use super::subscriber::{Computation, SubscriberId};

struct ScopeInner {
    node: Node,
}

impl Computation for ScopeInner {
    fn node(&self) -> &Node {
        &self.node
    }

    // Scopes never observe anything.
    fn notify(self: Rc<Self>) {}

    fn run(self: Rc<Self>) {}

    fn dispose(&self) {
        if self.node.dispose() {
            trace!(scope = ?self.node.id(), "scope disposed");
        }
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.node.dispose();
    }
}

/// An owner for computations and cleanups.
///
/// Dropping the last handle to a scope disposes it.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    /// Create a scope owned by the current owner, if there is one.
    pub fn new() -> Self {
        let scope = Self::detached();
        if let Some(owner) = ReactiveContext::current_owner() {
            owner.node().adopt(scope.inner.clone());
        }
        scope
    }

    /// Create a scope with no owner. It lives until disposed or dropped.
    pub fn detached() -> Self {
        Self {
            inner: Rc::new(ScopeInner { node: Node::new() }),
        }
    }

    /// Get the scope's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.inner.node.id()
    }

    /// Run `f` with this scope as the current owner. Reads inside `f` are
    /// still tracked by the enclosing computation.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let _ctx = ReactiveContext::enter_owner(self.inner.clone());
        f()
    }

    /// Run `f` with this scope as the current owner and tracking disabled.
    pub fn run_untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        let _ctx = ReactiveContext::enter_owner_untracked(self.inner.clone());
        f()
    }

    /// Dispose owned computations, then run cleanups. Idempotent.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Check if the scope has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.node.is_disposed()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Register `f` to run before the current owner re-runs, and when it is
/// disposed.
///
/// Outside any owner this does nothing; shared helpers may call it
/// unconditionally.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    match ReactiveContext::current_owner() {
        Some(owner) => owner.node().add_cleanup(Box::new(f)),
        None => trace!("on_cleanup outside any owner ignored"),
    }
}
