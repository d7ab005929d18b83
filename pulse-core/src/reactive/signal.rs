//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a running computation (memo/effect),
//!    the read is recorded as a dependency of that computation.
//!
//! 2. When a signal's value changes, all subscribers are notified.
//!
//! 3. Outside a batch, the write then flushes the runtime, so every
//!    dependent effect has re-run by the time `set` returns.
//!
//! # Equality
//!
//! A signal may carry an equality check. Writes the check considers equal
//! to the current value are dropped without notifying anyone. Signals built
//! with [`pulse`] have no check and notify on every write.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::context::ReactiveContext;
use super::runtime::Runtime;
use super::subscriber::{Computation, Source, SourceId, SubscriberId, Subscribers};
use super::Read;

type Equality<T> = Box<dyn Fn(&T, &T) -> bool>;

struct SignalInner<T> {
    id: SourceId,
    value: RefCell<T>,
    subscribers: Subscribers,
    equals: Option<Equality<T>>,
}

impl<T: 'static> Source for SignalInner<T> {
    fn source_id(&self) -> SourceId {
        self.id
    }

    fn subscribe(&self, id: SubscriberId, observer: Weak<dyn Computation>) {
        self.subscribers.insert(id, observer);
    }

    fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.remove(id);
    }
}

/// A reactive signal holding a value of type `T`.
///
/// Cloning a signal produces another handle to the same value.
///
/// # Example
///
/// ```rust,ignore
/// let count = pulse(0);
///
/// // Read the value
/// let value = count.get();
///
/// // Update the value (notifies subscribers)
/// count.set(5);
/// ```
pub struct Signal<T: 'static> {
    inner: Rc<SignalInner<T>>,
}

/// Create a signal that notifies on every write.
pub fn pulse<T: 'static>(initial: T) -> Signal<T> {
    Signal::new(initial)
}

/// Create a signal that ignores writes equal to its current value.
pub fn pulse_eq<T: PartialEq + 'static>(initial: T) -> Signal<T> {
    Signal::with_equality(initial, |a, b| a == b)
}

/// Create a signal with a custom equality check.
pub fn pulse_with<T: 'static>(initial: T, equals: impl Fn(&T, &T) -> bool + 'static) -> Signal<T> {
    Signal::with_equality(initial, equals)
}

impl<T: 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self::build(value, None)
    }

    /// Create a signal that skips writes `equals` reports as unchanged.
    pub fn with_equality(value: T, equals: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self::build(value, Some(Box::new(equals)))
    }

    fn build(value: T, equals: Option<Equality<T>>) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: SourceId::new(),
                value: RefCell::new(value),
                subscribers: Subscribers::new(),
                equals,
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> SourceId {
        self.inner.id
    }

    /// Get the current value.
    ///
    /// If called within a running computation, this also records the
    /// signal as one of its dependencies.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Borrow the current value, tracking it like [`get`](Self::get).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.value.borrow())
    }

    /// Get the current value without tracking dependencies.
    pub fn peek(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without tracking dependencies.
    pub fn peek_with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    fn track(&self) {
        let source: Rc<dyn Source> = self.inner.clone();
        ReactiveContext::track(source);
    }

    /// Set a new value and notify subscribers.
    ///
    /// Outside a batch, every dependent effect has re-run before this
    /// returns. A write the equality check considers unchanged does
    /// nothing.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if let Some(equals) = &self.inner.equals {
                if equals(&current, &value) {
                    trace!(signal = ?self.inner.id, "write skipped: value unchanged");
                    return;
                }
            }
            *current = value;
        }

        self.notify();
    }

    /// Update the value using a function of the current value.
    ///
    /// Equivalent to `set(f(&peek()))`.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.inner.value.borrow());
        self.set(next);
    }

    /// Mutate the value in place and notify subscribers.
    ///
    /// The equality check is not consulted: an in-place mutation has no
    /// previous value to compare against.
    pub fn update_in_place<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        f(&mut self.inner.value.borrow_mut());
        self.notify();
    }

    fn notify(&self) {
        trace!(
            signal = ?self.inner.id,
            subscribers = self.inner.subscribers.len(),
            "signal changed"
        );
        self.inner.subscribers.notify();
        ReactiveContext::notify_running_readers(self.inner.id);
        Runtime::flush();
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl<T: Clone + 'static> Read<T> for Signal<T> {
    fn get(&self) -> T {
        Signal::get(self)
    }

    fn peek(&self) -> T {
        Signal::peek(self)
    }

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        Signal::with(self, f)
    }
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug + 'static> Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
