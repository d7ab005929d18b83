//! Batched writes.
//!
//! Inside [`batch`], writes update values immediately but effects are only
//! queued. When the outermost batch returns, every queued effect runs once,
//! in first-scheduled order, no matter how many of its dependencies changed.

use std::panic::{self, AssertUnwindSafe};

use super::runtime::Runtime;

/// Run `f` with effect re-runs deferred until it returns.
///
/// Nested batches flatten into the outermost one. The queue is flushed
/// even when `f` panics; the panic is resumed after the flush.
///
/// ```rust,ignore
/// let first = pulse("Ada");
/// let last = pulse("Lovelace");
/// // An effect reading both runs once, not twice.
/// batch(|| {
///     first.set("Grace");
///     last.set("Hopper");
/// });
/// ```
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    Runtime::enter_batch();
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    Runtime::exit_batch();
    Runtime::flush();

    match result {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::reactive::{effect, pulse};

    #[test]
    fn effects_run_once_after_batch() {
        let a = pulse(0);
        let b = pulse(0);
        let runs = Rc::new(Cell::new(0));

        let (a2, b2, counter) = (a.clone(), b.clone(), runs.clone());
        let _effect = effect(move || {
            a2.get();
            b2.get();
            counter.set(counter.get() + 1);
        });

        batch(|| {
            a.set(1);
            b.set(2);
            a.set(3);
            assert_eq!(runs.get(), 1, "no re-run inside the batch");
            assert!(Runtime::is_batching());
        });

        assert_eq!(runs.get(), 2);
        assert!(!Runtime::is_batching());
    }

    #[test]
    fn nested_batches_flatten() {
        let a = pulse(0);
        let runs = Rc::new(Cell::new(0));

        let (a2, counter) = (a.clone(), runs.clone());
        let _effect = effect(move || {
            a2.get();
            counter.set(counter.get() + 1);
        });

        batch(|| {
            batch(|| a.set(1));
            assert_eq!(runs.get(), 1, "inner batch must not flush");
            a.set(2);
        });

        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn batch_returns_value() {
        assert_eq!(batch(|| 7), 7);
    }

    #[test]
    fn panicking_batch_still_flushes() {
        let a = pulse(0);
        let seen = Rc::new(Cell::new(0));

        let (a2, out) = (a.clone(), seen.clone());
        let _effect = effect(move || out.set(a2.get()));

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            batch(|| {
                a.set(9);
                panic!("write failed halfway");
            })
        }));

        assert!(result.is_err());
        assert!(!Runtime::is_batching());
        assert_eq!(seen.get(), 9);
    }

    #[test]
    fn effects_run_in_first_scheduled_order() {
        let a = pulse(0);
        let b = pulse(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        let (b2, log) = (b.clone(), order.clone());
        let _on_b = effect(move || {
            b2.get();
            log.borrow_mut().push("b");
        });
        let (a2, log) = (a.clone(), order.clone());
        let _on_a = effect(move || {
            a2.get();
            log.borrow_mut().push("a");
        });
        order.borrow_mut().clear();

        batch(|| {
            a.set(1);
            b.set(1);
        });

        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }
}
