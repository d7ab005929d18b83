//! Pulse Core
//!
//! This crate provides the core runtime for the Pulse reactive UI framework.
//! It implements:
//!
//! - Reactive primitives (signals, memos, effects)
//! - Batching, cleanup and ownership scopes
//! - Keyed list reconciliation with minimal node moves
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Core reactive primitives and dependency tracking
//! - `list`: Keyed list rendering over an abstract render target
//! - `config`: Runtime limits and defaults
//! - `error`: Errors raised by the runtime
//!
//! # Example
//!
//! ```rust
//! use pulse_core::{computed, effect, pulse};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! // Create a signal
//! let count = pulse(0);
//!
//! // Create a derived value
//! let c = count.clone();
//! let doubled = computed(move || c.get() * 2);
//!
//! // Create an effect
//! let (c, d, l) = (count.clone(), doubled.clone(), log.clone());
//! let _effect = effect(move || {
//!     l.borrow_mut().push(format!("count: {}, doubled: {}", c.get(), d.get()));
//! });
//!
//! // Update the signal; the effect re-runs synchronously
//! count.set(5);
//! assert_eq!(log.borrow().last().unwrap(), "count: 5, doubled: 10");
//! ```

pub mod config;
pub mod error;
pub mod list;
pub mod reactive;

pub use config::RuntimeConfig;
pub use error::{Error, Result};
pub use list::{
    compute_lis, list, list_indexed, list_with_options, List, ListOptions, ListSource,
    MemoryTarget, RenderTarget, Rendered, StrategyKind,
};
pub use reactive::{
    batch, computed, config, configure, effect, on_cleanup, pulse, pulse_eq,
    pulse_with, reset_context, untrack, Effect, Memo, Read, Runtime, Scope, Signal,
};
