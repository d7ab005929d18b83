//! Keyed Lists
//!
//! Rendering a reactive collection one entry per key, with the smallest
//! practical number of render-tree operations when the collection changes.
//!
//! # Pieces
//!
//! - [`RenderTarget`]: the two render-tree operations the reconciler needs.
//!   [`MemoryTarget`] is a headless implementation for tests and tools.
//! - [`list`] / [`list_indexed`] / [`list_with_options`]: bind a source to
//!   a target and return a [`List`] handle.
//! - [`MoveStrategy`]: decides which surviving entries stay in place. The
//!   default, [`Lis`], keeps a longest increasing subsequence of the old
//!   positions, found by [`compute_lis`].
//!
//! Each entry owns a [`Scope`](crate::reactive::Scope). Effects and
//! cleanups set up by the template live in it and are torn down when the
//! entry's key disappears or the list is disposed.

mod lis;
mod reconcile;
mod strategy;
mod target;

pub use lis::compute_lis;
pub use reconcile::{
    list, list_indexed, list_with_options, List, ListOptions, ListSource, ReconcileStats,
};
pub use strategy::{Lis, MoveAll, MoveStrategy, StrategyKind};
pub use target::{MemoryTarget, RenderTarget, Rendered, TextNode};
