//! Move strategies.
//!
//! Given, for every entry in the new order, the position it held in the
//! previous order (`None` for entries created this pass), a strategy picks
//! which surviving entries stay where they are. Everything else is moved.
//! Any choice is correct as long as the stable entries are already in
//! increasing previous-position order; strategies only differ in how many
//! moves they cause.

use serde::{Deserialize, Serialize};

use super::lis::compute_lis;

/// Picks the entries that do not need to move.
pub trait MoveStrategy {
    /// `previous[i]` is the old position of the entry now at position `i`.
    /// Returns `stable[i] == true` for entries to leave in place.
    fn stable(&self, previous: &[Option<usize>]) -> Vec<bool>;
}

/// Keep the longest run of entries whose relative order did not change.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lis;

impl MoveStrategy for Lis {
    fn stable(&self, previous: &[Option<usize>]) -> Vec<bool> {
        let (positions, old): (Vec<usize>, Vec<usize>) = previous
            .iter()
            .enumerate()
            .filter_map(|(new, old)| old.map(|old| (new, old)))
            .unzip();

        let mut stable = vec![false; previous.len()];
        for i in compute_lis(&old) {
            stable[positions[i]] = true;
        }
        stable
    }
}

/// Re-insert every surviving entry. Correct but never minimal; useful as a
/// baseline when comparing strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveAll;

impl MoveStrategy for MoveAll {
    fn stable(&self, previous: &[Option<usize>]) -> Vec<bool> {
        vec![false; previous.len()]
    }
}

/// Serializable selector for the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Lis,
    MoveAll,
}

impl StrategyKind {
    pub fn strategy(self) -> &'static dyn MoveStrategy {
        match self {
            StrategyKind::Lis => &Lis,
            StrategyKind::MoveAll => &MoveAll,
        }
    }
}
