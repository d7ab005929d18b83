//! Keyed list reconciliation.
//!
//! A [`List`] keeps a rendered sequence of nodes in step with a reactive
//! collection. It runs one effect over the source; every time the source
//! changes, the effect diffs the new keys against the entries from the
//! previous pass:
//!
//! 1. keys seen for the first time get a fresh entry from the template;
//! 2. keys that disappeared have their nodes removed and their scope
//!    disposed;
//! 3. keys present in both keep their nodes untouched.
//!
//! [`list_indexed`] also compares each position's item with the one it was
//! rendered from, and replaces the entry when they differ.
//!
//! The [`MoveStrategy`] then decides which surviving entries can stay put;
//! everything else is moved (or, for new entries, inserted) in one
//! right-to-left pass, so each node lands before its already-placed
//! successor.
//!
//! Templates run before the list is touched. If one panics, the entries
//! created so far are disposed and the list keeps its previous rendering.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use super::strategy::{MoveStrategy, StrategyKind};
use super::target::{RenderTarget, Rendered};
use crate::reactive::{effect, on_cleanup, untrack, Effect, Memo, Runtime, Scope, Signal};

/// Where a list takes its items from.
///
/// Implemented for signals and memos holding a `Vec`, and for closures
/// returning one. The source is read inside the list's effect, so whatever
/// it reads becomes a dependency of the list.
pub trait ListSource<T> {
    fn snapshot(&self) -> Vec<T>;
}

impl<T: Clone + 'static> ListSource<T> for Signal<Vec<T>> {
    fn snapshot(&self) -> Vec<T> {
        self.get()
    }
}

impl<T: Clone + 'static> ListSource<T> for Memo<Vec<T>> {
    fn snapshot(&self) -> Vec<T> {
        self.get()
    }
}

impl<T, F> ListSource<T> for F
where
    F: Fn() -> Vec<T>,
{
    fn snapshot(&self) -> Vec<T> {
        self()
    }
}

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Entries created by invoking the template.
    pub created: usize,
    /// Surviving entries whose nodes were re-inserted.
    pub moved: usize,
    /// Entries destroyed because their key disappeared.
    pub removed: usize,
    /// Surviving entries left in place.
    pub kept: usize,
}

/// Per-list settings.
#[derive(Debug, Clone)]
pub struct ListOptions<N> {
    /// Node the list renders in front of. `None` renders at the end of the
    /// container.
    pub end: Option<N>,
    /// Move strategy. `None` uses the runtime config's default.
    pub strategy: Option<StrategyKind>,
}

impl<N> Default for ListOptions<N> {
    fn default() -> Self {
        Self {
            end: None,
            strategy: None,
        }
    }
}

struct Entry<N> {
    nodes: Rendered<N>,
    scope: Scope,
    /// The item the nodes were rendered from, kept when the list compares
    /// items.
    item: Option<Box<dyn Any>>,
}

/// Compares a surviving entry's item with the item now at its key.
trait ItemCheck<T> {
    fn remember(&self, item: &T) -> Box<dyn Any>;
    fn unchanged(&self, rendered: &dyn Any, item: &T) -> bool;
}

struct ByValue;

impl<T: PartialEq + Clone + 'static> ItemCheck<T> for ByValue {
    fn remember(&self, item: &T) -> Box<dyn Any> {
        Box::new(item.clone())
    }

    fn unchanged(&self, rendered: &dyn Any, item: &T) -> bool {
        rendered
            .downcast_ref::<T>()
            .is_some_and(|rendered| rendered == item)
    }
}

struct ListState<K, N> {
    entries: IndexMap<K, Entry<N>>,
    stats: ReconcileStats,
}

/// A keyed, reactive rendering of a collection.
///
/// A list created under an owner lives until that owner disposes it, even
/// if the handle is dropped. Without an owner, dropping the last handle
/// tears it down.
pub struct List<K, N> {
    state: Rc<RefCell<ListState<K, N>>>,
    scope: Scope,
    effect: Effect,
    strategy: StrategyKind,
}

/// Render `source` into `target`, one entry per key.
///
/// `template(item, index)` renders an item the first time its key appears;
/// `key(item, index)` extracts the key. When several items share a key,
/// the last one wins.
pub fn list<T, K, R, S, F, KF>(target: R, source: S, template: F, key: KF) -> List<K, R::Node>
where
    T: 'static,
    K: Eq + Hash + Clone + 'static,
    R: RenderTarget + 'static,
    S: ListSource<T> + 'static,
    F: Fn(&T, usize) -> Rendered<R::Node> + 'static,
    KF: Fn(&T, usize) -> K + 'static,
{
    list_with_options(target, source, template, key, ListOptions::default())
}

/// [`list`] keyed by position.
///
/// A position whose item changed (by `PartialEq`) is rendered again, so a
/// reorder re-renders every shifted position. Supply a real key to get
/// moves instead.
pub fn list_indexed<T, R, S, F>(target: R, source: S, template: F) -> List<usize, R::Node>
where
    T: PartialEq + Clone + 'static,
    R: RenderTarget + 'static,
    S: ListSource<T> + 'static,
    F: Fn(&T, usize) -> Rendered<R::Node> + 'static,
{
    build(
        target,
        source,
        template,
        |_: &T, index| index,
        ListOptions::default(),
        Some(Box::new(ByValue)),
    )
}

/// [`list`] with explicit [`ListOptions`].
pub fn list_with_options<T, K, R, S, F, KF>(
    target: R,
    source: S,
    template: F,
    key: KF,
    options: ListOptions<R::Node>,
) -> List<K, R::Node>
where
    T: 'static,
    K: Eq + Hash + Clone + 'static,
    R: RenderTarget + 'static,
    S: ListSource<T> + 'static,
    F: Fn(&T, usize) -> Rendered<R::Node> + 'static,
    KF: Fn(&T, usize) -> K + 'static,
{
    build(target, source, template, key, options, None)
}

fn build<T, K, R, S, F, KF>(
    target: R,
    source: S,
    template: F,
    key: KF,
    options: ListOptions<R::Node>,
    check: Option<Box<dyn ItemCheck<T>>>,
) -> List<K, R::Node>
where
    T: 'static,
    K: Eq + Hash + Clone + 'static,
    R: RenderTarget + 'static,
    S: ListSource<T> + 'static,
    F: Fn(&T, usize) -> Rendered<R::Node> + 'static,
    KF: Fn(&T, usize) -> K + 'static,
{
    let strategy = options
        .strategy
        .unwrap_or_else(|| Runtime::config().default_strategy);
    let target = Rc::new(target);
    let state = Rc::new(RefCell::new(ListState {
        entries: IndexMap::new(),
        stats: ReconcileStats::default(),
    }));

    let scope = Scope::new();
    let effect = scope.run(|| {
        let (owned_target, owned_state) = (Rc::clone(&target), Rc::clone(&state));
        on_cleanup(move || teardown(&*owned_target, &owned_state));

        let state = Rc::clone(&state);
        let end = options.end;
        effect(move || {
            let items = source.snapshot();
            untrack(|| {
                let pass = Pass {
                    target: &*target,
                    template: &template,
                    key: &key,
                    end: end.as_ref(),
                    strategy: strategy.strategy(),
                    check: check.as_deref(),
                };
                pass.run(&state, &items);
            });
        })
    });

    List {
        state,
        scope,
        effect,
        strategy,
    }
}

impl<K, N> List<K, N>
where
    K: Clone,
    N: Clone,
{
    /// Number of entries currently rendered.
    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in rendered order.
    pub fn keys(&self) -> Vec<K> {
        self.state.borrow().entries.keys().cloned().collect()
    }

    /// Every rendered node in order, fragments flattened.
    pub fn nodes(&self) -> Vec<N> {
        self.state
            .borrow()
            .entries
            .values()
            .flat_map(|entry| entry.nodes.iter().cloned())
            .collect()
    }

    /// Counts from the most recent reconciliation pass.
    pub fn stats(&self) -> ReconcileStats {
        self.state.borrow().stats
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// The backing effect.
    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    /// Stop reacting to the source and destroy every entry.
    pub fn dispose(&self) {
        self.scope.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.scope.is_disposed()
    }
}

impl<K, N> List<K, N>
where
    K: Eq + Hash,
    N: Clone,
{
    /// Nodes rendered for `key`, if it is present.
    pub fn entry_nodes(&self, key: &K) -> Option<Rendered<N>> {
        self.state
            .borrow()
            .entries
            .get(key)
            .map(|entry| entry.nodes.clone())
    }
}

/// Everything one reconciliation pass needs besides the state.
struct Pass<'a, T, K, R: RenderTarget> {
    target: &'a R,
    template: &'a dyn Fn(&T, usize) -> Rendered<R::Node>,
    key: &'a dyn Fn(&T, usize) -> K,
    end: Option<&'a R::Node>,
    strategy: &'a dyn MoveStrategy,
    check: Option<&'a dyn ItemCheck<T>>,
}

impl<T, K, R> Pass<'_, T, K, R>
where
    K: Eq + Hash + Clone,
    R: RenderTarget,
{
    fn run(&self, state: &RefCell<ListState<K, R::Node>>, items: &[T]) {
        let order = self.key_order(items);

        // (position in `order`, item index) for every key that needs a new
        // entry.
        let fresh: Vec<(usize, usize)> = {
            let state = state.borrow();
            order
                .iter()
                .enumerate()
                .filter_map(|(position, (key, &index))| {
                    self.needs_render(state.entries.get(key), &items[index])
                        .then_some((position, index))
                })
                .collect()
        };

        if fresh.is_empty() {
            let mut state = state.borrow_mut();
            if state.entries.len() == order.len() && state.entries.keys().eq(order.keys()) {
                state.stats = ReconcileStats {
                    kept: order.len(),
                    ..ReconcileStats::default()
                };
                return;
            }
        }

        // The previous entries stay in the state while templates run, so
        // template code may inspect the list.
        let created = self.render(&fresh, items);

        let previous = std::mem::take(&mut state.borrow_mut().entries);
        let (entries, old_positions, leftovers, mut stats) = self.merge(previous, &order, created);

        for entry in &leftovers {
            for node in &entry.nodes {
                self.target.remove(node);
            }
        }

        let stable = self.strategy.stable(&old_positions);
        {
            let mut state = state.borrow_mut();
            state.entries = entries;
            self.place(&state.entries, &old_positions, &stable, &mut stats);
            state.stats = stats;
        }

        // Cleanups run last; the list already shows the new collection.
        for entry in leftovers {
            entry.scope.dispose();
        }

        debug!(
            created = stats.created,
            moved = stats.moved,
            removed = stats.removed,
            kept = stats.kept,
            "list reconciled"
        );
    }

    /// Keys in render order, each mapped to the index of the item that
    /// renders it. A repeated key keeps its last occurrence.
    fn key_order(&self, items: &[T]) -> IndexMap<K, usize> {
        let mut order = IndexMap::with_capacity(items.len());
        for (index, item) in items.iter().enumerate().rev() {
            order.entry((self.key)(item, index)).or_insert(index);
        }
        order.reverse();
        order
    }

    fn needs_render(&self, entry: Option<&Entry<R::Node>>, item: &T) -> bool {
        let Some(entry) = entry else {
            return true;
        };
        match (self.check, &entry.item) {
            (Some(check), Some(rendered)) => !check.unchanged(&**rendered, item),
            _ => false,
        }
    }

    /// Run the template for every fresh position. On panic, entries created
    /// so far are disposed before the panic continues.
    fn render(&self, fresh: &[(usize, usize)], items: &[T]) -> HashMap<usize, Entry<R::Node>> {
        let mut created = HashMap::with_capacity(fresh.len());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            for &(position, index) in fresh {
                created.insert(position, self.create(&items[index], index));
            }
        }));

        if let Err(payload) = outcome {
            debug!(created = created.len(), "list template panicked; keeping previous entries");
            for (_, entry) in created {
                entry.scope.dispose();
            }
            panic::resume_unwind(payload);
        }
        created
    }

    /// Pair every key in `order` with its entry. Returns the entries, each
    /// entry's previous position (`None` when new), and the entries that
    /// are no longer rendered.
    #[allow(clippy::type_complexity)]
    fn merge(
        &self,
        previous: IndexMap<K, Entry<R::Node>>,
        order: &IndexMap<K, usize>,
        mut created: HashMap<usize, Entry<R::Node>>,
    ) -> (
        IndexMap<K, Entry<R::Node>>,
        Vec<Option<usize>>,
        Vec<Entry<R::Node>>,
        ReconcileStats,
    ) {
        let mut stats = ReconcileStats::default();

        let mut position: HashMap<K, usize> = HashMap::with_capacity(previous.len());
        let mut slots: Vec<Option<Entry<R::Node>>> = Vec::with_capacity(previous.len());
        for (i, (key, entry)) in previous.into_iter().enumerate() {
            position.insert(key, i);
            slots.push(Some(entry));
        }

        let mut entries = IndexMap::with_capacity(order.len());
        let mut old_positions = Vec::with_capacity(order.len());
        let mut leftovers = Vec::new();
        for (at, key) in order.keys().enumerate() {
            let old = position.get(key).copied();
            let reused = old.and_then(|old| slots[old].take());

            let (entry, from) = match (created.remove(&at), reused) {
                (Some(entry), replaced) => {
                    stats.created += 1;
                    leftovers.extend(replaced);
                    (entry, None)
                }
                (None, Some(entry)) => (entry, old),
                (None, None) => continue,
            };
            old_positions.push(from);
            entries.insert(key.clone(), entry);
        }

        leftovers.extend(slots.into_iter().flatten());
        stats.removed = leftovers.len();

        (entries, old_positions, leftovers, stats)
    }

    /// Insert every unstable entry, right to left, before its successor.
    fn place(
        &self,
        entries: &IndexMap<K, Entry<R::Node>>,
        old_positions: &[Option<usize>],
        stable: &[bool],
        stats: &mut ReconcileStats,
    ) {
        let mut anchor = self.end.cloned();
        for (i, entry) in entries.values().enumerate().rev() {
            if stable[i] {
                stats.kept += 1;
            } else {
                for node in &entry.nodes {
                    self.target.insert_before(node, anchor.as_ref());
                }
                if old_positions[i].is_some() {
                    stats.moved += 1;
                }
            }
            if let Some(first) = entry.nodes.first() {
                anchor = Some(first.clone());
            }
        }
    }

    fn create(&self, item: &T, index: usize) -> Entry<R::Node> {
        let scope = Scope::detached();
        let nodes = scope.run_untracked(|| (self.template)(item, index));
        Entry {
            nodes,
            scope,
            item: self.check.map(|check| check.remember(item)),
        }
    }
}

fn destroy<R: RenderTarget>(target: &R, entry: Entry<R::Node>) {
    for node in &entry.nodes {
        target.remove(node);
    }
    entry.scope.dispose();
}

fn teardown<K, R: RenderTarget>(target: &R, state: &RefCell<ListState<K, R::Node>>) {
    let entries = std::mem::take(&mut state.borrow_mut().entries);
    let removed = entries.len();
    for (_, entry) in entries {
        destroy(target, entry);
    }
    debug!(removed, "list torn down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;
    use std::cell::Cell;

    use crate::list::MemoryTarget;
    use crate::reactive::{batch, pulse};

    fn text_list(
        target: &MemoryTarget,
        items: &Signal<Vec<&'static str>>,
    ) -> List<&'static str, crate::list::TextNode> {
        let t = target.clone();
        list(
            target.clone(),
            items.clone(),
            move |item: &&'static str, _| smallvec![t.create_text(*item)],
            |item: &&'static str, _| *item,
        )
    }

    #[test]
    fn initial_render_follows_source_order() {
        let target = MemoryTarget::new();
        let items = pulse(vec!["a", "b", "c"]);
        let list = text_list(&target, &items);

        assert_eq!(target.texts(), vec!["a", "b", "c"]);
        assert_eq!(list.keys(), vec!["a", "b", "c"]);
        assert_eq!(
            list.stats(),
            ReconcileStats {
                created: 3,
                ..ReconcileStats::default()
            }
        );
    }

    #[test]
    fn unchanged_keys_touch_nothing() {
        let target = MemoryTarget::new();
        let items = pulse(vec!["a", "b"]);
        let list = text_list(&target, &items);
        target.reset_counters();

        items.set(vec!["a", "b"]);
        assert_eq!(target.insert_count(), 0);
        assert_eq!(target.created_count(), 0);
        assert_eq!(list.stats().kept, 2);
    }

    #[test]
    fn moving_one_entry_moves_one_node() {
        let target = MemoryTarget::new();
        let items = pulse(vec!["a", "b", "c", "d", "e"]);
        let list = text_list(&target, &items);
        target.reset_counters();

        items.set(vec!["e", "a", "b", "c", "d"]);
        assert_eq!(target.texts(), vec!["e", "a", "b", "c", "d"]);
        assert_eq!(target.insert_count(), 1);
        assert_eq!(target.created_count(), 0);
        assert_eq!(list.stats().moved, 1);
        assert_eq!(list.stats().kept, 4);
    }

    #[test]
    fn mixed_update() {
        let target = MemoryTarget::new();
        let items = pulse(vec!["a", "b", "c", "d"]);
        let list = text_list(&target, &items);
        let before_c = list.entry_nodes(&"c").unwrap()[0].clone();

        items.set(vec!["d", "x", "c", "a"]);
        assert_eq!(target.texts(), vec!["d", "x", "c", "a"]);
        assert_eq!(list.entry_nodes(&"c").unwrap()[0], before_c);

        let stats = list.stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.kept + stats.moved, 3);
    }

    #[test]
    fn fragments_move_together() {
        let target = MemoryTarget::new();
        let items = pulse(vec![1, 2]);
        let t = target.clone();
        let _list = list(
            target.clone(),
            items.clone(),
            move |n: &i32, _| {
                smallvec![
                    t.create_text(format!("{n}-head")),
                    t.create_text(format!("{n}-tail"))
                ]
            },
            |n: &i32, _| *n,
        );

        items.set(vec![2, 1]);
        assert_eq!(target.texts(), vec!["2-head", "2-tail", "1-head", "1-tail"]);
    }

    #[test]
    fn end_marker_bounds_the_list() {
        let target = MemoryTarget::new();
        let footer = target.create_text("footer");
        target.insert_before(&footer, None);

        let items = pulse(vec!["a", "b"]);
        let t = target.clone();
        let _list = list_with_options(
            target.clone(),
            items.clone(),
            move |item: &&'static str, _| smallvec![t.create_text(*item)],
            |item: &&'static str, _| *item,
            ListOptions {
                end: Some(footer.clone()),
                strategy: None,
            },
        );
        assert_eq!(target.texts(), vec!["a", "b", "footer"]);

        items.set(vec!["b", "c", "a"]);
        assert_eq!(target.texts(), vec!["b", "c", "a", "footer"]);
    }

    #[test]
    fn move_all_strategy_reinserts_survivors() {
        let target = MemoryTarget::new();
        let items = pulse(vec!["a", "b", "c"]);
        let t = target.clone();
        let list = list_with_options(
            target.clone(),
            items.clone(),
            move |item: &&'static str, _| smallvec![t.create_text(*item)],
            |item: &&'static str, _| *item,
            ListOptions {
                end: None,
                strategy: Some(StrategyKind::MoveAll),
            },
        );
        target.reset_counters();

        items.set(vec!["c", "a", "b"]);
        assert_eq!(target.texts(), vec!["c", "a", "b"]);
        assert_eq!(target.insert_count(), 3);
        assert_eq!(list.strategy(), StrategyKind::MoveAll);
    }

    #[test]
    fn removed_entries_run_template_cleanups() {
        let target = MemoryTarget::new();
        let items = pulse(vec![1, 2, 3]);
        let cleaned = Rc::new(RefCell::new(Vec::new()));

        let (t, log) = (target.clone(), cleaned.clone());
        let _list = list(
            target.clone(),
            items.clone(),
            move |n: &i32, _| {
                let (log, n) = (log.clone(), *n);
                on_cleanup(move || log.borrow_mut().push(n));
                smallvec![t.create_text(n.to_string())]
            },
            |n: &i32, _| *n,
        );

        items.set(vec![1, 3]);
        assert_eq!(*cleaned.borrow(), vec![2]);
    }

    #[test]
    fn template_effects_do_not_subscribe_the_list() {
        let target = MemoryTarget::new();
        let items = pulse(vec![1]);
        let label = pulse("x");
        let renders = Rc::new(Cell::new(0));

        let (t, l, counter) = (target.clone(), label.clone(), renders.clone());
        let list = list(
            target.clone(),
            items.clone(),
            move |n: &i32, _| {
                counter.set(counter.get() + 1);
                smallvec![t.create_text(format!("{n}{}", l.get()))]
            },
            |n: &i32, _| *n,
        );

        label.set("y");
        assert_eq!(renders.get(), 1);
        assert_eq!(list.effect().run_count(), 1);
    }

    #[test]
    fn dispose_destroys_every_entry() {
        let target = MemoryTarget::new();
        let items = pulse(vec!["a", "b"]);
        let list = text_list(&target, &items);

        list.dispose();
        assert!(target.is_empty());
        assert!(list.is_empty());
        assert!(list.effect().is_disposed());

        items.set(vec!["c"]);
        assert!(target.is_empty());
    }

    #[test]
    fn list_inside_effect_is_torn_down_on_rerun() {
        let target = MemoryTarget::new();
        let show = pulse(true);
        let items = pulse(vec!["a"]);

        let (s, tgt, it) = (show.clone(), target.clone(), items.clone());
        let _outer = effect(move || {
            if s.get() {
                let t = tgt.clone();
                list(
                    tgt.clone(),
                    it.clone(),
                    move |item: &&'static str, _| smallvec![t.create_text(*item)],
                    |item: &&'static str, _| *item,
                );
            }
        });
        assert_eq!(target.texts(), vec!["a"]);

        show.set(false);
        assert!(target.is_empty());
        assert_eq!(items.subscriber_count(), 0);
    }

    #[test]
    fn closure_source_is_tracked() {
        let target = MemoryTarget::new();
        let count = pulse(2usize);
        let t = target.clone();
        let c = count.clone();
        let list = list_indexed(
            target.clone(),
            move || (0..c.get()).collect::<Vec<usize>>(),
            move |n: &usize, _| smallvec![t.create_text(n.to_string())],
        );
        assert_eq!(list.len(), 2);

        batch(|| {
            count.set(5);
            count.set(3);
        });
        assert_eq!(target.texts(), vec!["0", "1", "2"]);
        assert_eq!(list.effect().run_count(), 2);
    }

    #[test]
    fn indexed_list_rerenders_changed_positions() {
        let target = MemoryTarget::new();
        let items = pulse(vec!["a", "b", "c"]);
        let t = target.clone();
        let list = list_indexed(
            target.clone(),
            items.clone(),
            move |item: &&'static str, _| smallvec![t.create_text(*item)],
        );
        let middle = list.entry_nodes(&1).unwrap()[0].clone();

        items.set(vec!["c", "b", "a"]);
        assert_eq!(target.texts(), vec!["c", "b", "a"]);
        assert_eq!(list.nodes(), target.children());
        assert_eq!(list.entry_nodes(&1).unwrap()[0], middle);
        assert_eq!(
            list.stats(),
            ReconcileStats {
                created: 2,
                moved: 0,
                removed: 2,
                kept: 1,
            }
        );
    }

    #[test]
    fn panicking_template_keeps_previous_entries() {
        let target = MemoryTarget::new();
        let items = pulse(vec![1, 2, 3]);
        let cleaned = Rc::new(RefCell::new(Vec::new()));

        let (t, log) = (target.clone(), cleaned.clone());
        let list = list(
            target.clone(),
            items.clone(),
            move |n: &i32, _| {
                assert_ne!(*n, 99, "cannot render 99");
                let (log, n) = (log.clone(), *n);
                on_cleanup(move || log.borrow_mut().push(n));
                smallvec![t.create_text(n.to_string())]
            },
            |n: &i32, _| *n,
        );

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            items.set(vec![4, 1, 99, 2, 3]);
        }));
        assert!(result.is_err());

        // The entry for 4 was rendered before the panic and then discarded.
        assert_eq!(*cleaned.borrow(), vec![4]);
        assert_eq!(list.keys(), vec![1, 2, 3]);
        assert_eq!(target.texts(), vec!["1", "2", "3"]);

        items.set(vec![1, 2, 3]);
        assert_eq!(target.texts(), vec!["1", "2", "3"]);
        assert_eq!(list.nodes(), target.children());

        items.set(vec![3, 5]);
        assert_eq!(target.texts(), vec!["3", "5"]);
        assert_eq!(*cleaned.borrow(), vec![4, 1, 2]);
    }
}
