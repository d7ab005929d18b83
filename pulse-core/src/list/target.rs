//! Render targets.
//!
//! The reconciler does not create nodes itself; templates do. What it needs
//! from the render tree is the ability to place an existing node before
//! another one (or at the end) and to remove a node. Placing a node that is
//! already attached moves it, as with DOM `insertBefore`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::warn;

/// Output of a list template: a single node or a fragment of several,
/// positioned together as one entry.
pub type Rendered<N> = SmallVec<[N; 1]>;

/// The render-tree operations the list reconciler relies on.
///
/// `Node` is a handle; `PartialEq` on it must compare node identity.
pub trait RenderTarget {
    type Node: Clone + PartialEq;

    /// Place `node` immediately before `anchor`, or at the end of the
    /// container when `anchor` is `None`. Attached nodes are moved.
    fn insert_before(&self, node: &Self::Node, anchor: Option<&Self::Node>);

    /// Detach `node` from the container.
    fn remove(&self, node: &Self::Node);
}

impl<R: RenderTarget + ?Sized> RenderTarget for Rc<R> {
    type Node = R::Node;

    fn insert_before(&self, node: &Self::Node, anchor: Option<&Self::Node>) {
        (**self).insert_before(node, anchor);
    }

    fn remove(&self, node: &Self::Node) {
        (**self).remove(node);
    }
}

/// A text node owned by a [`MemoryTarget`].
///
/// Clones share the same node; equality is identity.
#[derive(Clone)]
pub struct TextNode {
    id: u64,
    text: Rc<RefCell<String>>,
}

impl TextNode {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.borrow_mut() = text.into();
    }
}

impl PartialEq for TextNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TextNode {}

impl fmt::Debug for TextNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextNode#{}({:?})", self.id, self.text.borrow())
    }
}

#[derive(Default)]
struct MemoryState {
    children: Vec<TextNode>,
    next_id: u64,
    created: usize,
    inserts: usize,
    removals: usize,
}

/// A headless container of text nodes.
///
/// Counts every creation, insertion and removal so callers can check how
/// much work a reconciliation pass did.
#[derive(Clone, Default)]
pub struct MemoryTarget {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: impl Into<String>) -> TextNode {
        let mut state = self.state.borrow_mut();
        state.created += 1;
        state.next_id += 1;
        TextNode {
            id: state.next_id,
            text: Rc::new(RefCell::new(text.into())),
        }
    }

    /// Attached nodes in order.
    pub fn children(&self) -> Vec<TextNode> {
        self.state.borrow().children.clone()
    }

    /// Text of the attached nodes in order.
    pub fn texts(&self) -> Vec<String> {
        self.state
            .borrow()
            .children
            .iter()
            .map(TextNode::text)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn created_count(&self) -> usize {
        self.state.borrow().created
    }

    pub fn insert_count(&self) -> usize {
        self.state.borrow().inserts
    }

    pub fn removal_count(&self) -> usize {
        self.state.borrow().removals
    }

    /// Zero the creation, insertion and removal counters.
    pub fn reset_counters(&self) {
        let mut state = self.state.borrow_mut();
        state.created = 0;
        state.inserts = 0;
        state.removals = 0;
    }
}

impl RenderTarget for MemoryTarget {
    type Node = TextNode;

    fn insert_before(&self, node: &TextNode, anchor: Option<&TextNode>) {
        let mut state = self.state.borrow_mut();
        state.inserts += 1;
        state.children.retain(|child| child != node);

        let at = match anchor {
            Some(anchor) => match state.children.iter().position(|child| child == anchor) {
                Some(at) => at,
                None => {
                    warn!(?anchor, "anchor is not attached; appending");
                    state.children.len()
                }
            },
            None => state.children.len(),
        };
        state.children.insert(at, node.clone());
    }

    fn remove(&self, node: &TextNode) {
        let mut state = self.state.borrow_mut();
        state.removals += 1;
        state.children.retain(|child| child != node);
    }
}

impl fmt::Debug for MemoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTarget")
            .field("children", &self.texts())
            .finish()
    }
}
