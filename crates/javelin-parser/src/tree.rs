//! The frozen result of a successful parse.
//!
//! `Tree` wraps the arena, the root index, and the source in a shared
//! allocation: cloning is cheap and readers on other threads need no
//! locking, because nothing is mutable after the parse completes.

use std::fmt;

use crate::arena::Arena;
use crate::limit::LimitTracker;
use crate::node::{Attribute, NodeIndex, NodeKind};

#[derive(Clone)]
pub struct Tree {
    inner: triomphe::Arc<TreeInner>,
}

struct TreeInner {
    source: String,
    arena: Arena,
    root: NodeIndex,
    recursion: LimitTracker,
    tokens: LimitTracker,
}

impl Tree {
    pub(crate) fn new(
        source: String,
        arena: Arena,
        root: NodeIndex,
        recursion: LimitTracker,
        tokens: LimitTracker,
    ) -> Self {
        Self {
            inner: triomphe::Arc::new(TreeInner {
                source,
                arena,
                root,
                recursion,
                tokens,
            }),
        }
    }

    /// Utilization of the recursion limit during the parse: `high` is the
    /// deepest nesting reached, `limit` the configured cap.
    pub fn recursion_limit(&self) -> LimitTracker {
        self.inner.recursion
    }

    /// Utilization of the token limit: `high` is the number of significant
    /// tokens the source lexed to.
    pub fn token_limit(&self) -> LimitTracker {
        self.inner.tokens
    }

    /// Build the upward-traversal table. The arena stores only downward
    /// edges; parents are recomputed on demand and the result can be kept
    /// alongside the tree by readers that need them.
    pub fn parent_map(&self) -> ParentMap {
        let mut parents = vec![None; self.node_count()];
        for index in 0..self.node_count() {
            let node = self.inner.arena.get(NodeIndex(index as u32));
            for child in node.children() {
                parents[child.as_usize()] = Some(NodeIndex(index as u32));
            }
        }
        ParentMap { parents }
    }

    /// The compilation unit: always the highest-indexed node.
    pub fn root(&self) -> NodeIndex {
        self.inner.root
    }

    pub fn node(&self, index: NodeIndex) -> NodeView<'_> {
        NodeView {
            tree: &self.inner,
            index,
        }
    }

    /// View a node by its position in allocation (post-) order.
    pub fn node_at(&self, index: usize) -> NodeView<'_> {
        self.node(NodeIndex(index as u32))
    }

    pub fn node_count(&self) -> usize {
        self.inner.arena.node_count()
    }

    /// The original source text.
    pub fn source(&self) -> &str {
        &self.inner.source
    }

    /// The source slice a node spans. Node offsets are UTF-16 code units;
    /// this converts them back to byte positions.
    pub fn text(&self, index: NodeIndex) -> &str {
        let node = self.inner.arena.get(index);
        let start = byte_offset(&self.inner.source, node.start());
        let end = byte_offset(&self.inner.source, node.end());
        &self.inner.source[start..end]
    }
}

fn byte_offset(source: &str, unit: u32) -> usize {
    let mut units = 0u32;
    for (byte, c) in source.char_indices() {
        if units >= unit {
            return byte;
        }
        units += c.len_utf16() as u32;
    }
    source.len()
}

/// Structural equality: the entire node set, including positions, kinds
/// and attributes. The source text itself does not participate.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.inner.root == other.inner.root && self.inner.arena == other.inner.arena
    }
}

impl Eq for Tree {}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn dump(
            f: &mut fmt::Formatter<'_>,
            tree: &TreeInner,
            index: NodeIndex,
            depth: usize,
        ) -> fmt::Result {
            let node = tree.arena.get(index);
            write!(
                f,
                "{:indent$}{:?}@{}..{}",
                "",
                node.kind(),
                node.start(),
                node.end(),
                indent = depth * 2
            )?;
            if let Some(attribute) = tree.arena.attribute(index) {
                write!(f, " {attribute:?}")?;
            }
            writeln!(f)?;
            for child in node.children() {
                dump(f, tree, *child, depth + 1)?;
            }
            Ok(())
        }
        dump(f, &self.inner, self.inner.root, 0)
    }
}

/// Child → parent table for one tree, computed by [`Tree::parent_map`].
/// The root has no parent; every other node's parent has a strictly
/// larger index, because allocation is post-order.
#[derive(Debug, Clone)]
pub struct ParentMap {
    parents: Vec<Option<NodeIndex>>,
}

impl ParentMap {
    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.parents[index.as_usize()]
    }

    /// The chain of ancestors from `index` (exclusive) up to the root.
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(self.parent(index), move |i| self.parent(*i))
    }
}

/// A borrowed view of one node.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    tree: &'a TreeInner,
    index: NodeIndex,
}

impl<'a> NodeView<'a> {
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    pub fn kind(&self) -> NodeKind {
        self.tree.arena.get(self.index).kind()
    }

    pub fn start(&self) -> u32 {
        self.tree.arena.get(self.index).start()
    }

    pub fn end(&self) -> u32 {
        self.tree.arena.get(self.index).end()
    }

    pub fn child_indices(&self) -> &'a [NodeIndex] {
        self.tree.arena.get(self.index).children()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeView<'a>> + '_ {
        let tree = self.tree;
        self.child_indices()
            .iter()
            .map(move |index| NodeView { tree, index: *index })
    }

    pub fn attribute(&self) -> Option<&'a Attribute> {
        self.tree.arena.attribute(self.index)
    }
}

impl fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{}..{}",
            self.kind(),
            self.start(),
            self.end()
        )
    }
}
