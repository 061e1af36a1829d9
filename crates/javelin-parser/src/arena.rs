//! Append-only storage for syntax nodes.
//!
//! The parser allocates nodes in post-order: children are always allocated
//! before their parent, so a parent's index exceeds every child's. Indices
//! are never recycled and no node is ever freed individually; the arena is
//! written during one parse, frozen on completion, and dropped as a unit.

use std::collections::HashMap;

use crate::node::{Attribute, Node, NodeIndex, NodeKind};

/// Marker returned when an allocation would exceed the node cap.
///
/// The parser converts this into a `ResourceExhausted::ArenaCapacity`
/// diagnostic and aborts the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArenaFull;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
    attributes: HashMap<NodeIndex, Attribute>,
    node_limit: usize,
}

impl Arena {
    pub(crate) fn with_limit(node_limit: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(64),
            attributes: HashMap::new(),
            node_limit,
        }
    }

    /// Append a node and return its index.
    pub(crate) fn alloc(
        &mut self,
        kind: NodeKind,
        start: u32,
        end: u32,
        children: Vec<NodeIndex>,
    ) -> Result<NodeIndex, ArenaFull> {
        if self.nodes.len() >= self.node_limit {
            return Err(ArenaFull);
        }
        if self.nodes.len() == self.nodes.capacity() {
            // Double up to the cap rather than letting Vec overshoot it.
            let target = (self.nodes.capacity() * 2).min(self.node_limit);
            self.nodes.reserve_exact(target - self.nodes.len());
        }
        debug_assert!(children.iter().all(|c| c.as_usize() < self.nodes.len()));
        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            start,
            end,
            children: children.into_boxed_slice(),
        });
        Ok(index)
    }

    /// Append a node together with its typed payload.
    pub(crate) fn alloc_with_attribute(
        &mut self,
        kind: NodeKind,
        start: u32,
        end: u32,
        children: Vec<NodeIndex>,
        attribute: Attribute,
    ) -> Result<NodeIndex, ArenaFull> {
        let index = self.alloc(kind, start, end, children)?;
        self.attributes.insert(index, attribute);
        Ok(index)
    }

    /// Infallible lookup for an index this arena previously returned.
    pub(crate) fn get(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.as_usize()]
    }

    pub(crate) fn attribute(&self, index: NodeIndex) -> Option<&Attribute> {
        self.attributes.get(&index)
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
