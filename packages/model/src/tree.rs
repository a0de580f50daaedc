//! # Node Tree
//!
//! The mutable document tree. Nodes live in a `slotmap` arena and refer to
//! each other by [`NodeId`]: a parent owns the ordered list of its children,
//! and every node keeps a non-owning `parent` link used for upward path
//! computation.
//!
//! Detached nodes (created but not inserted, or removed) stay in the arena
//! until [`Tree::discard`] frees them, so a removed subtree can still be
//! traversed, copied out with [`Tree::to_node`] or inserted again.

use crate::error::StructureError;
use crate::node::{Attrs, Element, Node, Text, TEXT_TYPE};
use crate::nodepos::{NodePos, Path};
use slotmap::{new_key_type, SlotMap};
use std::collections::HashSet;
use tracing::debug;

new_key_type! {
    /// Handle of a node inside one [`Tree`]
    pub struct NodeId;
}

/// Payload of a tree node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element {
        kind: String,
        attrs: Option<Attrs>,
        children: Vec<NodeId>,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
}

/// Arena-backed, single-rooted document tree
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: SlotMap<NodeId, NodeData>,
    root: NodeId,
}

impl Tree {
    /// Takes ownership of `root` and everything below it
    pub fn new(root: Node) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = alloc(&mut nodes, root, None);
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes in the arena, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a detached copy of `node`
    pub fn create(&mut self, node: Node) -> NodeId {
        alloc(&mut self.nodes, node, None)
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind, StructureError> {
        self.data(id).map(|data| &data.kind)
    }

    /// Type name of the node
    pub fn node_type(&self, id: NodeId) -> Result<&str, StructureError> {
        Ok(match self.kind(id)? {
            NodeKind::Element { kind, .. } => kind,
            NodeKind::Text { .. } => TEXT_TYPE,
        })
    }

    pub fn is_text(&self, id: NodeId) -> Result<bool, StructureError> {
        Ok(matches!(self.kind(id)?, NodeKind::Text { .. }))
    }

    pub fn text(&self, id: NodeId) -> Result<Option<&str>, StructureError> {
        Ok(match self.kind(id)? {
            NodeKind::Text { text } => Some(text),
            NodeKind::Element { .. } => None,
        })
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, StructureError> {
        self.data(id).map(|data| data.parent)
    }

    /// Children of an element; text nodes have none
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], StructureError> {
        Ok(match self.kind(id)? {
            NodeKind::Element { children, .. } => children,
            NodeKind::Text { .. } => &[],
        })
    }

    /// Text length in characters, or child count for elements
    pub fn length_of(&self, id: NodeId) -> Result<usize, StructureError> {
        Ok(match self.kind(id)? {
            NodeKind::Text { text } => text.chars().count(),
            NodeKind::Element { children, .. } => children.len(),
        })
    }

    /// Position of the node within its parent's children
    pub fn index_of(&self, id: NodeId) -> Result<usize, StructureError> {
        let parent = self.parent(id)?.ok_or(StructureError::NoParent)?;
        self.children(parent)?
            .iter()
            .position(|child| *child == id)
            .ok_or(StructureError::NotInParent)
    }

    /// Number of parent links between the node and the top of its tree
    pub fn depth(&self, id: NodeId) -> Result<usize, StructureError> {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current)? {
            depth += 1;
            current = parent;
        }
        Ok(depth)
    }

    /// Serializes the subtree. Attributes are not emitted.
    pub fn to_xml(&self, id: NodeId) -> Result<String, StructureError> {
        self.data(id)?;
        let mut out = String::new();
        self.write_xml(id, &mut out);
        Ok(out)
    }

    pub(crate) fn write_xml(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(id) else {
            return;
        };

        match &data.kind {
            NodeKind::Text { text } => out.push_str(text),
            NodeKind::Element { kind, children, .. } => {
                out.push('<');
                out.push_str(kind);
                out.push('>');
                for child in children {
                    self.write_xml(*child, out);
                }
                out.push_str("</");
                out.push_str(kind);
                out.push('>');
            }
        }
    }

    /// Path of child indices leading from `container` down to `node`
    pub fn path_of(&self, node: NodeId, container: NodeId) -> Result<Path, StructureError> {
        let mut path = Vec::new();
        let mut current = node;

        while current != container {
            let parent = self.parent(current)?.ok_or(StructureError::NotInContainer)?;
            let index = self
                .children(parent)?
                .iter()
                .position(|child| *child == current)
                .ok_or(StructureError::NotInParent)?;
            path.push(index);
            current = parent;
        }

        path.reverse();
        Ok(path)
    }

    /// Splits a text node at `pos`, keeping the prefix in place and inserting
    /// the suffix right after it. Positions on a node edge (or on an element)
    /// are left alone and return `None`.
    pub fn split_text(&mut self, pos: &NodePos) -> Result<Option<NodeId>, StructureError> {
        let Some(text) = self.text(pos.node)? else {
            return Ok(None);
        };

        let len = text.chars().count();
        if pos.offset == 0 || pos.offset >= len {
            return Ok(None);
        }

        if self.parent(pos.node)?.is_none() {
            return Err(StructureError::NoParent);
        }

        let at = byte_offset(text, pos.offset);
        let suffix = text[at..].to_string();
        if let Some(NodeData {
            kind: NodeKind::Text { text },
            ..
        }) = self.nodes.get_mut(pos.node)
        {
            text.truncate(at);
        }

        debug!(offset = pos.offset, "Splitting text node");
        let next = self.create(Node::text(suffix));
        self.insert_after(pos.node, vec![next])?;
        Ok(Some(next))
    }

    /// Inserts detached nodes right before `next`
    pub fn insert_before(
        &mut self,
        next: NodeId,
        nodes: Vec<NodeId>,
    ) -> Result<Vec<NodeId>, StructureError> {
        let index = self.index_of(next)?;
        let parent = self.parent(next)?.ok_or(StructureError::NoParent)?;
        self.splice_in(parent, index, nodes)
    }

    /// Inserts detached nodes right after `prev`
    pub fn insert_after(
        &mut self,
        prev: NodeId,
        nodes: Vec<NodeId>,
    ) -> Result<Vec<NodeId>, StructureError> {
        let index = self.index_of(prev)?;
        let parent = self.parent(prev)?.ok_or(StructureError::NoParent)?;
        self.splice_in(parent, index + 1, nodes)
    }

    /// Appends detached nodes to the end of an element's children
    pub fn append_children(
        &mut self,
        parent: NodeId,
        nodes: Vec<NodeId>,
    ) -> Result<Vec<NodeId>, StructureError> {
        let index = match self.kind(parent)? {
            NodeKind::Element { children, .. } => children.len(),
            NodeKind::Text { .. } => return Err(StructureError::NotAnElement),
        };
        self.splice_in(parent, index, nodes)
    }

    /// Unlinks the node from its parent. The node keeps its own children.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), StructureError> {
        let index = self.index_of(id)?;
        let parent = self.parent(id)?.ok_or(StructureError::NoParent)?;

        if let Some(NodeData {
            kind: NodeKind::Element { children, .. },
            ..
        }) = self.nodes.get_mut(parent)
        {
            children.remove(index);
        }
        if let Some(data) = self.nodes.get_mut(id) {
            data.parent = None;
        }

        Ok(())
    }

    /// Copies the subtree out as an owned node
    pub fn to_node(&self, id: NodeId) -> Result<Node, StructureError> {
        Ok(match self.kind(id)? {
            NodeKind::Text { text } => Node::Text(Text { text: text.clone() }),
            NodeKind::Element {
                kind,
                attrs,
                children,
            } => Node::Element(Element {
                kind: kind.clone(),
                attrs: attrs.clone(),
                children: children
                    .iter()
                    .map(|child| self.to_node(*child))
                    .collect::<Result<_, _>>()?,
            }),
        })
    }

    /// Frees a detached subtree. Its ids become unknown to the tree.
    pub fn discard(&mut self, id: NodeId) -> Result<(), StructureError> {
        if self.parent(id)?.is_some() || id == self.root {
            return Err(StructureError::AlreadyAttached);
        }

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(data) = self.nodes.remove(current) {
                if let NodeKind::Element { children, .. } = data.kind {
                    pending.extend(children);
                }
            }
        }

        Ok(())
    }

    fn data(&self, id: NodeId) -> Result<&NodeData, StructureError> {
        self.nodes.get(id).ok_or(StructureError::UnknownNode)
    }

    /// Splices detached nodes into `parent` at `index`, after checking every
    /// one of them so a rejected insert leaves the tree untouched.
    fn splice_in(
        &mut self,
        parent: NodeId,
        index: usize,
        nodes: Vec<NodeId>,
    ) -> Result<Vec<NodeId>, StructureError> {
        let len = self.length_of(parent)?;
        if index > len {
            return Err(StructureError::IndexOutOfBounds { index, len });
        }

        let mut seen = HashSet::new();
        for &node in &nodes {
            if self.parent(node)?.is_some() || node == self.root || !seen.insert(node) {
                return Err(StructureError::AlreadyAttached);
            }
        }

        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if seen.contains(&current) {
                return Err(StructureError::CycleDetected);
            }
            ancestor = self.parent(current)?;
        }

        for &node in &nodes {
            if let Some(data) = self.nodes.get_mut(node) {
                data.parent = Some(parent);
            }
        }
        if let Some(NodeData {
            kind: NodeKind::Element { children, .. },
            ..
        }) = self.nodes.get_mut(parent)
        {
            children.splice(index..index, nodes.iter().copied());
        }

        Ok(nodes)
    }
}

fn alloc(nodes: &mut SlotMap<NodeId, NodeData>, node: Node, parent: Option<NodeId>) -> NodeId {
    match node {
        Node::Text(text) => nodes.insert(NodeData {
            kind: NodeKind::Text { text: text.text },
            parent,
        }),
        Node::Element(elem) => {
            let id = nodes.insert(NodeData {
                kind: NodeKind::Element {
                    kind: elem.kind,
                    attrs: elem.attrs,
                    children: Vec::new(),
                },
                parent,
            });

            let ids: Vec<NodeId> = elem
                .children
                .into_iter()
                .map(|child| alloc(nodes, child, Some(id)))
                .collect();

            if let Some(NodeData {
                kind: NodeKind::Element { children, .. },
                ..
            }) = nodes.get_mut(id)
            {
                *children = ids;
            }
            id
        }
    }
}

/// Byte index of the `offset`-th character
fn byte_offset(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map_or(text.len(), |(index, _)| index)
}
