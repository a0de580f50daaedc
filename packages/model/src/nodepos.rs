//! # Position Addressing
//!
//! A [`Path`] is a tree-independent coordinate: every element but the last is
//! a child index used to descend from the container, the last one is an
//! offset inside the node reached (child insertion index for elements,
//! character offset for text).
//!
//! ```text
//! <div><b>Hello</b><s>World!</s></div>
//!
//! [1]       between <b> and <s>
//! [0, 0, 0] before "Hello"
//! [0, 0, 1] between "H" and "e"
//! ```
//!
//! A [`NodePos`] is a path resolved against one tree instance.

use crate::error::StructureError;
use crate::tree::{NodeId, NodeKind, Tree};
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

pub type Path = Vec<usize>;

/// Node reference plus offset inside that node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodePos {
    pub node: NodeId,
    pub offset: usize,
}

/// Span between two paths
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    pub s: Path,
    pub e: Path,
}

impl Range {
    pub fn new(s: Path, e: Path) -> Self {
        Self { s, e }
    }

    /// Zero-width range at `path`
    pub fn collapsed(path: Path) -> Self {
        Self {
            s: path.clone(),
            e: path,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.s == self.e
    }
}

/// Resolves `path` against `container`
pub fn to_node_pos(tree: &Tree, path: &[usize], container: NodeId) -> Result<NodePos, StructureError> {
    let Some((&offset, indices)) = path.split_last() else {
        return Err(StructureError::EmptyPath);
    };

    let mut node = container;
    for &index in indices {
        let children = tree.children(node)?;
        node = *children.get(index).ok_or(StructureError::IndexOutOfBounds {
            index,
            len: children.len(),
        })?;
    }

    let len = tree.length_of(node)?;
    if offset > len {
        return Err(StructureError::OffsetOutOfBounds { offset, len });
    }

    Ok(NodePos { node, offset })
}

pub fn is_left_most(pos: &NodePos) -> bool {
    pos.offset == 0
}

pub fn is_right_most(tree: &Tree, pos: &NodePos) -> Result<bool, StructureError> {
    Ok(pos.offset == tree.length_of(pos.node)?)
}

/// Event kind emitted by [`nodes_between`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Open,
    Close,
    Text,
}

/// Walks the whole tree under `container` in document order and yields the
/// nodes met after entering `start.node` and before leaving `end.node`:
/// `Open`/`Close` around elements, `Text` for text nodes.
///
/// Yields nothing when `start == end`.
pub fn nodes_between(tree: &Tree, container: NodeId, start: NodePos, end: NodePos) -> NodesBetween<'_> {
    let stack = if start == end {
        Vec::new()
    } else {
        vec![Step::Enter(container)]
    };

    NodesBetween {
        tree,
        start,
        end,
        in_range: false,
        stack,
    }
}

enum Step {
    Enter(NodeId),
    Open(NodeId),
    Close(NodeId),
    Leave(NodeId),
}

/// Lazy, single-pass iterator returned by [`nodes_between`]
pub struct NodesBetween<'a> {
    tree: &'a Tree,
    start: NodePos,
    end: NodePos,
    in_range: bool,
    stack: Vec<Step>,
}

impl NodesBetween<'_> {
    fn is_element(&self, id: NodeId) -> bool {
        matches!(self.tree.kind(id), Ok(NodeKind::Element { .. }))
    }
}

impl Iterator for NodesBetween<'_> {
    type Item = (NodeId, TagType);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        while let Some(step) = self.stack.pop() {
            match step {
                Step::Enter(node) => {
                    if node == self.start.node {
                        self.in_range = true;
                    }
                    self.stack.push(Step::Leave(node));

                    match tree.kind(node) {
                        Ok(NodeKind::Text { .. }) => {
                            if self.in_range {
                                return Some((node, TagType::Text));
                            }
                        }
                        Ok(NodeKind::Element { children, .. }) => {
                            for &child in children.iter().rev() {
                                self.stack.push(Step::Close(child));
                                self.stack.push(Step::Enter(child));
                                self.stack.push(Step::Open(child));
                            }
                        }
                        Err(_) => {}
                    }
                }
                Step::Open(node) => {
                    if self.in_range && self.is_element(node) {
                        return Some((node, TagType::Open));
                    }
                }
                Step::Close(node) => {
                    if self.in_range && self.is_element(node) {
                        return Some((node, TagType::Close));
                    }
                }
                Step::Leave(node) => {
                    if node == self.end.node {
                        self.in_range = false;
                    }
                }
            }
        }

        None
    }
}

impl FusedIterator for NodesBetween<'_> {}
