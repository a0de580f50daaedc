//! # Edit Engine
//!
//! [`Model`] owns the schema and the document tree and applies
//! [`Operation`]s to it. Every successful [`Model::apply`] returns the inverse
//! operation: applying that inverse restores the previous serialized form.
//!
//! ## Edit algorithm
//!
//! ```text
//! resolve e, resolve s      (validate only, nothing mutated yet)
//! span(s, e)                (dry run: reject inverted / unbalanced ranges)
//! split e, split s          (every boundary becomes a node edge)
//! span(s, e)                (parent + child index window)
//! remove window, insert value at its start
//! ```
//!
//! A boundary sitting at the very start or end of an element is lifted to
//! the element's parent until both boundaries share one parent. Ranges that
//! would cut an element in two are rejected with
//! [`StructureError::UnbalancedRange`].

use crate::error::{ModelError, ModelResult, SchemaError, StructureError};
use crate::node::Node;
use crate::nodepos::{nodes_between, to_node_pos, NodePos, Path, Range, TagType};
use crate::observable::{Observable, SubscriptionId};
use crate::operations::Operation;
use crate::schema::Schema;
use crate::tree::{NodeId, NodeKind, Tree};
use std::collections::HashSet;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Start,
    End,
}

/// Gap before `parent.children[index]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Boundary {
    parent: NodeId,
    index: usize,
    /// Falls strictly inside a text node that is not split yet
    inside: bool,
}

/// Children `from..to` of `parent`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    parent: NodeId,
    from: usize,
    to: usize,
}

/// Schema-checked document with an inverse-producing edit API
#[derive(Debug)]
pub struct Model {
    schema: Schema,
    tree: Tree,
    subscribers: Observable<Operation>,
}

impl Model {
    /// Parses `xml` into a new document
    pub fn create(schema: Schema, xml: &str) -> ModelResult<Self> {
        let root = schema.from_xml(xml)?;
        Self::new(schema, root)
    }

    pub fn new(schema: Schema, root: Node) -> ModelResult<Self> {
        schema.check(&root)?;
        Ok(Self {
            schema,
            tree: Tree::new(root),
            subscribers: Observable::new(),
        })
    }

    pub fn from_json(schema: Schema, json: &serde_json::Value) -> ModelResult<Self> {
        let root = schema.from_json(json)?;
        Self::new(schema, root)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.tree.write_xml(self.tree.root(), &mut out);
        out
    }

    /// Owned copy of the whole document
    pub fn to_node(&self) -> ModelResult<Node> {
        Ok(self.tree.to_node(self.tree.root())?)
    }

    pub fn to_json(&self) -> ModelResult<serde_json::Value> {
        serde_json::to_value(self.to_node()?)
            .map_err(|e| SchemaError::Malformed(e.to_string()).into())
    }

    /// Registers a callback run after every applied operation
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Operation) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Applies `op` and returns its inverse. On error the document is left
    /// as it was and no subscriber is called.
    ///
    /// # Errors
    ///
    /// [`StructureError::UnbalancedRange`] for an edit whose range starts in
    /// one element and ends inside another (no paragraph merging),
    /// [`StructureError::InvertedRange`] when it ends before it starts, and
    /// [`ModelError::NotImplemented`] for [`Operation::Move`].
    #[instrument(skip(self, op), fields(op = op.name()))]
    pub fn apply(&mut self, op: &Operation) -> ModelResult<Operation> {
        let inverse = match op {
            Operation::Edit { range, value } => self.apply_edit(range, value)?,
            Operation::Move { source, target } => self.move_range(source, target)?,
        };

        self.subscribers.notify(op);
        Ok(inverse)
    }

    /// Replaces the content of `range` with `value`
    pub fn edit(&mut self, range: Range, value: Vec<Node>) -> ModelResult<Operation> {
        self.apply(&Operation::edit(range, value))
    }

    pub fn move_range(&mut self, _source: &Range, _target: &Range) -> ModelResult<Operation> {
        Err(ModelError::NotImplemented("move"))
    }

    /// Range covering `nodes`, which must be consecutive siblings
    pub fn range_of(&self, nodes: &[NodeId]) -> ModelResult<Range> {
        let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) else {
            return Err(StructureError::EmptyPath.into());
        };

        Ok(Range::new(
            self.edge_path(first, Side::Start)?,
            self.edge_path(last, Side::End)?,
        ))
    }

    /// Collapsed range at the end of the last leaf of the document
    pub fn get_content_end_range(&self) -> ModelResult<Range> {
        let mut path = Path::new();
        let mut node = self.tree.root();

        loop {
            match self.tree.kind(node)? {
                NodeKind::Text { text } => {
                    path.push(text.chars().count());
                    break;
                }
                NodeKind::Element { children, .. } => match children.last() {
                    Some(&last) => {
                        path.push(children.len() - 1);
                        node = last;
                    }
                    None => {
                        path.push(0);
                        break;
                    }
                },
            }
        }

        Ok(Range::collapsed(path))
    }

    fn apply_edit(&mut self, range: &Range, value: &[Node]) -> ModelResult<Operation> {
        for node in value {
            self.schema.check(node)?;
        }
        // Empty text has no extent, so its inverse could not remove it
        let value: Vec<Node> = value
            .iter()
            .filter(|node| !matches!(node, Node::Text(text) if text.text.is_empty()))
            .cloned()
            .collect();

        let root = self.tree.root();
        let mut end = to_node_pos(&self.tree, &range.e, root)?;
        let mut start = if range.is_collapsed() {
            end
        } else {
            to_node_pos(&self.tree, &range.s, root)?
        };

        if range.is_collapsed() && value.is_empty() {
            return Ok(Operation::edit(range.clone(), Vec::new()));
        }
        if range.s > range.e {
            return Err(StructureError::InvertedRange.into());
        }
        self.span(&start, &end)?;

        if let Some(suffix) = self.tree.split_text(&end)? {
            debug!(?suffix, "Split range end");
        }
        if range.is_collapsed() {
            start = end;
        } else if let Some(suffix) = self.tree.split_text(&start)? {
            if end.node == start.node {
                end = NodePos {
                    node: suffix,
                    offset: end.offset - start.offset,
                };
            } else if self.tree.parent(suffix)? == Some(end.node)
                && end.offset > self.tree.index_of(start.node)?
            {
                end.offset += 1;
            }
            start = NodePos {
                node: suffix,
                offset: 0,
            };
        }

        let span = self.span(&start, &end)?;
        let removed = if range.is_collapsed() {
            Vec::new()
        } else {
            self.remove_span(span)?
        };
        let inserted = self.insert_at(span.parent, span.from, value)?;

        let inverse_range = if inserted.is_empty() {
            let mut path = self.tree.path_of(span.parent, root)?;
            path.push(span.from);
            Range::collapsed(path)
        } else {
            self.range_of(&inserted)?
        };

        Ok(Operation::edit(inverse_range, removed))
    }

    /// Normalizes both positions to boundaries under a common parent
    fn span(&self, start: &NodePos, end: &NodePos) -> Result<Span, StructureError> {
        let mut s = self.boundary(start, Side::Start)?;
        let mut e = self.boundary(end, Side::End)?;

        while s.parent != e.parent {
            let s_depth = self.tree.depth(s.parent)?;
            let e_depth = self.tree.depth(e.parent)?;
            if s_depth >= e_depth {
                s = self.lift(s, Side::Start)?;
            }
            if e_depth >= s_depth {
                e = self.lift(e, Side::End)?;
            }
        }

        if s.index > e.index {
            return Err(StructureError::InvertedRange);
        }

        Ok(Span {
            parent: s.parent,
            from: s.index,
            to: e.index,
        })
    }

    fn boundary(&self, pos: &NodePos, side: Side) -> Result<Boundary, StructureError> {
        if let NodeKind::Element { .. } = self.tree.kind(pos.node)? {
            return Ok(Boundary {
                parent: pos.node,
                index: pos.offset,
                inside: false,
            });
        }

        let parent = self.tree.parent(pos.node)?.ok_or(StructureError::NoParent)?;
        let index = self.tree.index_of(pos.node)?;
        let len = self.tree.length_of(pos.node)?;

        // An empty text node counts as enclosed by both of its edges
        let (index, inside) = match side {
            Side::Start if pos.offset == 0 => (index, false),
            Side::Start if pos.offset == len => (index + 1, false),
            Side::End if pos.offset == len => (index + 1, false),
            Side::End if pos.offset == 0 => (index, false),
            _ => (index + 1, true),
        };

        Ok(Boundary {
            parent,
            index,
            inside,
        })
    }

    fn lift(&self, boundary: Boundary, side: Side) -> Result<Boundary, StructureError> {
        let on_edge = match side {
            Side::Start => boundary.index == 0,
            Side::End => boundary.index == self.tree.length_of(boundary.parent)?,
        };
        if boundary.inside || !on_edge {
            return Err(StructureError::UnbalancedRange);
        }

        let parent = self
            .tree
            .parent(boundary.parent)?
            .ok_or(StructureError::UnbalancedRange)?;
        let index = self.tree.index_of(boundary.parent)?;

        Ok(Boundary {
            parent,
            index: match side {
                Side::Start => index,
                Side::End => index + 1,
            },
            inside: false,
        })
    }

    /// Detaches the children in `span` and returns owned copies of them
    fn remove_span(&mut self, span: Span) -> ModelResult<Vec<Node>> {
        let root = self.tree.root();
        let enclosed: HashSet<NodeId> = self
            .tree
            .children(span.parent)?
            .get(span.from..span.to)
            .ok_or(StructureError::IndexOutOfBounds {
                index: span.to,
                len: self.tree.length_of(span.parent)?,
            })?
            .iter()
            .copied()
            .collect();

        let bounds = (
            NodePos {
                node: span.parent,
                offset: span.from,
            },
            NodePos {
                node: span.parent,
                offset: span.to,
            },
        );
        let targets: Vec<NodeId> = nodes_between(&self.tree, root, bounds.0, bounds.1)
            .filter(|(node, tag)| *tag != TagType::Open && enclosed.contains(node))
            .map(|(node, _)| node)
            .collect();
        debug_assert_eq!(targets.len(), enclosed.len());

        let mut removed = Vec::with_capacity(targets.len());
        for node in targets {
            self.tree.remove_node(node)?;
            removed.push(self.tree.to_node(node)?);
            self.tree.discard(node)?;
        }

        debug!(count = removed.len(), "Removed nodes");
        Ok(removed)
    }

    fn insert_at(&mut self, parent: NodeId, index: usize, value: Vec<Node>) -> ModelResult<Vec<NodeId>> {
        if value.is_empty() {
            return Ok(Vec::new());
        }

        let children = self.tree.children(parent)?;
        let next = children.get(index).copied();
        let prev = children.last().copied();

        let nodes: Vec<NodeId> = value
            .into_iter()
            .map(|node| self.tree.create(node))
            .collect();

        let inserted = match (next, prev) {
            (Some(next), _) => self.tree.insert_before(next, nodes)?,
            (None, Some(prev)) => self.tree.insert_after(prev, nodes)?,
            (None, None) => self.tree.append_children(parent, nodes)?,
        };

        debug!(count = inserted.len(), index, "Inserted nodes");
        Ok(inserted)
    }

    /// Path just before (start) or just after (end) a node's content
    fn edge_path(&self, node: NodeId, side: Side) -> ModelResult<Path> {
        let mut path = self.tree.path_of(node, self.tree.root())?;

        if self.tree.is_text(node)? {
            path.push(match side {
                Side::Start => 0,
                Side::End => self.tree.length_of(node)?,
            });
        } else if side == Side::End {
            let last = path.last_mut().ok_or(StructureError::EmptyPath)?;
            *last += 1;
        } else if path.is_empty() {
            return Err(StructureError::EmptyPath.into());
        }

        Ok(path)
    }
}
