//! # Treetext Model
//!
//! Editing core of a structured rich-text document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: allowed types, JSON/XML → Node      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ tree: arena of Element/Text nodes           │
//! │  - insert, remove, split, serialize         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ nodepos: Path ↔ NodePos, range traversal    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ model: apply Operation → inverse Operation  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Paths are the public coordinate**: node ids never leave one tree
//! 2. **Every edit is invertible**: the inverse restores the serialized form
//! 3. **Validate, then mutate**: a failed edit leaves the tree untouched
//!
//! ## Usage
//!
//! ```rust
//! use treetext_model::{Model, Node, Range, Schema, SchemaSpec};
//!
//! let schema = Schema::new(SchemaSpec::basic())?;
//! let mut model = Model::create(schema, "<root><p>Hell!</p></root>")?;
//!
//! let inverse = model.edit(Range::collapsed(vec![0, 0, 4]), vec![Node::text("o")])?;
//! assert_eq!(model.to_xml(), "<root><p>Hello!</p></root>");
//!
//! model.apply(&inverse)?;
//! assert_eq!(model.to_xml(), "<root><p>Hell!</p></root>");
//! # Ok::<(), treetext_model::ModelError>(())
//! ```

mod error;
mod model;
mod node;
mod nodepos;
mod observable;
mod operations;
mod schema;
mod tree;

pub use error::{ModelError, ModelResult, SchemaError, StructureError};
pub use model::Model;
pub use node::{Attrs, Element, Node, Text, TEXT_TYPE};
pub use nodepos::{
    is_left_most, is_right_most, nodes_between, to_node_pos, NodePos, NodesBetween, Path, Range,
    TagType,
};
pub use observable::{Observable, SubscriptionId};
pub use operations::Operation;
pub use schema::{parse_children, ContentModel, NodeSpec, Quantifier, Schema, SchemaSpec, TextSpec};
pub use tree::{NodeId, NodeKind, Tree};
