//! # Operations
//!
//! Serializable tree mutation requests. Every applied operation yields its
//! inverse, which is itself an operation of the same shape.

use crate::node::Node;
use crate::nodepos::Range;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    /// Replace the content spanned by `range` with `value`
    Edit { range: Range, value: Vec<Node> },

    /// Relocate the content of `source` to `target` (reserved)
    Move { source: Range, target: Range },
}

impl Operation {
    pub fn edit(range: Range, value: Vec<Node>) -> Self {
        Operation::Edit { range, value }
    }

    /// Debug name for this operation
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Edit { .. } => "edit",
            Operation::Move { .. } => "move",
        }
    }
}
