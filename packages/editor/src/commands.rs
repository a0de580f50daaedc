//! # Commands
//!
//! A [`Command`] groups the operations of one user-visible action. Executing
//! it returns another command holding the inverse of each operation, in the
//! order the operations were applied.

use serde::{Deserialize, Serialize};
use tracing::warn;
use treetext_model::{Model, ModelResult, Node, Operation, Range};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Command {
    pub ops: Vec<Operation>,
}

impl Command {
    pub fn new(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    /// Replace `range` with a single text node
    pub fn insert_text(range: Range, text: impl Into<String>) -> Self {
        Self::new(vec![Operation::edit(range, vec![Node::text(text)])])
    }

    /// Insert an empty paragraph at `range`
    pub fn split_block(range: Range) -> Self {
        Self::new(vec![Operation::edit(range, vec![Node::element("p", vec![])])])
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Applies every operation of `command` and returns the inverse command.
///
/// If one operation fails, those already applied are reverted (latest
/// first) and that operation's error is returned. Model subscribers see the
/// reverting operations too.
pub fn execute(model: &mut Model, command: &Command) -> ModelResult<Command> {
    let mut inverses = Vec::with_capacity(command.ops.len());

    for op in &command.ops {
        match model.apply(op) {
            Ok(inverse) => inverses.push(inverse),
            Err(e) => {
                warn!(error = %e, applied = inverses.len(), "Rolling back command");
                for inverse in inverses.iter().rev() {
                    if let Err(rollback) = model.apply(inverse) {
                        warn!(error = %rollback, "Rollback failed");
                        break;
                    }
                }
                return Err(e);
            }
        }
    }

    Ok(Command::new(inverses))
}
