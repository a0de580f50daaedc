//! # Undo/Redo History
//!
//! Two stacks of inverse commands.
//!
//! ## Design
//!
//! - `push` records the inverse of an executed command
//! - Undo executes the top of `undos` and pushes the result onto `redos`
//! - Redo is symmetric
//! - New commands clear the redo stack
//!
//! The history never touches a document itself: the executor is passed to
//! [`History::undo`] / [`History::redo`] and must return the inverse of what
//! it ran, so any inverse-producing command type works.

use serde::Serialize;

/// Undo/redo stacks over any command type
#[derive(Debug, Clone)]
pub struct History<T> {
    /// Most recent last
    undos: Vec<T>,

    /// Most recent last
    redos: Vec<T>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

/// Borrowed view of both stacks, serialized as `{"undos": [..], "redos": [..]}`
#[derive(Debug, Serialize)]
pub struct HistorySnapshot<'a, T> {
    pub undos: &'a [T],
    pub redos: &'a [T],
}

impl<T> History<T> {
    /// Create a history with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undos: Vec::new(),
            redos: Vec::new(),
            max_levels,
        }
    }

    /// Records an inverse command; the redo branch is dropped
    pub fn push(&mut self, command: T) {
        self.undos.push(command);

        if self.max_levels > 0 && self.undos.len() > self.max_levels {
            self.undos.remove(0);
        }

        self.redos.clear();
    }

    /// Runs the most recent undo command and returns what `execute` produced.
    ///
    /// Returns `Ok(None)` when there is nothing to undo. If `execute` fails
    /// the command stays on the undo stack.
    pub fn undo<E>(&mut self, execute: impl FnMut(&T) -> Result<T, E>) -> Result<Option<T>, E>
    where
        T: Clone,
    {
        transfer(&mut self.undos, &mut self.redos, execute)
    }

    /// Runs the most recent redo command and returns what `execute` produced
    pub fn redo<E>(&mut self, execute: impl FnMut(&T) -> Result<T, E>) -> Result<Option<T>, E>
    where
        T: Clone,
    {
        transfer(&mut self.redos, &mut self.undos, execute)
    }

    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undos.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redos.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undos.clear();
        self.redos.clear();
    }

    pub fn snapshot(&self) -> HistorySnapshot<'_, T> {
        HistorySnapshot {
            undos: &self.undos,
            redos: &self.redos,
        }
    }
}

fn transfer<T: Clone, E>(
    from: &mut Vec<T>,
    to: &mut Vec<T>,
    mut execute: impl FnMut(&T) -> Result<T, E>,
) -> Result<Option<T>, E> {
    let Some(command) = from.last() else {
        return Ok(None);
    };

    let inverse = execute(command)?;
    from.pop();
    to.push(inverse.clone());
    Ok(Some(inverse))
}

impl<T: Serialize> History<T> {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.snapshot())
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::convert::Infallible;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "type", content = "payload", rename_all = "lowercase")]
    enum CounterCommand {
        Inc { value: i64 },
        Dec { value: i64 },
    }

    fn execute(command: &CounterCommand) -> Result<CounterCommand, Infallible> {
        Ok(match command {
            CounterCommand::Inc { value } => CounterCommand::Dec { value: *value },
            CounterCommand::Dec { value } => CounterCommand::Inc { value: *value },
        })
    }

    #[test]
    fn test_history_creation() {
        let history = History::<CounterCommand>::new();
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_and_redo() {
        let mut history = History::new();
        history.push(CounterCommand::Inc { value: 1 });
        history.push(CounterCommand::Inc { value: 2 });

        assert_eq!(history.undo(execute), Ok(Some(CounterCommand::Dec { value: 2 })));
        assert_eq!(history.undo(execute), Ok(Some(CounterCommand::Dec { value: 1 })));
        assert_eq!(history.undo(execute), Ok(None));

        assert_eq!(history.redo(execute), Ok(Some(CounterCommand::Inc { value: 1 })));
        assert_eq!(history.redo(execute), Ok(Some(CounterCommand::Inc { value: 2 })));
        assert_eq!(history.redo(execute), Ok(None));
    }

    #[test]
    fn test_snapshot_json() {
        let mut history = History::new();
        history.push(CounterCommand::Inc { value: 1 });
        history.push(CounterCommand::Inc { value: 2 });
        assert_eq!(
            history.to_json().unwrap(),
            r#"{"undos":[{"type":"inc","payload":{"value":1}},{"type":"inc","payload":{"value":2}}],"redos":[]}"#
        );

        history.undo(execute).unwrap();
        assert_eq!(
            history.to_json().unwrap(),
            r#"{"undos":[{"type":"inc","payload":{"value":1}}],"redos":[{"type":"dec","payload":{"value":2}}]}"#
        );

        history.undo(execute).unwrap();
        assert_eq!(
            history.to_json().unwrap(),
            r#"{"undos":[],"redos":[{"type":"dec","payload":{"value":2}},{"type":"dec","payload":{"value":1}}]}"#
        );

        history.redo(execute).unwrap();
        assert_eq!(
            history.to_json().unwrap(),
            r#"{"undos":[{"type":"inc","payload":{"value":1}}],"redos":[{"type":"dec","payload":{"value":2}}]}"#
        );
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut history = History::new();
        history.push(CounterCommand::Inc { value: 1 });
        history.undo(execute).unwrap();
        assert_eq!(history.redo_levels(), 1);

        history.push(CounterCommand::Inc { value: 3 });
        assert_eq!(history.redo_levels(), 0);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut history = History::with_max_levels(2);
        for value in 0..3 {
            history.push(CounterCommand::Inc { value });
        }

        assert_eq!(history.undo_levels(), 2);
        assert_eq!(
            history.snapshot().undos,
            &[CounterCommand::Inc { value: 1 }, CounterCommand::Inc { value: 2 }]
        );
    }

    #[test]
    fn test_failed_execute_keeps_command() {
        let mut history = History::new();
        history.push(CounterCommand::Inc { value: 1 });

        let result = history.undo(|_| Err::<CounterCommand, _>("rejected"));
        assert_eq!(result, Err("rejected"));
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.redo_levels(), 0);

        history.clear();
        assert!(!history.can_undo());
    }
}
