//! # Treetext Editor
//!
//! Command layer, undo/redo history and the editor facade for treetext
//! documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ input surface: keystrokes → Command         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: execute commands + record inverses  │
//! │  - History of inverse commands              │
//! │  - Command / downstream subscribers         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ model: Operation → inverse Operation        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use treetext_editor::{Editor, EditorConfig};
//!
//! let mut editor = Editor::create(EditorConfig::default())?;
//! editor.insert_text("Hello")?;
//! assert_eq!(editor.to_xml(), "<root><p>Hello</p></root>");
//!
//! editor.undo()?;
//! assert_eq!(editor.to_xml(), "<root><p></p></root>");
//! # Ok::<(), treetext_editor::EditorError>(())
//! ```

mod commands;
mod editor;
mod errors;
mod history;

pub use commands::{execute, Command};
pub use editor::{Editor, EditorConfig};
pub use errors::{EditorError, EditorResult};
pub use history::{History, HistorySnapshot};

// Re-export common types for convenience
pub use treetext_model::{Model, Node, Operation, Range, Schema, SchemaSpec};
