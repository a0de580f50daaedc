//! # Editor
//!
//! Wires a [`Model`], its [`History`] and two subscriber channels together.
//!
//! ```text
//! input surface ──handle_input──▶ Editor ──commands──▶ command subscribers
//!                                   │
//!                                   └──downstream (XML)──▶ view
//! ```
//!
//! Changes that come from the input surface are executed with the upstream
//! flag set, so the view that produced them is not sent its own change back.

use crate::commands::{self, Command};
use crate::errors::EditorResult;
use crate::history::History;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use treetext_model::{Model, Observable, Schema, SchemaSpec, SubscriptionId};

/// Options for [`Editor::create`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub schema: SchemaSpec,

    /// Initial document as XML
    pub initial_value: String,

    /// Maximum number of undo levels (0 = unlimited)
    pub max_history: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            schema: SchemaSpec::basic(),
            initial_value: "<root><p></p></root>".to_string(),
            max_history: 100,
        }
    }
}

#[derive(Debug)]
pub struct Editor {
    model: Model,
    history: History<Command>,

    /// Set while a command from the input surface is executing
    is_upstream: bool,

    commands: Observable<Command>,
    downstream: Observable<String>,
}

impl Editor {
    pub fn create(config: EditorConfig) -> EditorResult<Self> {
        let schema = Schema::new(config.schema)?;
        let model = Model::create(schema, &config.initial_value)?;

        Ok(Self {
            model,
            history: History::with_max_levels(config.max_history),
            is_upstream: false,
            commands: Observable::new(),
            downstream: Observable::new(),
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn history(&self) -> &History<Command> {
        &self.history
    }

    pub fn to_xml(&self) -> String {
        self.model.to_xml()
    }

    /// History stacks as JSON
    pub fn history_json(&self) -> EditorResult<String> {
        Ok(self.history.to_json()?)
    }

    /// Applies `command`, records its inverse and notifies subscribers
    #[instrument(skip_all, fields(ops = command.ops.len(), upstream = self.is_upstream))]
    pub fn execute(&mut self, command: Command) -> EditorResult<()> {
        let inverse = commands::execute(&mut self.model, &command)?;
        self.history.push(inverse);
        self.notify(&command);
        Ok(())
    }

    /// Entry point for commands produced by the input surface
    pub fn handle_input(&mut self, command: Command) -> EditorResult<()> {
        self.is_upstream = true;
        let result = self.execute(command);
        self.is_upstream = false;
        result
    }

    /// Reverts the last command. Returns the command that ran, if any.
    pub fn undo(&mut self) -> EditorResult<Option<Command>> {
        let model = &mut self.model;
        let command = self
            .history
            .undo(|command| commands::execute(model, command))?;

        if let Some(command) = &command {
            debug!(ops = command.ops.len(), "Undo");
            self.notify(command);
        }
        Ok(command)
    }

    pub fn redo(&mut self) -> EditorResult<Option<Command>> {
        let model = &mut self.model;
        let command = self
            .history
            .redo(|command| commands::execute(model, command))?;

        if let Some(command) = &command {
            debug!(ops = command.ops.len(), "Redo");
            self.notify(command);
        }
        Ok(command)
    }

    /// Appends text at the end of the document
    pub fn insert_text(&mut self, text: impl Into<String>) -> EditorResult<()> {
        let range = self.model.get_content_end_range()?;
        self.execute(Command::insert_text(range, text))
    }

    /// Called with every executed, undone or redone command
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Command) + 'static) -> SubscriptionId {
        self.commands.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.commands.unsubscribe(id)
    }

    /// Called with the new document XML after changes not made by the
    /// input surface
    pub fn subscribe_downstream(&mut self, mut subscriber: impl FnMut(&str) + 'static) -> SubscriptionId {
        self.downstream.subscribe(move |xml: &String| subscriber(xml))
    }

    pub fn unsubscribe_downstream(&mut self, id: SubscriptionId) -> bool {
        self.downstream.unsubscribe(id)
    }

    fn notify(&mut self, command: &Command) {
        self.commands.notify(command);

        if self.is_upstream {
            return;
        }
        let xml = self.model.to_xml();
        self.downstream.notify(&xml);
    }
}
