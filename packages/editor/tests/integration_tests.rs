//! Integration tests for editor crate

use std::cell::RefCell;
use std::rc::Rc;
use treetext_editor::{execute, Command, Editor, EditorConfig, History, Model, Range, Schema, SchemaSpec};

fn editor(xml: &str) -> Editor {
    Editor::create(EditorConfig {
        initial_value: xml.to_string(),
        ..EditorConfig::default()
    })
    .unwrap()
}

#[test]
fn test_editor_lifecycle() -> anyhow::Result<()> {
    let mut editor = editor("<root><p>Hell!</p></root>");

    editor.execute(Command::insert_text(Range::collapsed(vec![0, 0, 4]), "o"))?;
    assert_eq!(editor.to_xml(), "<root><p>Hello!</p></root>");
    assert_eq!(editor.history().undo_levels(), 1);

    editor.undo()?;
    assert_eq!(editor.to_xml(), "<root><p>Hell!</p></root>");
    assert_eq!(editor.history().redo_levels(), 1);

    editor.redo()?;
    assert_eq!(editor.to_xml(), "<root><p>Hello!</p></root>");

    // Nothing left to redo
    assert!(editor.redo()?.is_none());
    Ok(())
}

#[test]
fn test_history_snapshot_holds_inverse_commands() -> anyhow::Result<()> {
    let mut editor = editor("<root><p>Hell!</p></root>");
    editor.execute(Command::insert_text(Range::collapsed(vec![0, 0, 4]), "o"))?;

    let snapshot: serde_json::Value = serde_json::from_str(&editor.history_json()?)?;
    assert_eq!(
        snapshot,
        serde_json::json!({
            "undos": [{"ops": [{
                "type": "edit",
                "range": {"s": [0, 1, 0], "e": [0, 1, 1]},
                "value": []
            }]}],
            "redos": []
        })
    );
    Ok(())
}

#[test]
fn test_typing_session() -> anyhow::Result<()> {
    let mut editor = Editor::create(EditorConfig::default())?;

    for word in ["The", " quick", " brown", " fox"] {
        editor.insert_text(word)?;
    }
    assert_eq!(editor.to_xml(), "<root><p>The quick brown fox</p></root>");

    editor.undo()?;
    editor.undo()?;
    assert_eq!(editor.to_xml(), "<root><p>The quick</p></root>");

    // A new edit drops the redo branch
    editor.insert_text("!")?;
    assert!(!editor.history().can_redo());
    assert_eq!(editor.to_xml(), "<root><p>The quick!</p></root>");

    while editor.undo()?.is_some() {}
    assert_eq!(editor.to_xml(), "<root><p></p></root>");
    Ok(())
}

#[test]
fn test_split_block_then_type() -> anyhow::Result<()> {
    let mut editor = editor("<root><p>First</p></root>");

    editor.execute(Command::split_block(Range::collapsed(vec![1])))?;
    editor.insert_text("Second")?;
    assert_eq!(editor.to_xml(), "<root><p>First</p><p>Second</p></root>");

    editor.undo()?;
    editor.undo()?;
    assert_eq!(editor.to_xml(), "<root><p>First</p></root>");
    Ok(())
}

#[test]
fn test_max_history_from_config() -> anyhow::Result<()> {
    let mut editor = Editor::create(EditorConfig {
        max_history: 2,
        ..EditorConfig::default()
    })?;

    for text in ["a", "b", "c"] {
        editor.insert_text(text)?;
    }
    assert_eq!(editor.history().undo_levels(), 2);

    while editor.undo()?.is_some() {}
    assert_eq!(editor.to_xml(), "<root><p>a</p></root>");
    Ok(())
}

#[test]
fn test_downstream_receives_model_changes() -> anyhow::Result<()> {
    let mut editor = editor("<root><p></p></root>");
    let seen = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&seen);
    let id = editor.subscribe_downstream(move |xml| log.borrow_mut().push(xml.to_string()));

    editor.insert_text("a")?;
    editor.handle_input(Command::insert_text(Range::collapsed(vec![0, 0, 1]), "b"))?;
    editor.undo()?;

    assert!(editor.unsubscribe_downstream(id));
    editor.undo()?;

    assert_eq!(
        *seen.borrow(),
        vec![
            "<root><p>a</p></root>".to_string(),
            "<root><p>a</p></root>".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn test_history_drives_plain_model() -> anyhow::Result<()> {
    let schema = Schema::new(SchemaSpec::basic())?;
    let mut model = Model::create(schema, "<root><p>ab</p></root>")?;
    let mut history = History::new();

    let command = Command::insert_text(Range::collapsed(vec![0, 0, 1]), "-");
    history.push(execute(&mut model, &command)?);
    assert_eq!(model.to_xml(), "<root><p>a-b</p></root>");

    history.undo(|command| execute(&mut model, command))?;
    assert_eq!(model.to_xml(), "<root><p>ab</p></root>");

    history.redo(|command| execute(&mut model, command))?;
    assert_eq!(model.to_xml(), "<root><p>a-b</p></root>");
    Ok(())
}
