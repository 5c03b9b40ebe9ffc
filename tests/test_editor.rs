//! View/edit/create file operations: range validation, occurrence counting,
//! shell quoting, the non-sessioned editor, and its tool adapter.

use serde_json::json;
use shellmcp::editor::shared::{find_occurrence_line_numbers, shell_single_quote, validate_view_range};
use shellmcp::editor::NonSessionedEditor;
use shellmcp::error::EditorError;
use shellmcp::registry::Tool;
use shellmcp::tools::EditorTool;

#[test]
fn rejects_wrong_shape() {
    assert!(matches!(
        validate_view_range(&[5], 20),
        Err(EditorError::InvalidRangeShape)
    ));
}

#[test]
fn rejects_start_out_of_bounds() {
    let err = validate_view_range(&[0, 5], 20).unwrap_err();
    assert!(err.to_string().contains("should be within the range"));
}

#[test]
fn rejects_end_past_total_lines() {
    let err = validate_view_range(&[1, 50], 20).unwrap_err();
    assert!(err.to_string().contains("should be smaller than the number of lines"));
}

#[test]
fn rejects_end_before_start() {
    let err = validate_view_range(&[10, 5], 20).unwrap_err();
    assert!(err.to_string().contains("should be larger or equal than its first"));
}

#[test]
fn resolves_eof_sentinel() {
    assert_eq!(validate_view_range(&[18, -1], 20).unwrap(), (18, 20));
}

#[test]
fn accepts_single_line_range() {
    assert_eq!(validate_view_range(&[15, 15], 20).unwrap(), (15, 15));
}

#[test]
fn finds_all_occurrences_with_line_numbers() {
    let content = "foo bar\nfoo baz\nfoo qux";
    assert_eq!(find_occurrence_line_numbers(content, "foo"), vec![1, 2, 3]);
}

#[test]
fn single_quote_escapes_embedded_quotes() {
    assert_eq!(shell_single_quote("it's"), "'it'\\''s'");
}

#[tokio::test]
async fn create_then_view_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let editor = NonSessionedEditor::new(dir.path().to_path_buf());

    let msg = editor.create("t.txt", "Hello World\nSecond line").await.unwrap();
    assert!(msg.contains("File created successfully"));

    let view = editor.view("t.txt", None).await.unwrap();
    assert!(view.starts_with("1\tHello World"));
}

#[tokio::test]
async fn create_refuses_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let editor = NonSessionedEditor::new(dir.path().to_path_buf());
    editor.create("t.txt", "a").await.unwrap();
    let err = editor.create("t.txt", "b").await.unwrap_err();
    assert!(matches!(err, EditorError::AlreadyExists(_)));
}

#[tokio::test]
async fn str_replace_rejects_ambiguous_match() {
    let dir = tempfile::tempdir().unwrap();
    let editor = NonSessionedEditor::new(dir.path().to_path_buf());
    editor
        .create("t.txt", "foo bar\nfoo baz\nfoo qux")
        .await
        .unwrap();

    let err = editor.str_replace("t.txt", "foo", "bar", false).await.unwrap_err();
    match err {
        EditorError::AmbiguousMatch { lines, .. } => assert_eq!(lines, "1, 2, 3"),
        other => panic!("expected AmbiguousMatch, got {other:?}"),
    }

    let result = editor.str_replace("t.txt", "foo", "bar", true).await.unwrap();
    assert!(result.contains("Made 3 replacements"));
}

#[tokio::test]
async fn path_traversal_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let editor = NonSessionedEditor::new(dir.path().to_path_buf());
    let err = editor.view("../../etc/passwd", None).await.unwrap_err();
    assert!(matches!(err, EditorError::PathEscape(_)));
}

#[tokio::test]
async fn create_then_view_through_tool() {
    let dir = tempfile::tempdir().unwrap();
    let tool = EditorTool::new(NonSessionedEditor::new(dir.path().to_path_buf()));

    let created = tool
        .execute(json!({ "command": "create", "path": "a.txt", "file_text": "hi" }))
        .await;
    assert!(!created.is_error);

    let viewed = tool
        .execute(json!({ "command": "view", "path": "a.txt" }))
        .await;
    assert!(!viewed.is_error);
    assert!(viewed.content[0].text.contains("hi"));
}

#[tokio::test]
async fn unknown_command_is_tool_error() {
    let dir = tempfile::tempdir().unwrap();
    let tool = EditorTool::new(NonSessionedEditor::new(dir.path().to_path_buf()));
    let result = tool.execute(json!({ "command": "bogus", "path": "a.txt" })).await;
    assert!(result.is_error);
}
