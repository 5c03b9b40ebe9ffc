//! Editor operations proxied through a live session's shell.
//!
//! Every operation is a handful of `exec_command` calls against the
//! session: a probe, a `base64` read or write, and the occasional `wc`/
//! `awk`/`find`. Paths are always single-quote shell-escaped; file
//! content crosses the session boundary as base64 so binary and
//! multi-line content survive the line-framed output channel intact.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::editor::shared::{find_occurrence_line_numbers, shell_single_quote, validate_view_range};
use crate::error::EditorError;
use crate::session::SessionManager;

async fn run(manager: &SessionManager, session_id: &str, command: &str) -> Result<String, EditorError> {
    let result = manager.exec(session_id, command, None).await;
    if result.exit_code != 0 {
        return Err(EditorError::SessionCommandFailed(result.output));
    }
    Ok(result.output)
}

async fn write_via_heredoc(
    manager: &SessionManager,
    session_id: &str,
    escaped_path: &str,
    content: &str,
) -> Result<(), EditorError> {
    let marker = format!("MCPEOF{}", uuid::Uuid::new_v4().simple());
    let encoded = BASE64.encode(content.as_bytes());
    let command = format!("base64 -d > {escaped_path} << '{marker}'\n{encoded}\n{marker}");
    run(manager, session_id, &command).await?;
    Ok(())
}

/// `view`: probe the path, then list a directory or print numbered lines.
pub async fn view(
    manager: &SessionManager,
    session_id: &str,
    path: &str,
    view_range: Option<Vec<i64>>,
) -> Result<String, EditorError> {
    let escaped = shell_single_quote(path);
    let probe = format!("test -d {escaped} && echo DIR || (test -f {escaped} && echo FILE || echo NOTFOUND)");
    let probe_result = run(manager, session_id, &probe).await?;

    match probe_result.trim() {
        "NOTFOUND" => Err(EditorError::PathNotFound(path.to_string())),
        "DIR" => {
            if view_range.is_some() {
                return Err(EditorError::RangeOnDirectory);
            }
            run(
                manager,
                session_id,
                &format!("find {escaped} -maxdepth 2 -not -path '*/.*'"),
            )
            .await
        }
        "FILE" => {
            if let Some(range) = view_range {
                let total_str = run(manager, session_id, &format!("wc -l < {escaped}")).await?;
                let total_lines: usize = total_str.trim().parse().unwrap_or(0);
                let (start, end) = validate_view_range(&range, total_lines)?;
                let body = run(
                    manager,
                    session_id,
                    &format!(
                        "awk 'NR>={start} && NR<={end} {{printf \"%d\\t%s\\n\", NR, $0}}' {escaped}"
                    ),
                )
                .await?;
                Ok(format!(
                    "Total lines: {total_lines}. Showing lines {start}-{end}:\n{body}"
                ))
            } else {
                run(
                    manager,
                    session_id,
                    &format!("awk '{{printf \"%d\\t%s\\n\", NR, $0}}' {escaped}"),
                )
                .await
            }
        }
        other => Err(EditorError::SessionCommandFailed(format!(
            "unexpected probe result: {other}"
        ))),
    }
}

/// `str_replace`: read via base64, replace the literal, write back via a
/// random-sentinel here-document.
pub async fn str_replace(
    manager: &SessionManager,
    session_id: &str,
    path: &str,
    old_str: &str,
    new_str: &str,
    replace_all: bool,
) -> Result<String, EditorError> {
    let escaped = shell_single_quote(path);
    let encoded = run(manager, session_id, &format!("base64 {escaped}")).await?;
    let clean: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = BASE64
        .decode(clean)
        .map_err(|e| EditorError::SessionCommandFailed(format!("invalid base64 from session: {e}")))?;
    let content = String::from_utf8_lossy(&decoded).into_owned();

    let occurrences = find_occurrence_line_numbers(&content, old_str);
    if occurrences.is_empty() {
        return Err(EditorError::LiteralNotFound(old_str.to_string(), path.to_string()));
    }
    if !replace_all && occurrences.len() > 1 {
        let lines = occurrences
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(EditorError::AmbiguousMatch {
            old: old_str.to_string(),
            lines,
        });
    }

    let new_content = if replace_all {
        content.replace(old_str, new_str)
    } else {
        content.replacen(old_str, new_str, 1)
    };

    write_via_heredoc(manager, session_id, &escaped, &new_content).await?;

    if occurrences.len() > 1 {
        Ok(format!(
            "The file {path} has been edited successfully. Made {} replacements.",
            occurrences.len()
        ))
    } else {
        Ok(format!("The file {path} has been edited successfully."))
    }
}

/// `create`: refuse an existing target, make parent directories, write
/// the requested text back via the same base64 here-doc writer.
pub async fn create(
    manager: &SessionManager,
    session_id: &str,
    path: &str,
    file_text: &str,
) -> Result<String, EditorError> {
    let escaped = shell_single_quote(path);
    let exists = run(
        manager,
        session_id,
        &format!("test -e {escaped} && echo EXISTS || echo MISSING"),
    )
    .await?;
    if exists.trim() == "EXISTS" {
        return Err(EditorError::AlreadyExists(path.to_string()));
    }

    run(
        manager,
        session_id,
        &format!("mkdir -p \"$(dirname {escaped})\""),
    )
    .await?;
    write_via_heredoc(manager, session_id, &escaped, file_text).await?;

    Ok(format!("File created successfully at {path}"))
}
