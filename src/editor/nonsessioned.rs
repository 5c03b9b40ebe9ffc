//! Editor operations resolved directly against a host filesystem base
//! directory, sharing the sessioned editor's command vocabulary, line
//! numbering, and error wording (spec §4.6) but never shelling out.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::editor::shared::{find_occurrence_line_numbers, validate_view_range};
use crate::error::EditorError;

/// Resolves paths against a fixed base directory, with an atomic
/// write-then-rename for anything that touches disk.
pub struct NonSessionedEditor {
    base_dir: PathBuf,
}

impl NonSessionedEditor {
    #[must_use]
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir: normalize_lexically(&base_dir),
        }
    }

    /// Resolve a caller-supplied path against the base directory, rejecting
    /// null bytes and any `..` traversal that would escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, EditorError> {
        if path.contains('\0') {
            return Err(EditorError::PathEscape(PathBuf::from(path)));
        }
        let relative = path.trim_start_matches('/');
        let candidate = normalize_lexically(&self.base_dir.join(relative));
        if !candidate.starts_with(&self.base_dir) {
            return Err(EditorError::PathEscape(candidate));
        }
        Ok(candidate)
    }

    pub async fn view(
        &self,
        path: &str,
        view_range: Option<Vec<i64>>,
    ) -> Result<String, EditorError> {
        let resolved = self.resolve(path)?;
        let metadata = tokio::fs::metadata(&resolved)
            .await
            .map_err(|_| EditorError::PathNotFound(path.to_string()))?;

        if metadata.is_dir() {
            if view_range.is_some() {
                return Err(EditorError::RangeOnDirectory);
            }
            let mut entries = tokio::fs::read_dir(&resolved).await?;
            let mut names = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') {
                    continue;
                }
                names.push(name);
            }
            names.sort();
            return Ok(names.join("\n"));
        }

        let content = tokio::fs::read_to_string(&resolved).await?;
        let lines: Vec<&str> = content.lines().collect();
        let total_lines = lines.len();

        if let Some(range) = view_range {
            let (start, end) = validate_view_range(&range, total_lines)?;
            let body = lines[start - 1..end]
                .iter()
                .enumerate()
                .map(|(i, line)| format!("{}\t{}", start + i, line))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(format!(
                "Total lines: {total_lines}. Showing lines {start}-{end}:\n{body}"
            ))
        } else {
            let body = lines
                .iter()
                .enumerate()
                .map(|(i, line)| format!("{}\t{}", i + 1, line))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(body)
        }
    }

    pub async fn str_replace(
        &self,
        path: &str,
        old_str: &str,
        new_str: &str,
        replace_all: bool,
    ) -> Result<String, EditorError> {
        let resolved = self.resolve(path)?;
        let content = tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|_| EditorError::PathNotFound(path.to_string()))?;

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

        atomic_write(&resolved, new_content.as_bytes()).await?;

        if occurrences.len() > 1 {
            Ok(format!(
                "The file {path} has been edited successfully. Made {} replacements.",
                occurrences.len()
            ))
        } else {
            Ok(format!("The file {path} has been edited successfully."))
        }
    }

    pub async fn create(&self, path: &str, file_text: &str) -> Result<String, EditorError> {
        let resolved = self.resolve(path)?;
        if tokio::fs::metadata(&resolved).await.is_ok() {
            return Err(EditorError::AlreadyExists(path.to_string()));
        }
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        atomic_write(&resolved, file_text.as_bytes()).await?;
        Ok(format!("File created successfully at {path}"))
    }
}

/// Collapse `.` and `..` components without touching the filesystem (the
/// target of `create` doesn't exist yet, so `canonicalize` isn't an option).
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

async fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditorError> {
    let path = path.to_path_buf();
    let content = content.to_vec();
    tokio::task::spawn_blocking(move || -> Result<(), EditorError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&content)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| EditorError::SessionCommandFailed(format!("atomic write task panicked: {e}")))??;
    Ok(())
}
