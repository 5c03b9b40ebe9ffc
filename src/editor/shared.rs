//! Validation and formatting shared by the sessioned and non-sessioned
//! editors: view-range checking, occurrence counting, and shell quoting.

use crate::error::EditorError;

/// Validate a `view_range` argument against a file's total line count.
/// Returns the resolved, inclusive `(start, end)` 1-based range, with
/// `end` resolved from `-1` to `total_lines` when the caller asked for
/// end-of-file.
pub fn validate_view_range(
    range: &[i64],
    total_lines: usize,
) -> Result<(usize, usize), EditorError> {
    if range.len() != 2 {
        return Err(EditorError::InvalidRangeShape);
    }
    let start = range[0];
    let end = range[1];

    if start < 1 || (total_lines > 0 && start as usize > total_lines) {
        return Err(EditorError::InvalidRangeBounds(range.to_vec(), total_lines));
    }

    if end != -1 {
        if end as usize > total_lines {
            return Err(EditorError::InvalidRangeEnd(end, total_lines));
        }
        if end < start {
            return Err(EditorError::InvalidRangeOrder(start, end));
        }
    }

    let resolved_end = if end == -1 { total_lines } else { end as usize };
    Ok((start as usize, resolved_end))
}

/// 1-based line numbers of every non-overlapping occurrence of `needle`
/// in `content`, in order of appearance.
pub fn find_occurrence_line_numbers(content: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    let mut result = Vec::new();
    let mut idx = 0;
    while let Some(pos) = content[idx..].find(needle) {
        let abs = idx + pos;
        let line = content[..abs].matches('\n').count() + 1;
        result.push(line);
        idx = abs + needle.len();
    }
    result
}

/// Wrap `s` in single quotes, escaping embedded single quotes the POSIX
/// shell way (`'` -> `'\''`), so it is safe to splice into a command line.
pub fn shell_single_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}
