//! Unified-diff preview of what a publish would change.

use std::io::ErrorKind;
use std::path::Path;

use similar::TextDiff;

use crate::change::{compare_files, ChangeVerdict};
use crate::error::{io_err, PublishError};

/// Verdict plus a human-readable diff for changed text files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePreview {
    pub verdict: ChangeVerdict,
    /// `None` when identical; a one-line notice for binary content.
    pub unified_diff: Option<String>,
}

/// Compare `staged` with `existing` and render what would change.
///
/// No files are written.
pub fn preview(staged: &Path, existing: &Path) -> Result<FilePreview, PublishError> {
    let verdict = compare_files(staged, existing)?;
    if verdict == ChangeVerdict::Identical {
        return Ok(FilePreview {
            verdict,
            unified_diff: None,
        });
    }

    let new = std::fs::read(staged).map_err(|e| io_err(staged, e))?;
    let old = read_existing_or_empty(existing)?;

    let unified = match (std::str::from_utf8(&old), std::str::from_utf8(&new)) {
        (Ok(old), Ok(new)) => {
            let old = normalize_line_endings(old);
            let new = normalize_line_endings(new);
            let old_header = format!("a/{}", existing.display());
            let new_header = format!("b/{}", staged.display());
            TextDiff::from_lines(&old, &new)
                .unified_diff()
                .header(&old_header, &new_header)
                .context_radius(3)
                .to_string()
        }
        _ => format!(
            "Binary files {} and {} differ\n",
            existing.display(),
            staged.display()
        ),
    };

    Ok(FilePreview {
        verdict,
        unified_diff: Some(unified),
    })
}

fn read_existing_or_empty(path: &Path) -> Result<Vec<u8>, PublishError> {
    match std::fs::read(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
