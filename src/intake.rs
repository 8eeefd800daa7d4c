use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use walkdir::WalkDir;

/// Extensions the page-extraction pane accepts.
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// Extensions the identifier pane accepts.
pub const IDENTIFIER_EXTENSIONS: &[&str] = &["doc", "docx", "pdf"];

/// Lowercase extension of a file name, if it has one.
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn accepted(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// Resolve user-supplied paths into the files a pane should load.
///
/// Directories are walked recursively and contribute every accepted file in
/// name order. Files with another extension are skipped with a warning.
pub fn collect_inputs<P: AsRef<Path>>(paths: &[P], extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry
                    .with_context(|| format!("Failed to walk directory: {}", path.display()))?;
                if entry.file_type().is_file() && accepted(entry.path(), extensions) {
                    files.push(entry.into_path());
                }
            }
        } else if accepted(path, extensions) {
            files.push(path.to_path_buf());
        } else {
            warn!(
                "skipping {}: expected one of {:?}",
                path.display(),
                extensions
            );
        }
    }

    Ok(files)
}
