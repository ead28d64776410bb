//! Vault walking: enumerates markdown files under a vault root.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Walks `root` recursively and returns every `.md` file whose name does
/// not start with `.` and whose path does not contain any excluded
/// substring.
///
/// An unreadable root is not fatal: it is logged and an empty list is
/// returned, matching the walker's documented "never fatal" behavior.
#[must_use]
pub fn walk_markdown_files(root: &Path, excluded_folders: &[String]) -> Vec<PathBuf> {
    if !root.exists() {
        warn!(path = %root.display(), "vault root does not exist, skipping");
        return Vec::new();
    }

    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "error walking vault entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| is_markdown_file(path))
        .filter(|path| !is_excluded(path, excluded_folders))
        .collect()
}

fn is_markdown_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".md") && !name.starts_with('.')
}

fn is_excluded(path: &Path, excluded_folders: &[String]) -> bool {
    let path_str = path.to_string_lossy();
    excluded_folders.iter().any(|f| path_str.contains(f.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_markdown_files_recursively() {
        let dir = tempdir().unwrap_or_else(|e| panic!("{e}"));
        fs::create_dir_all(dir.path().join("meetings")).unwrap_or_else(|e| panic!("{e}"));
        fs::write(dir.path().join("meetings/a.md"), "hello").unwrap_or_else(|e| panic!("{e}"));
        fs::write(dir.path().join("notes.txt"), "not markdown").unwrap_or_else(|e| panic!("{e}"));
        fs::write(dir.path().join(".hidden.md"), "hidden").unwrap_or_else(|e| panic!("{e}"));

        let files = walk_markdown_files(dir.path(), &[]);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("meetings/a.md"));
    }

    #[test]
    fn excludes_configured_substrings() {
        let dir = tempdir().unwrap_or_else(|e| panic!("{e}"));
        fs::create_dir_all(dir.path().join("templates")).unwrap_or_else(|e| panic!("{e}"));
        fs::write(dir.path().join("templates/t.md"), "x").unwrap_or_else(|e| panic!("{e}"));
        fs::write(dir.path().join("keep.md"), "x").unwrap_or_else(|e| panic!("{e}"));

        let files = walk_markdown_files(dir.path(), &["templates".to_string()]);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("keep.md"));
    }

    #[test]
    fn missing_root_returns_empty_not_an_error() {
        let files = walk_markdown_files(Path::new("/does/not/exist"), &[]);
        assert!(files.is_empty());
    }
}
