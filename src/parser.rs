//! Markdown frontmatter parsing.
//!
//! Extracts a YAML frontmatter block (if present) and derives document
//! metadata from it, falling back to path- and filename-derived values.

use crate::core::document::{Document, Vault};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static DATE_IN_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid regex"));

/// Splits a file's raw content into frontmatter and body, and builds a
/// [`Document`] from it.
///
/// Malformed or absent frontmatter never errors: it is treated as empty,
/// and the full content becomes the body.
#[must_use]
pub fn parse_document(
    content: &str,
    file_path: &Path,
    file_hash: &str,
    vault_work_root: &Path,
    vault_personal_root: &Path,
) -> (Document, String) {
    let (frontmatter, body) = split_frontmatter(content);

    let vault = detect_vault(file_path, vault_work_root, vault_personal_root);
    let category = detect_category(file_path, vault_work_root, vault_personal_root, vault);

    let title = frontmatter
        .get("title")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| filename_stem(file_path));

    let date = frontmatter
        .get("date")
        .map(yaml_value_to_string)
        .filter(|s| !s.is_empty())
        .or_else(|| date_from_filename(file_path));

    let people = frontmatter
        .get("people")
        .map(normalize_list_field)
        .unwrap_or_default();
    let projects = frontmatter
        .get("projects")
        .map(normalize_list_field)
        .unwrap_or_default();

    let document = Document {
        file_path: file_path.to_string_lossy().into_owned(),
        file_hash: file_hash.to_string(),
        vault,
        title,
        category,
        people,
        projects,
        date,
    };

    (document, body)
}

/// Splits leading `---`-delimited YAML frontmatter from the body.
///
/// Returns an empty mapping and the original content unchanged if no valid
/// frontmatter block is found.
fn split_frontmatter(content: &str) -> (serde_yaml::Mapping, String) {
    let Some(rest) = content.strip_prefix("---") else {
        return (serde_yaml::Mapping::new(), content.to_string());
    };
    // Frontmatter must start on its own line.
    let rest = match rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) {
        Some(r) => r,
        None => return (serde_yaml::Mapping::new(), content.to_string()),
    };

    let Some(end) = rest.find("\n---") else {
        return (serde_yaml::Mapping::new(), content.to_string());
    };

    let yaml_block = &rest[..end];
    let after = &rest[end + 4..];
    let body = after
        .strip_prefix('\n')
        .unwrap_or(after)
        .trim_start_matches('\r')
        .to_string();

    let mapping = serde_yaml::from_str::<serde_yaml::Value>(yaml_block)
        .ok()
        .and_then(|v| v.as_mapping().cloned())
        .unwrap_or_default();

    (mapping, body)
}

fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Normalizes a frontmatter field that may be a YAML list or a
/// comma-separated string into a flat list of trimmed strings.
fn normalize_list_field(value: &serde_yaml::Value) -> Vec<String> {
    match value {
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .map(yaml_value_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        serde_yaml::Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn date_from_filename(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    DATE_IN_FILENAME
        .find(name)
        .map(|m| m.as_str().to_string())
}

fn filename_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string())
}

fn detect_vault(path: &Path, work_root: &Path, personal_root: &Path) -> Vault {
    if !work_root.as_os_str().is_empty() && path.starts_with(work_root) {
        Vault::Work
    } else if !personal_root.as_os_str().is_empty() && path.starts_with(personal_root) {
        Vault::Personal
    } else {
        Vault::Unknown
    }
}

fn detect_category(path: &Path, work_root: &Path, personal_root: &Path, vault: Vault) -> String {
    let root = match vault {
        Vault::Work => work_root,
        Vault::Personal => personal_root,
        Vault::Unknown => return "other".to_string(),
    };
    path.strip_prefix(root)
        .ok()
        .and_then(|rel| rel.components().next())
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "other".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn roots() -> (PathBuf, PathBuf) {
        (PathBuf::from("/vault/work"), PathBuf::from("/vault/personal"))
    }

    #[test]
    fn parses_frontmatter_and_body() {
        let content = "---\ntitle: Weekly Sync\ndate: 2024-05-01\npeople:\n  - Hitesh\n  - Ana\n---\nBody text here.";
        let (work, personal) = roots();
        let (doc, body) = parse_document(
            content,
            Path::new("/vault/work/meetings/sync.md"),
            "hash1",
            &work,
            &personal,
        );
        assert_eq!(doc.title, "Weekly Sync");
        assert_eq!(doc.date.as_deref(), Some("2024-05-01"));
        assert_eq!(doc.people, vec!["Hitesh".to_string(), "Ana".to_string()]);
        assert_eq!(doc.vault, Vault::Work);
        assert_eq!(doc.category, "meetings");
        assert_eq!(body, "Body text here.");
    }

    #[test]
    fn missing_frontmatter_keeps_full_content_as_body() {
        let content = "Just a note, no frontmatter.";
        let (work, personal) = roots();
        let (doc, body) = parse_document(
            content,
            Path::new("/vault/personal/journal/note.md"),
            "hash2",
            &work,
            &personal,
        );
        assert_eq!(body, content);
        assert_eq!(doc.title, "note");
        assert_eq!(doc.vault, Vault::Personal);
        assert_eq!(doc.category, "journal");
    }

    #[test]
    fn malformed_frontmatter_falls_back_to_empty() {
        let content = "---\n: not valid yaml: [\n---\nBody.";
        let (work, personal) = roots();
        let (doc, _body) = parse_document(
            content,
            Path::new("/vault/work/note.md"),
            "hash3",
            &work,
            &personal,
        );
        assert!(doc.people.is_empty());
    }

    #[test]
    fn date_falls_back_to_filename_regex() {
        let content = "no frontmatter";
        let (work, personal) = roots();
        let (doc, _) = parse_document(
            content,
            Path::new("/vault/work/2024-03-12-standup.md"),
            "hash4",
            &work,
            &personal,
        );
        assert_eq!(doc.date.as_deref(), Some("2024-03-12"));
    }

    #[test]
    fn comma_separated_people_normalizes_to_list() {
        let content = "---\npeople: Hitesh, Ana ,  Bo\n---\nbody";
        let (work, personal) = roots();
        let (doc, _) = parse_document(
            content,
            Path::new("/vault/work/note.md"),
            "hash5",
            &work,
            &personal,
        );
        assert_eq!(
            doc.people,
            vec!["Hitesh".to_string(), "Ana".to_string(), "Bo".to_string()]
        );
    }

    #[test]
    fn path_outside_both_roots_is_unknown_with_other_category() {
        let content = "body";
        let (work, personal) = roots();
        let (doc, _) = parse_document(
            content,
            Path::new("/tmp/scratch.md"),
            "hash6",
            &work,
            &personal,
        );
        assert_eq!(doc.vault, Vault::Unknown);
        assert_eq!(doc.category, "other");
    }
}
