//! The [`Document`] type: one markdown file in a vault, with metadata
//! extracted from YAML frontmatter or inferred from its path.

use serde::{Deserialize, Serialize};

/// Which vault a document belongs to.
///
/// Determined by testing whether the file's path is contained under the
/// configured work or personal vault root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vault {
    /// Under the configured work vault root.
    Work,
    /// Under the configured personal vault root.
    Personal,
    /// Not under either configured root.
    Unknown,
}

impl Vault {
    /// Returns the lowercase name used in storage and CLI flags.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a vault name from a CLI/config string. Unrecognized input is `Unknown`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "work" => Self::Work,
            "personal" => Self::Personal,
            _ => Self::Unknown,
        }
    }
}

/// A markdown file, parsed into metadata and body.
///
/// The body is kept separately (see [`crate::parser::parse_document`])
/// since [`Document`] itself does not carry the full text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Absolute path to the file.
    pub file_path: String,
    /// Content hash of the raw file bytes, used for change detection.
    pub file_hash: String,
    /// Which vault this file lives in.
    pub vault: Vault,
    /// Document title, from frontmatter or the filename stem.
    pub title: String,
    /// First path segment under the vault root, or `"other"`.
    pub category: String,
    /// People mentioned in frontmatter, normalized to a flat list.
    pub people: Vec<String>,
    /// Projects mentioned in frontmatter, normalized to a flat list.
    pub projects: Vec<String>,
    /// ISO `yyyy-mm-dd` date, from frontmatter or the filename.
    pub date: Option<String>,
}

impl Document {
    /// Returns true if `person` (case-insensitive) is in `people`.
    #[must_use]
    pub fn mentions_person(&self, person: &str) -> bool {
        self.people.iter().any(|p| p.eq_ignore_ascii_case(person))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_round_trips_through_str() {
        for v in [Vault::Work, Vault::Personal, Vault::Unknown] {
            assert_eq!(Vault::parse(v.as_str()), v);
        }
    }

    #[test]
    fn vault_parse_is_case_insensitive() {
        assert_eq!(Vault::parse("WORK"), Vault::Work);
        assert_eq!(Vault::parse("Personal"), Vault::Personal);
        assert_eq!(Vault::parse("garbage"), Vault::Unknown);
    }

    #[test]
    fn mentions_person_is_case_insensitive() {
        let doc = Document {
            file_path: "x.md".into(),
            file_hash: "h".into(),
            vault: Vault::Work,
            title: "t".into(),
            category: "meetings".into(),
            people: vec!["Hitesh Patel".into()],
            projects: vec![],
            date: None,
        };
        assert!(doc.mentions_person("hitesh patel"));
        assert!(!doc.mentions_person("someone else"));
    }
}
