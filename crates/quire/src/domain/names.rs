//! Cross-references between issues in free text.
//!
//! Display names change whenever issues are renumbered, so text that
//! mentions `core-3` is stored as `{issue <id>}` and turned back into the
//! current name when read.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::warn;

/// Replacement for a placeholder whose issue no longer exists.
pub const UNKNOWN_ISSUE: &str = "[unknown issue]";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{issue (\w+)\}").expect("placeholder pattern is valid"));

/// The id/name table of a project at one numbering.
#[derive(Debug, Default)]
pub struct IssueDirectory {
    id_by_name: HashMap<String, String>,
    name_by_id: HashMap<String, String>,
    names: Option<Regex>,
}

impl IssueDirectory {
    /// Build from `(id, display name)` pairs.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut directory = Self::default();
        for (id, name) in entries {
            directory.id_by_name.insert(name.clone(), id.clone());
            directory.name_by_id.insert(id, name);
        }
        directory.names = directory.names_pattern();
        directory
    }

    /// Alternation of every display name, longest first, on word boundaries.
    fn names_pattern(&self) -> Option<Regex> {
        if self.id_by_name.is_empty() {
            return None;
        }
        let mut names: Vec<String> = self.id_by_name.keys().map(|n| regex::escape(n)).collect();
        names.sort_by_key(|n| std::cmp::Reverse(n.len()));
        let pattern = format!(r"\b({})\b", names.join("|"));
        match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(error = %e, "cannot build issue name pattern; names will not be interpolated");
                None
            }
        }
    }

    /// Current display name of the issue with this id.
    #[must_use]
    pub fn name_for(&self, id: &str) -> Option<&str> {
        self.name_by_id.get(id).map(String::as_str)
    }

    /// Id of the issue with this display name.
    #[must_use]
    pub fn id_for(&self, name: &str) -> Option<&str> {
        self.id_by_name.get(name).map(String::as_str)
    }

    /// Rewrite display names in `text` to `{issue <id>}` placeholders.
    #[must_use]
    pub fn interpolate(&self, text: &str) -> String {
        let Some(names) = &self.names else {
            return text.to_string();
        };
        names
            .replace_all(text, |caps: &Captures| match self.id_for(&caps[1]) {
                Some(id) => format!("{{issue {id}}}"),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Rewrite `{issue <id>}` placeholders in `text` to current display names.
    #[must_use]
    pub fn resolve(&self, text: &str) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures| {
                self.name_for(&caps[1]).unwrap_or(UNKNOWN_ISSUE).to_string()
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> IssueDirectory {
        IssueDirectory::new([
            ("aaa111".to_string(), "core-1".to_string()),
            ("bbb222".to_string(), "core-12".to_string()),
        ])
    }

    #[test]
    fn interpolate_matches_whole_names_only() {
        let dir = directory();
        assert_eq!(
            dir.interpolate("see core-1 and core-12, not core-123"),
            "see {issue aaa111} and {issue bbb222}, not core-123"
        );
    }

    #[test]
    fn resolve_restores_names() {
        let dir = directory();
        let text = "see core-1 and core-12";
        assert_eq!(dir.resolve(&dir.interpolate(text)), text);
    }

    #[test]
    fn unknown_placeholder_is_marked() {
        assert_eq!(
            directory().resolve("dup of {issue fff999}"),
            "dup of [unknown issue]"
        );
    }

    #[test]
    fn empty_directory_passes_names_through() {
        let dir = IssueDirectory::default();
        assert_eq!(dir.interpolate("core-1"), "core-1");
        assert_eq!(dir.resolve("{issue aaa111}"), UNKNOWN_ISSUE);
    }
}
