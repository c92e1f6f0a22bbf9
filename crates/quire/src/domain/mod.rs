//! Domain types for issue tracking.
//!
//! A [`Project`] owns its [`Component`]s and [`Release`]s as record fields
//! and its [`Issue`]s as a separately stored list. Every type here is a
//! [`quire_record::Record`], so the codec and the store handle them
//! uniformly.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod component;
mod issue;
mod names;
mod project;
mod release;

pub use component::Component;
pub use issue::{Issue, IssueContext, IssueEdit};
pub use names::{IssueDirectory, UNKNOWN_ISSUE};
pub use project::{Project, TypeCount};
pub use release::Release;

/// Kind of work an issue describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// A defect to fix.
    Bugfix,

    /// New functionality.
    Feature,

    /// Anything else.
    Task,
}

impl IssueType {
    /// All types, in grouping order.
    pub const ALL: [Self; 3] = [Self::Bugfix, Self::Feature, Self::Task];

    /// Position when grouping issues: bugfixes first, then features, then tasks.
    #[must_use]
    pub fn sort_order(self) -> u8 {
        match self {
            Self::Bugfix => 0,
            Self::Feature => 1,
            Self::Task => 2,
        }
    }

    /// Plural heading used when listing grouped issues.
    #[must_use]
    pub fn plural(self) -> &'static str {
        match self {
            Self::Bugfix => "bugfixes",
            Self::Feature => "features",
            Self::Task => "tasks",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bugfix => write!(f, "bugfix"),
            Self::Feature => write!(f, "feature"),
            Self::Task => write!(f, "task"),
        }
    }
}

impl FromStr for IssueType {
    type Err = ValidationError;

    /// Accepts the full name or its first letter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "b" | "bugfix" => Ok(Self::Bugfix),
            "f" | "feature" => Ok(Self::Feature),
            "t" | "task" => Ok(Self::Task),
            _ => Err(ValidationError::UnknownType(s.to_string())),
        }
    }
}

/// Where an issue is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Nobody has started on it.
    #[default]
    Unstarted,

    /// Being worked on.
    InProgress,

    /// Work started and then stopped.
    Paused,

    /// Done, with a disposition.
    Closed,
}

impl Status {
    /// Anything but [`Status::Closed`].
    #[must_use]
    pub fn is_open(self) -> bool {
        self != Self::Closed
    }

    /// One-character marker for listings.
    #[must_use]
    pub fn widget(self) -> &'static str {
        match self {
            Self::Unstarted => "_",
            Self::InProgress => ">",
            Self::Paused => "=",
            Self::Closed => "x",
        }
    }

    /// Position when sorting: active work first, closed last.
    #[must_use]
    pub fn sort_order(self) -> u8 {
        match self {
            Self::InProgress => 0,
            Self::Paused => 1,
            Self::Unstarted => 2,
            Self::Closed => 3,
        }
    }

    /// The on-disk spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unstarted => "unstarted",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Closed => "closed",
        }
    }
}

/// Human-readable label, e.g. "in progress".
impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in progress"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// How a closed issue was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// The work was done.
    Fixed,

    /// It will not be done.
    Wontfix,

    /// It was folded into other issues.
    Reorg,
}

impl Disposition {
    /// All dispositions, in menu order.
    pub const ALL: [Self; 3] = [Self::Fixed, Self::Wontfix, Self::Reorg];

    /// The on-disk spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Wontfix => "wontfix",
            Self::Reorg => "reorg",
        }
    }

    /// Human-readable label, e.g. "won't fix".
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Wontfix => "won't fix",
            Self::Reorg => "reorganized",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Disposition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s.trim())
            .ok_or_else(|| ValidationError::UnknownDisposition(s.to_string()))
    }
}

/// Whether a release has shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStatus {
    /// Still collecting issues.
    #[default]
    Unreleased,

    /// Shipped; no longer accepts changes.
    Released,
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreleased => write!(f, "unreleased"),
            Self::Released => write!(f, "released"),
        }
    }
}

/// Implements serde for a record stored inside another record's field, by
/// going through the record codec so the nested value carries its type tag.
macro_rules! nested_record_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                let value = quire_record::to_value(self).map_err(serde::ser::Error::custom)?;
                serde::Serialize::serialize(&value, serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let value = <serde_yaml::Value as serde::Deserialize>::deserialize(deserializer)?;
                quire_record::from_value(value)
                    .map(quire_record::Decoded::into_nested)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use nested_record_serde;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("b", IssueType::Bugfix)]
    #[case("feature", IssueType::Feature)]
    #[case(" T ", IssueType::Task)]
    fn issue_type_parses_short_and_long(#[case] input: &str, #[case] expected: IssueType) {
        assert_eq!(input.parse::<IssueType>().unwrap(), expected);
    }

    #[test]
    fn unknown_disposition_is_rejected() {
        let err = "done".parse::<Disposition>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownDisposition("done".to_string()));
    }

    #[test]
    fn labels() {
        assert_eq!(Status::InProgress.to_string(), "in progress");
        assert_eq!(Status::Paused.to_string(), "paused");
        assert_eq!(Disposition::Wontfix.to_string(), "won't fix");
        assert_eq!(Disposition::Reorg.to_string(), "reorganized");
    }

    #[test]
    fn status_serializes_snake_case() {
        let value = serde_yaml::to_value(Status::InProgress).unwrap();
        assert_eq!(value.as_str(), Some("in_progress"));
    }

    #[test]
    fn sort_orders() {
        let mut statuses = [Status::Closed, Status::Unstarted, Status::InProgress, Status::Paused];
        statuses.sort_by_key(|s| s.sort_order());
        assert_eq!(
            statuses,
            [Status::InProgress, Status::Paused, Status::Unstarted, Status::Closed]
        );
        assert!(IssueType::Bugfix.sort_order() < IssueType::Task.sort_order());
    }
}
