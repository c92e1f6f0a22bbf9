//! Error types for quire operations.

use crate::domain::Status;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A domain invariant that an operation would violate.
///
/// The entity graph is left unmodified when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A component or release name is already taken.
    #[error("already has a {item} with name {name:?}")]
    DuplicateName {
        /// `"component"` or `"release"`.
        item: String,
        /// The colliding name.
        name: String,
    },

    /// A disposition outside fixed, wontfix and reorg.
    #[error("unknown disposition {0:?} (expected fixed, wontfix or reorg)")]
    UnknownDisposition(String),

    /// An issue type outside bugfix, feature and task.
    #[error("unknown issue type {0:?} (expected bugfix, feature or task)")]
    UnknownType(String),

    /// A status transition that is not allowed from the current status.
    #[error("cannot {action} {issue}: it is {status}")]
    InvalidTransition {
        /// The issue's display name.
        issue: String,
        /// What was attempted, e.g. "start work on".
        action: &'static str,
        /// The status that forbids it.
        status: Status,
    },

    /// The release has already been released.
    #[error("release {0} is already released")]
    AlreadyReleased(String),

    /// The release still has open issues.
    #[error("open issue {issue} must be reassigned before release {release} can be released")]
    OpenIssues {
        /// The release being released.
        release: String,
        /// The first open issue found.
        issue: String,
    },

    /// Unassigning an issue that has no release.
    #[error("issue {0} is not assigned to any release")]
    NotAssigned(String),

    /// Reassigning an issue to where it already is.
    #[error("issue {issue} is already assigned to {kind} {name}")]
    AlreadyAssigned {
        /// The issue's display name.
        issue: String,
        /// `"release"` or `"component"`.
        kind: &'static str,
        /// The current assignment.
        name: String,
    },

    /// Dropping a component or release that issues still refer to.
    #[error("{kind} {name} still has {count} issue(s) assigned")]
    InUse {
        /// `"release"` or `"component"`.
        kind: &'static str,
        /// Its name.
        name: String,
        /// Number of issues referring to it.
        count: usize,
    },

    /// A comment with no text.
    #[error("comment is empty")]
    EmptyComment,

    /// A record failed its own consistency check.
    #[error("{0}")]
    Invalid(String),
}

/// Failure reading or writing the on-disk store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The project descriptor is missing.
    #[error("no project file found at {}", .0.display())]
    MissingProject(PathBuf),

    /// A file was found but could not be decoded.
    #[error("error loading {}: {source}", .path.display())]
    Load {
        /// The offending file.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: quire_record::Error,
    },

    /// A record could not be encoded or written.
    #[error("error writing {}: {source}", .path.display())]
    Write {
        /// The target file.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: quire_record::Error,
    },

    /// A dropped issue's file could not be removed.
    #[error("error removing {}: {source}", .path.display())]
    Remove {
        /// The file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The issue directory could not be listed.
    #[error("error listing {}: {source}", .path.display())]
    List {
        /// The directory.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Failure locating or reading the repository configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file in the start directory or any parent.
    #[error("no {file} found in {} or any parent directory; run `quire init` first", .start.display())]
    NotFound {
        /// Where the search began.
        start: PathBuf,
        /// The file searched for.
        file: &'static str,
    },

    /// `init` in a directory that already has a configuration.
    #[error("quire is already initialized here: found {}", .0.display())]
    AlreadyInitialized(PathBuf),

    /// The configuration file could not be read or written.
    #[error("configuration error: {0}")]
    Record(#[from] quire_record::Error),

    /// Creating the repository layout failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// The error type for quire operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A record framework error that is not a domain validation failure.
    #[error(transparent)]
    Record(quire_record::Error),

    /// A domain invariant would be violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No issue, release or component matches the identifier.
    #[error("no {kind} matches {ident:?}")]
    NotFound {
        /// `"issue"`, `"release"` or `"component"`.
        kind: &'static str,
        /// The identifier as given.
        ident: String,
    },

    /// More than one issue matches the identifier.
    #[error("{ident:?} is ambiguous: it matches {kind}s {}", .candidates.join(", "))]
    Ambiguous {
        /// `"issue"`.
        kind: &'static str,
        /// The identifier as given.
        ident: String,
        /// Display names of every match.
        candidates: Vec<String>,
    },

    /// The store could not be read or written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The configuration could not be found or read.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(kind: &'static str, ident: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            ident: ident.into(),
        }
    }
}

impl From<quire_record::Error> for Error {
    fn from(err: quire_record::Error) -> Self {
        match err {
            quire_record::Error::DuplicateName { item, name } => {
                Self::Validation(ValidationError::DuplicateName { item, name })
            }
            quire_record::Error::Invalid { reason, .. } => {
                Self::Validation(ValidationError::Invalid(reason))
            }
            other => Self::Record(other),
        }
    }
}

/// A specialized Result type for quire operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_name_becomes_validation_error() {
        let err: Error = quire_record::Error::DuplicateName {
            item: "component".to_string(),
            name: "core".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::DuplicateName { .. })
        ));
        assert_eq!(err.to_string(), "already has a component with name \"core\"");
    }

    #[test]
    fn ambiguous_lists_candidates() {
        let err = Error::Ambiguous {
            kind: "issue",
            ident: "abc".to_string(),
            candidates: vec!["core-1".to_string(), "core-2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "\"abc\" is ambiguous: it matches issues core-1, core-2"
        );
    }

    #[test]
    fn transition_message_uses_status_label() {
        let err = ValidationError::InvalidTransition {
            issue: "core-1".to_string(),
            action: "start work on",
            status: Status::InProgress,
        };
        assert_eq!(err.to_string(), "cannot start work on core-1: it is in progress");
    }
}
