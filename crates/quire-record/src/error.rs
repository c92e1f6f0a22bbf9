//! Error types for quire-record operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A mistake in a record type's field declarations.
///
/// These are programming errors: they are raised while a schema table is
/// built or when code asks for a field the schema never declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The same field name was declared twice on one record type.
    #[error("field with name {field:?} already defined on {record}")]
    DuplicateField {
        /// Record type the declaration was made on.
        record: &'static str,
        /// The repeated field name.
        field: String,
    },

    /// A field name that the record type does not declare.
    #[error("{record} has no field named {field:?}")]
    UnknownField {
        /// Record type that was asked.
        record: &'static str,
        /// The unknown field name.
        field: String,
    },
}

/// The error type for quire-record operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid schema declaration or use.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Non-interactive construction could not find a value for a required field.
    #[error("missing required field {field:?} on {record} object (got {supplied:?})")]
    MissingField {
        /// Record type being constructed.
        record: &'static str,
        /// The field without a value.
        field: String,
        /// Field names the caller did supply.
        supplied: Vec<String>,
    },

    /// A value could not be converted into the field's declared type.
    #[error("invalid value for field {field:?} on {record}: {source}")]
    InvalidValue {
        /// Record type owning the field.
        record: &'static str,
        /// The field that rejected the value.
        field: String,
        /// Underlying conversion error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A named sub-record collides with one already in the collection.
    #[error("already has a {item} with name {name:?}")]
    DuplicateName {
        /// Singular name of the collection item (e.g. "component").
        item: String,
        /// The colliding name.
        name: String,
    },

    /// A record failed its validation hook.
    #[error("invalid {record}: {reason}")]
    Invalid {
        /// Record type that failed validation.
        record: &'static str,
        /// Why it failed.
        reason: String,
    },

    /// The prompt provider failed or was given an unusable answer.
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// A document decoded to a different record type than expected.
    #[error("{}expected a {expected}, got a {found}", location(.path.as_ref()))]
    TypeMismatch {
        /// Record type the caller asked for.
        expected: &'static str,
        /// Type discriminator found in the document.
        found: String,
        /// File the document came from, when decoding from disk.
        path: Option<PathBuf>,
    },

    /// The document is not a record mapping at all.
    #[error("not a record document: {0}")]
    NotARecord(String),

    /// Reading a record file failed.
    #[error("error reading {}: {source}", .path.display())]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// IO error occurred while writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing or emitting error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn location(path: Option<&PathBuf>) -> String {
    path.map(|p| format!("error loading from yaml file {}: ", p.display()))
        .unwrap_or_default()
}

impl Error {
    /// Build a [`Error::MissingField`] for generators that find nothing to produce.
    pub fn missing_field(record: &'static str, field: impl Into<String>) -> Self {
        Self::MissingField {
            record,
            field: field.into(),
            supplied: Vec::new(),
        }
    }

    /// Attach the file a [`Error::TypeMismatch`] came from. Other errors pass through.
    #[must_use]
    pub fn at_path(self, file: &std::path::Path) -> Self {
        match self {
            Self::TypeMismatch {
                expected, found, ..
            } => Self::TypeMismatch {
                expected,
                found,
                path: Some(file.to_path_buf()),
            },
            other => other,
        }
    }

    /// Build a [`Error::Invalid`] from a validation hook.
    pub fn invalid(record: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            record,
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for quire-record operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_mentions_file_when_known() {
        let err = Error::TypeMismatch {
            expected: "Project",
            found: "issue".to_string(),
            path: Some(PathBuf::from("bugs/project.yaml")),
        };
        let msg = err.to_string();
        assert!(msg.contains("bugs/project.yaml"));
        assert!(msg.contains("expected a Project, got a issue"));
    }

    #[test]
    fn type_mismatch_without_file() {
        let err = Error::TypeMismatch {
            expected: "Issue",
            found: "release".to_string(),
            path: None,
        };
        assert_eq!(err.to_string(), "expected a Issue, got a release");
    }
}
