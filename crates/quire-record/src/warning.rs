//! Warnings raised while decoding a record.
//!
//! Record files outlive the code that wrote them. Keys the current schema
//! does not know and collections that are missing are repaired or skipped
//! rather than rejected; each such repair is reported as a [`DecodeWarning`]
//! so the caller can surface it.
//!
//! # Examples
//!
//! ```
//! use quire_record::DecodeWarning;
//!
//! let warning = DecodeWarning::UnknownField {
//!     record: "Issue",
//!     field: "priority".to_string(),
//! };
//! assert_eq!(warning.kind(), "unknown_field");
//! assert!(warning.description().contains("priority"));
//! ```

/// A non-fatal problem found while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// The document has a key the record type does not declare. It is ignored.
    UnknownField {
        /// Record type being decoded.
        record: &'static str,
        /// The ignored key.
        field: String,
    },

    /// A collection field was absent or null and was reset to empty.
    MissingCollection {
        /// Record type being decoded.
        record: &'static str,
        /// The repaired field.
        field: String,
    },
}

impl DecodeWarning {
    /// The record type the warning concerns.
    #[must_use]
    pub fn record(&self) -> &'static str {
        match self {
            Self::UnknownField { record, .. } | Self::MissingCollection { record, .. } => record,
        }
    }

    /// The field the warning concerns.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::UnknownField { field, .. } | Self::MissingCollection { field, .. } => field,
        }
    }

    /// A human-readable description.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::UnknownField { record, field } => {
                format!("unknown field {field:?} in {record} description; ignoring")
            }
            Self::MissingCollection { record, field } => {
                format!("missing field {field:?} in {record} description; setting to []")
            }
        }
    }

    /// A static string identifying the warning kind, for filtering.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownField { .. } => "unknown_field",
            Self::MissingCollection { .. } => "missing_collection",
        }
    }
}

impl std::fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description())
    }
}

impl std::error::Error for DecodeWarning {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_collection_accessors() {
        let warning = DecodeWarning::MissingCollection {
            record: "Project",
            field: "releases".to_string(),
        };
        assert_eq!(warning.record(), "Project");
        assert_eq!(warning.field(), "releases");
        assert_eq!(warning.kind(), "missing_collection");
        assert_eq!(
            warning.to_string(),
            "missing field \"releases\" in Project description; setting to []"
        );
    }
}
