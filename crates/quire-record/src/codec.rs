//! The YAML record format.
//!
//! A record is written as a mapping tagged with its type, keys in declared
//! field order:
//!
//! ```yaml
//! !release
//! name: v1
//! status: unreleased
//! release_time:
//! log_events: []
//! ```
//!
//! Encoding reuses each field's cached raw form and caches what it computes.
//! Decoding keeps raw forms as the cache, so a record that is loaded and
//! saved unchanged is written back byte for byte.

use crate::atomic::write_atomic;
use crate::error::{Error, Result, SchemaError};
use crate::record::Record;
use crate::warning::DecodeWarning;
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::{debug, warn};

/// A decoded record and the repairs made while decoding it.
#[derive(Debug)]
pub struct Decoded<R> {
    /// The record, clean.
    pub record: R,
    /// Unknown keys skipped and collections repaired.
    pub warnings: Vec<DecodeWarning>,
}

impl<R: Record> Decoded<R> {
    /// The record, holding on to its warnings for the record that contains
    /// it to collect through [`Record::take_nested_warnings`].
    #[must_use]
    pub fn into_nested(mut self) -> R {
        self.record.state_mut().keep_decode_warnings(self.warnings);
        self.record
    }
}

/// The tag for a type name: the name with its first letter lowercased.
///
/// ```
/// assert_eq!(quire_record::type_tag("Issue"), "issue");
/// assert_eq!(quire_record::type_tag("ReleaseNote"), "releaseNote");
/// ```
#[must_use]
pub fn type_tag(type_name: &str) -> String {
    let mut chars = type_name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The type part of a tag. Long-form tags such as
/// `!tracker.example.org,2008-03-06/issue` reduce to their last segment.
fn tag_type(tag: &Tag) -> String {
    let text = tag.to_string();
    let text = text.trim_start_matches('!');
    text.rsplit_once('/').map_or(text, |(_, name)| name).to_string()
}

/// Encode a record to a tagged value, filling its serialization cache.
///
/// # Errors
///
/// Returns an error if a field value cannot be represented.
pub fn encode_value<R: Record>(record: &mut R) -> Result<Value> {
    let mut mapping = Mapping::new();
    for spec in R::schema().fields() {
        let name = spec.name();
        let raw = match cached_form(record, name)? {
            Some(raw) => raw,
            None => {
                let raw = fresh_form(record, name)?;
                if let Some(slot) = record.slot_mut(name) {
                    slot.cache_serialized(raw.clone());
                }
                raw
            }
        };
        mapping.insert(Value::String(name.to_string()), raw);
    }
    Ok(tagged::<R>(mapping))
}

/// Encode a record to a tagged value without touching its cache.
///
/// # Errors
///
/// Returns an error if a field value cannot be represented.
pub fn to_value<R: Record>(record: &R) -> Result<Value> {
    let mut mapping = Mapping::new();
    for spec in R::schema().fields() {
        let name = spec.name();
        let raw = match cached_form(record, name)? {
            Some(raw) => raw,
            None => fresh_form(record, name)?,
        };
        mapping.insert(Value::String(name.to_string()), raw);
    }
    Ok(tagged::<R>(mapping))
}

/// Encode a record to text.
///
/// # Errors
///
/// Returns an error if a field value cannot be represented.
pub fn encode<R: Record>(record: &mut R) -> Result<String> {
    let value = encode_value(record)?;
    Ok(serde_yaml::to_string(&value)?)
}

fn cached_form<R: Record>(record: &R, field: &str) -> Result<Option<Value>> {
    let slot = record.slot(field).ok_or_else(|| SchemaError::UnknownField {
        record: R::TYPE_NAME,
        field: field.to_string(),
    })?;
    Ok(slot.serialized().cloned())
}

fn fresh_form<R: Record>(record: &R, field: &str) -> Result<Value> {
    Ok(match record.value_of(field)? {
        Some(value) => record.serialized_form_of(field, value),
        None => Value::Null,
    })
}

fn tagged<R: Record>(mapping: Mapping) -> Value {
    Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new(type_tag(R::TYPE_NAME)),
        value: Value::Mapping(mapping),
    }))
}

/// Decode a record from text.
///
/// # Errors
///
/// Returns [`Error::TypeMismatch`] if the document is tagged as another
/// type, [`Error::NotARecord`] if it is not a mapping, and conversion or
/// validation errors from the record's fields.
pub fn decode<R: Record>(text: &str) -> Result<Decoded<R>> {
    let value: Value = serde_yaml::from_str(text)?;
    from_value(value)
}

/// Decode a record from a parsed value. Untagged mappings are accepted.
///
/// # Errors
///
/// As [`decode`].
pub fn from_value<R: Record>(value: Value) -> Result<Decoded<R>> {
    let mapping = record_mapping::<R>(value)?;
    let mut record = R::default();
    let mut warnings = Vec::new();

    for (key, raw) in mapping {
        let field = match key {
            Value::String(field) => field,
            other => serde_yaml::to_string(&other)?.trim_end().to_string(),
        };
        if let Some(slot) = record.slot_mut(&field) {
            slot.load_serialized(raw);
        } else {
            warn!(record = R::TYPE_NAME, field = %field, "unknown field in description; ignoring");
            warnings.push(DecodeWarning::UnknownField {
                record: R::TYPE_NAME,
                field,
            });
        }
    }

    for spec in R::schema().fields().iter().filter(|spec| spec.is_multi()) {
        let slot = record
            .slot_mut(spec.name())
            .ok_or_else(|| SchemaError::UnknownField {
                record: R::TYPE_NAME,
                field: spec.name().to_string(),
            })?;
        if !slot.is_set() {
            warn!(record = R::TYPE_NAME, field = spec.name(), "missing field in description; setting to []");
            slot.load_serialized(Value::Sequence(Vec::new()));
            warnings.push(DecodeWarning::MissingCollection {
                record: R::TYPE_NAME,
                field: spec.name().to_string(),
            });
        }
    }

    record.materialize_pending()?;
    warnings.extend(record.take_nested_warnings());
    record.validate()?;
    record.mark_clean();
    Ok(Decoded { record, warnings })
}

fn record_mapping<R: Record>(value: Value) -> Result<Mapping> {
    let value = match value {
        Value::Tagged(tagged) => {
            let found = tag_type(&tagged.tag);
            if found != type_tag(R::TYPE_NAME) {
                return Err(Error::TypeMismatch {
                    expected: R::TYPE_NAME,
                    found,
                    path: None,
                });
            }
            tagged.value
        }
        other => other,
    };
    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Err(Error::NotARecord("empty document".to_string())),
        other => Err(Error::NotARecord(format!(
            "expected a mapping, found {}",
            describe(&other)
        ))),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Read and decode a record file.
///
/// # Errors
///
/// Returns [`Error::Read`] if the file cannot be read, and the errors of
/// [`decode`] with the file's path attached to type mismatches.
pub async fn decode_file<R: Record>(path: impl AsRef<Path>) -> Result<Decoded<R>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), record = R::TYPE_NAME, "decoding record file");
    decode(&text).map_err(|e| e.at_path(path))
}

/// Encode a record and replace the file at `path` with it.
///
/// # Errors
///
/// Returns encoding errors and IO errors from the write.
pub async fn encode_file<R: Record>(record: &mut R, path: impl AsRef<Path>) -> Result<()> {
    let text = encode(record)?;
    write_atomic(path, text.as_bytes()).await
}
