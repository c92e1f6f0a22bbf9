//! The record abstraction and schema-driven construction.

use crate::error::{Error, Result, SchemaError};
use crate::prompt::{AskOptions, Prompter};
use crate::schema::{FieldSpec, Schema};
use crate::slot::FieldSlot;
use crate::walk::Node;
use crate::warning::DecodeWarning;
use serde::Serialize;
use serde_yaml::Value;
use tracing::debug;

/// Change-tracking state shared by every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordState {
    dirty: bool,
    decode_warnings: Vec<DecodeWarning>,
}

impl RecordState {
    /// Whether the record has unsaved changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Take the repairs made while decoding this record as part of another
    /// record's field. See [`crate::Decoded::into_nested`].
    pub fn take_decode_warnings(&mut self) -> Vec<DecodeWarning> {
        std::mem::take(&mut self.decode_warnings)
    }

    pub(crate) fn keep_decode_warnings(&mut self, warnings: Vec<DecodeWarning>) {
        self.decode_warnings.extend(warnings);
    }
}

/// A schema-described domain object.
///
/// Implementors declare their fields in [`Record::schema`] and map each
/// declared name to a [`crate::Slot`] in [`Record::slot`] and
/// [`Record::slot_mut`]. The codec and the construct routines go through
/// those two methods only.
pub trait Record: Node + Default + Sized + 'static {
    /// Arguments handed to generators, such as the owning project.
    type Context: ?Sized;

    /// Type name, from which the on-disk tag is derived.
    const TYPE_NAME: &'static str;

    /// The field table.
    fn schema() -> &'static Schema<Self>;

    /// Change-tracking state.
    fn state(&self) -> &RecordState;

    /// Mutable change-tracking state.
    fn state_mut(&mut self) -> &mut RecordState;

    /// The slot backing a declared field.
    fn slot(&self, field: &str) -> Option<&dyn FieldSlot>;

    /// The mutable slot backing a declared field.
    fn slot_mut(&mut self, field: &str) -> Option<&mut dyn FieldSlot>;

    /// Hook applied to a field's raw value on its way to disk.
    fn serialized_form_of(&self, _field: &str, value: Value) -> Value {
        value
    }

    /// Hook applied to a raw value read from disk. `None` defers the field:
    /// it stays in raw form until the record can interpret it.
    fn deserialized_form_of(&self, _field: &str, raw: Value) -> Option<Value> {
        Some(raw)
    }

    /// Repairs made while decoding records nested in this one's fields.
    /// Called once the fields are materialized; the default has none.
    fn take_nested_warnings(&mut self) -> Vec<DecodeWarning> {
        Vec::new()
    }

    /// Check invariants after construction or decoding.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated invariant.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Flag unsaved changes.
    fn mark_dirty(&mut self) {
        self.state_mut().dirty = true;
    }

    /// Clear the unsaved-changes flag after a load or save.
    fn mark_clean(&mut self) {
        self.state_mut().dirty = false;
    }

    /// Set a field from a raw value and mark the record dirty.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownField`] for an undeclared field and
    /// [`Error::InvalidValue`] if the value does not fit the field's type.
    fn assign(&mut self, field: &str, value: Value) -> Result<()> {
        let slot = self
            .slot_mut(field)
            .ok_or_else(|| unknown_field::<Self>(field))?;
        slot.assign(value).map_err(|source| Error::InvalidValue {
            record: Self::TYPE_NAME,
            field: field.to_string(),
            source,
        })?;
        self.mark_dirty();
        Ok(())
    }

    /// A field's in-memory value as a raw value, or `None` when unset or
    /// not yet materialized.
    ///
    /// # Errors
    ///
    /// Returns an error for an undeclared field.
    fn value_of(&self, field: &str) -> Result<Option<Value>> {
        let slot = self.slot(field).ok_or_else(|| unknown_field::<Self>(field))?;
        Ok(slot.memory_value()?)
    }

    /// Convert every pending raw field through [`Record::deserialized_form_of`].
    /// Fields the hook defers stay pending. Returns whether any remain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if a converted value does not fit its field.
    fn materialize_pending(&mut self) -> Result<bool> {
        let mut deferred = false;
        for spec in Self::schema().fields() {
            let name = spec.name();
            let raw = match self.slot(name) {
                Some(slot) if slot.is_pending() => slot.serialized().cloned(),
                Some(_) => None,
                None => return Err(unknown_field::<Self>(name)),
            };
            let Some(raw) = raw else { continue };
            let Some(decoded) = self.deserialized_form_of(name, raw) else {
                deferred = true;
                continue;
            };
            if let Some(slot) = self.slot_mut(name) {
                slot.materialize(decoded)
                    .map_err(|source| Error::InvalidValue {
                        record: Self::TYPE_NAME,
                        field: name.to_string(),
                        source,
                    })?;
            }
        }
        Ok(deferred)
    }

    /// Re-derive the in-memory values of `fields` from their cached raw
    /// forms, for when the deserialization hook's output has changed.
    /// Fields edited since they were last encoded are left alone.
    ///
    /// # Errors
    ///
    /// As [`Record::materialize_pending`].
    fn resync(&mut self, fields: &[&str]) -> Result<()> {
        for field in fields {
            self.slot_mut(field)
                .ok_or_else(|| unknown_field::<Self>(field))?
                .invalidate_memory();
        }
        self.materialize_pending().map(|_| ())
    }
}

fn unknown_field<R: Record>(field: &str) -> Error {
    SchemaError::UnknownField {
        record: R::TYPE_NAME,
        field: field.to_string(),
    }
    .into()
}

/// Field values supplied to construction, in the order given.
///
/// A `Null` value counts as not supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues(Vec<(String, Value)>);

impl FieldValues {
    /// No values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a value.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value.into());
        self
    }

    /// Add or replace a value given as any serializable type.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented.
    pub fn try_with(self, field: impl Into<String>, value: &impl Serialize) -> Result<Self> {
        Ok(self.with(field, serde_yaml::to_value(value)?))
    }

    /// Add or replace a value in place.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        match self.0.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.0.push((field, value)),
        }
    }

    /// The supplied value for `field`, ignoring `Null`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(name, value)| name == field && !value.is_null())
            .map(|(_, value)| value)
    }

    /// Names of the supplied fields.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Build a record without asking anything.
///
/// Each field, in declared order, takes the supplied value, else its
/// generator's output, else (when it is not asked for) its default or an
/// empty value. A `nil_ok` field may stay unset; any other field without a
/// value is a [`Error::MissingField`].
///
/// # Errors
///
/// Returns [`Error::MissingField`], a generator's error, a conversion error,
/// or the record's validation error.
pub fn construct<R: Record>(values: &FieldValues, context: &R::Context) -> Result<R> {
    let mut record = R::default();
    for spec in R::schema().fields() {
        let value = if let Some(value) = values.get(spec.name()) {
            value.clone()
        } else if let Some(generate) = spec.generator_fn() {
            generate(&record, context)?
        } else if !spec.is_asked() {
            spec.unasked_value()
        } else if spec.is_nil_ok() {
            continue;
        } else {
            return Err(Error::MissingField {
                record: R::TYPE_NAME,
                field: spec.name().to_string(),
                supplied: values.names(),
            });
        };
        if !value.is_null() {
            record.assign(spec.name(), value)?;
        }
    }
    record.validate()?;
    record.mark_dirty();
    debug!(record = R::TYPE_NAME, "constructed");
    Ok(record)
}

/// Build a record, asking the operator for whatever is not otherwise known.
///
/// Each field, in declared order, takes an override, else the output of its
/// interactive generator or generator, else (when it is not asked for) its
/// default, else the operator's answer. The suggested answer comes from the
/// same field of `defaults_from`, then the field's default generator, then
/// its fixed default.
///
/// # Errors
///
/// Returns a prompt, generator, conversion, or validation error.
pub fn construct_interactively<R: Record>(
    prompter: &mut dyn Prompter,
    context: &R::Context,
    overrides: &FieldValues,
    defaults_from: Option<&R>,
) -> Result<R> {
    let mut record = R::default();
    for spec in R::schema().fields() {
        let value = if let Some(value) = overrides.get(spec.name()) {
            value.clone()
        } else if let Some(generate) = spec.interactive_generator_fn() {
            generate(&record, context, prompter)?
        } else if let Some(generate) = spec.generator_fn() {
            generate(&record, context)?
        } else if !spec.is_asked() {
            spec.unasked_value()
        } else {
            ask_for_field(&record, spec, context, prompter, defaults_from)?
        };
        if !value.is_null() {
            record.assign(spec.name(), value)?;
        }
    }
    record.validate()?;
    record.mark_dirty();
    Ok(record)
}

fn ask_for_field<R: Record>(
    record: &R,
    spec: &FieldSpec<R>,
    context: &R::Context,
    prompter: &mut dyn Prompter,
    defaults_from: Option<&R>,
) -> Result<Value> {
    let question = spec.prompt_text();
    if spec.is_multiline() {
        return Ok(Value::String(prompter.ask_multiline(&question)?));
    }
    if spec.is_multi() {
        let entries = prompter.ask_for_many(&question)?;
        return Ok(Value::Sequence(entries.into_iter().map(Value::String).collect()));
    }

    let suggested = match defaults_from.map(|r| r.value_of(spec.name())).transpose()?.flatten() {
        Some(value) => Some(value),
        None => match spec.default_generator_fn() {
            Some(generate) => Some(generate(record, context)?),
            None => spec.default_value().cloned(),
        },
    };
    let mut options = AskOptions::new();
    if let Some(text) = suggested.as_ref().and_then(scalar_text) {
        options = options.with_default(text);
    }
    Ok(Value::String(prompter.ask(&question, &options)?))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
