//! Field declarations.
//!
//! Each record type owns one [`Schema`]: an ordered table of [`FieldSpec`]s,
//! usually built once in a `LazyLock` static. Declaration order is the order
//! fields are constructed in and the order they are written to disk.

use crate::error::{Result, SchemaError};
use crate::prompt::Prompter;
use crate::record::Record;
use serde_yaml::Value;
use std::fmt;

/// Computes a field value from the partly built record and the caller's context.
pub type Generator<R> = fn(&R, &<R as Record>::Context) -> Result<Value>;

/// Like [`Generator`], but may ask the operator questions.
pub type InteractiveGenerator<R> =
    fn(&R, &<R as Record>::Context, &mut dyn Prompter) -> Result<Value>;

/// Name of the change-log field added by [`FieldSpec::log_events`].
pub const LOG_EVENTS: &str = "log_events";

/// How one field is populated and written.
pub struct FieldSpec<R: Record> {
    name: &'static str,
    multi: bool,
    ask: bool,
    nil_ok: bool,
    multiline: bool,
    prompt: Option<&'static str>,
    default: Option<Value>,
    default_generator: Option<Generator<R>>,
    generator: Option<Generator<R>>,
    interactive_generator: Option<InteractiveGenerator<R>>,
}

impl<R: Record> FieldSpec<R> {
    /// A single-valued field that is asked for interactively and required otherwise.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            multi: false,
            ask: true,
            nil_ok: false,
            multiline: false,
            prompt: None,
            default: None,
            default_generator: None,
            generator: None,
            interactive_generator: None,
        }
    }

    /// The change log: a collection of events that is never asked for.
    #[must_use]
    pub fn log_events() -> Self {
        Self::new(LOG_EVENTS).multi().ask(false)
    }

    /// Make this an ordered collection.
    #[must_use]
    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    /// With `false`, never prompt: the field takes its default (or an empty
    /// value) and is not required by non-interactive construction.
    #[must_use]
    pub fn ask(mut self, ask: bool) -> Self {
        self.ask = ask;
        self
    }

    /// Allow non-interactive construction to leave the field unset.
    #[must_use]
    pub fn nil_ok(mut self) -> Self {
        self.nil_ok = true;
        self
    }

    /// Ask for a block of text rather than one line.
    #[must_use]
    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    /// Prompt text. Defaults to the capitalized field name.
    #[must_use]
    pub fn prompt(mut self, prompt: &'static str) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Fixed default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Computed default, suggested when prompting.
    #[must_use]
    pub fn default_generator(mut self, generator: Generator<R>) -> Self {
        self.default_generator = Some(generator);
        self
    }

    /// Always compute the value instead of taking it from the operator.
    #[must_use]
    pub fn generator(mut self, generator: Generator<R>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Compute the value during interactive construction, overriding
    /// [`FieldSpec::generator`] there.
    #[must_use]
    pub fn interactive_generator(mut self, generator: InteractiveGenerator<R>) -> Self {
        self.interactive_generator = Some(generator);
        self
    }

    /// Field name, which is also the key on disk.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this is an ordered collection.
    #[must_use]
    pub fn is_multi(&self) -> bool {
        self.multi
    }

    /// Whether the field is ever asked for.
    #[must_use]
    pub fn is_asked(&self) -> bool {
        self.ask
    }

    /// Whether non-interactive construction may leave it unset.
    #[must_use]
    pub fn is_nil_ok(&self) -> bool {
        self.nil_ok
    }

    /// Whether prompting asks for a block of text.
    #[must_use]
    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    /// The question put to the operator.
    #[must_use]
    pub fn prompt_text(&self) -> String {
        match self.prompt {
            Some(prompt) => prompt.to_string(),
            None => capitalize(self.name),
        }
    }

    /// The fixed default.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The value used for a field that is not asked for: the default, an
    /// empty collection, or nothing.
    #[must_use]
    pub fn unasked_value(&self) -> Value {
        match (&self.default, self.multi) {
            (Some(default), _) => default.clone(),
            (None, true) => Value::Sequence(Vec::new()),
            (None, false) => Value::Null,
        }
    }

    pub(crate) fn default_generator_fn(&self) -> Option<Generator<R>> {
        self.default_generator
    }

    pub(crate) fn generator_fn(&self) -> Option<Generator<R>> {
        self.generator
    }

    pub(crate) fn interactive_generator_fn(&self) -> Option<InteractiveGenerator<R>> {
        self.interactive_generator
    }
}

impl<R: Record> fmt::Debug for FieldSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("multi", &self.multi)
            .field("ask", &self.ask)
            .field("nil_ok", &self.nil_ok)
            .field("multiline", &self.multiline)
            .field("prompt", &self.prompt)
            .field("default", &self.default)
            .field("generator", &self.generator.is_some())
            .finish_non_exhaustive()
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The ordered field table of one record type.
pub struct Schema<R: Record> {
    fields: Vec<FieldSpec<R>>,
}

impl<R: Record> Schema<R> {
    /// Declare `fields` in order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateField`] if a name repeats.
    pub fn build(fields: impl IntoIterator<Item = FieldSpec<R>>) -> std::result::Result<Self, SchemaError> {
        let mut schema = Self { fields: Vec::new() };
        for field in fields {
            schema.declare_field(field)?;
        }
        Ok(schema)
    }

    /// Append one field declaration.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateField`] if the name is already declared.
    pub fn declare_field(&mut self, field: FieldSpec<R>) -> std::result::Result<(), SchemaError> {
        if self.get(field.name).is_some() {
            return Err(SchemaError::DuplicateField {
                record: R::TYPE_NAME,
                field: field.name.to_string(),
            });
        }
        self.fields.push(field);
        Ok(())
    }

    /// All fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec<R>] {
        &self.fields
    }

    /// Look up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec<R>> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Look up a field that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownField`] if it is not declared.
    pub fn field(&self, name: &str) -> std::result::Result<&FieldSpec<R>, SchemaError> {
        self.get(name).ok_or_else(|| SchemaError::UnknownField {
            record: R::TYPE_NAME,
            field: name.to_string(),
        })
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }
}

impl<R: Record> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("record", &R::TYPE_NAME)
            .field("fields", &self.fields)
            .finish()
    }
}
