//! Components: named groups of issues.

use super::nested_record_serde;
use crate::error::Result;
use quire_record::{FieldSlot, FieldSpec, FieldValues, Named, Node, Record, RecordState, Schema, Slot};
use std::sync::LazyLock;

/// A grouping key for issues. Its name prefixes the display names of the
/// issues it groups.
#[derive(Debug, Default)]
pub struct Component {
    state: RecordState,
    name: Slot<String>,
}

static SCHEMA: LazyLock<Schema<Component>> = LazyLock::new(|| {
    Schema::build([FieldSpec::new("name").prompt("Component name")])
        .expect("component schema declares unique fields")
});

impl Component {
    /// A new component called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if construction fails.
    pub fn new(name: &str) -> Result<Self> {
        Ok(quire_record::construct(
            &FieldValues::new().with("name", name),
            &(),
        )?)
    }

    /// The component's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.get().map_or("", String::as_str)
    }

    /// The prefix of its issues' display names: whitespace runs become `-`,
    /// and the result is lowercased.
    #[must_use]
    pub fn name_prefix(&self) -> String {
        name_prefix(self.name())
    }
}

/// Display-name prefix for a component name, also used for issues whose
/// component is missing from the project.
pub(crate) fn name_prefix(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

impl Named for Component {
    const KIND: &'static str = "component";

    fn name(&self) -> &str {
        Component::name(self)
    }
}

impl Node for Component {
    fn record_type(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }
}

impl Record for Component {
    type Context = ();
    const TYPE_NAME: &'static str = "Component";

    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn slot(&self, field: &str) -> Option<&dyn FieldSlot> {
        match field {
            "name" => Some(&self.name),
            _ => None,
        }
    }

    fn slot_mut(&mut self, field: &str) -> Option<&mut dyn FieldSlot> {
        match field {
            "name" => Some(&mut self.name),
            _ => None,
        }
    }

    fn validate(&self) -> quire_record::Result<()> {
        if self.name().trim().is_empty() {
            return Err(quire_record::Error::invalid(
                Self::TYPE_NAME,
                "component name must not be empty",
            ));
        }
        Ok(())
    }
}

nested_record_serde!(Component);
