//! Releases: named milestones that issues are assigned to.

use super::{ReleaseStatus, nested_record_serde};
use crate::error::{Result, ValidationError};
use quire_record::{
    ChangeLog, FieldSlot, FieldSpec, FieldValues, LogEvent, Named, Node, Record, RecordState,
    Schema, Slot, Timestamp,
};
use std::sync::LazyLock;
use tracing::debug;

/// A release. It starts unreleased and is released once, when all of its
/// issues are closed.
#[derive(Debug, Default)]
pub struct Release {
    state: RecordState,
    name: Slot<String>,
    status: Slot<ReleaseStatus>,
    release_time: Slot<Timestamp>,
    log_events: Slot<Vec<LogEvent>>,
}

static SCHEMA: LazyLock<Schema<Release>> = LazyLock::new(|| {
    Schema::build([
        FieldSpec::new("name").prompt("Release name"),
        FieldSpec::new("status").ask(false).default("unreleased"),
        FieldSpec::new("release_time").ask(false),
        FieldSpec::log_events(),
    ])
    .expect("release schema declares unique fields")
});

impl Release {
    /// A new, unreleased release called `name`, with a creation log entry.
    ///
    /// # Errors
    ///
    /// Returns an error if construction fails.
    pub fn new(name: &str, who: &str, comment: Option<&str>) -> Result<Self> {
        let mut release: Self =
            quire_record::construct(&FieldValues::new().with("name", name), &())?;
        release.log("created", who, comment)?;
        Ok(release)
    }

    /// The release's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.get().map_or("", String::as_str)
    }

    /// Released or not.
    #[must_use]
    pub fn status(&self) -> ReleaseStatus {
        self.status.get().copied().unwrap_or_default()
    }

    /// Shorthand for `status() == Released`.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.status() == ReleaseStatus::Released
    }

    /// When it was released.
    #[must_use]
    pub fn release_time(&self) -> Option<Timestamp> {
        self.release_time.get().copied()
    }

    /// Mark released now and log it. The caller checks that no open issue
    /// is assigned to it; [`crate::domain::Project::release`] does so.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::AlreadyReleased`] if it already is.
    pub(crate) fn release(&mut self, who: &str, comment: Option<&str>) -> Result<()> {
        if self.is_released() {
            return Err(ValidationError::AlreadyReleased(self.name().to_string()).into());
        }
        self.status.set(ReleaseStatus::Released);
        self.release_time.set(Timestamp::now());
        self.log("released", who, comment)?;
        debug!(release = self.name(), "released");
        Ok(())
    }
}

impl Named for Release {
    const KIND: &'static str = "release";

    fn name(&self) -> &str {
        Release::name(self)
    }
}

impl Node for Release {
    fn record_type(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }
}

impl Record for Release {
    type Context = ();
    const TYPE_NAME: &'static str = "Release";

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
        Some(match field {
            "name" => &self.name,
            "status" => &self.status,
            "release_time" => &self.release_time,
            "log_events" => &self.log_events,
            _ => return None,
        })
    }

    fn slot_mut(&mut self, field: &str) -> Option<&mut dyn FieldSlot> {
        Some(match field {
            "name" => &mut self.name,
            "status" => &mut self.status,
            "release_time" => &mut self.release_time,
            "log_events" => &mut self.log_events,
            _ => return None,
        })
    }

    fn validate(&self) -> quire_record::Result<()> {
        if self.name().trim().is_empty() {
            return Err(quire_record::Error::invalid(
                Self::TYPE_NAME,
                "release name must not be empty",
            ));
        }
        if self.status.is_set() && self.is_released() && self.release_time.get().is_none() {
            return Err(quire_record::Error::invalid(
                Self::TYPE_NAME,
                format!("release {} is released but has no release time", self.name()),
            ));
        }
        Ok(())
    }
}

impl ChangeLog for Release {
    fn log_slot(&self) -> &Slot<Vec<LogEvent>> {
        &self.log_events
    }

    fn log_slot_mut(&mut self) -> &mut Slot<Vec<LogEvent>> {
        &mut self.log_events
    }
}

nested_record_serde!(Release);
