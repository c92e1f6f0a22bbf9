//! Change logs for records that record who did what.

use crate::error::Result;
use crate::record::Record;
use crate::slot::Slot;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// One change-log entry.
///
/// Written as a four-element sequence `[time, who, what, comment]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EventRepr", into = "EventRepr")]
pub struct LogEvent {
    /// When it happened.
    pub time: Timestamp,
    /// The actor, usually `Name <email>`.
    pub who: String,
    /// What was done.
    pub what: String,
    /// Free-text comment; empty when none was given.
    pub comment: String,
}

type EventRepr = (Timestamp, String, String, Option<String>);

impl From<EventRepr> for LogEvent {
    fn from((time, who, what, comment): EventRepr) -> Self {
        Self {
            time,
            who,
            what,
            comment: comment.unwrap_or_default(),
        }
    }
}

impl From<LogEvent> for EventRepr {
    fn from(event: LogEvent) -> Self {
        (event.time, event.who, event.what, Some(event.comment))
    }
}

impl LogEvent {
    /// An event stamped with the current time.
    pub fn now(who: impl Into<String>, what: impl Into<String>, comment: Option<&str>) -> Self {
        Self {
            time: Timestamp::now(),
            who: who.into(),
            what: what.into(),
            comment: comment.unwrap_or_default().to_string(),
        }
    }
}

/// A record with a `log_events` field.
pub trait ChangeLog: Record {
    /// The slot holding the log.
    fn log_slot(&self) -> &Slot<Vec<LogEvent>>;

    /// The mutable slot holding the log.
    fn log_slot_mut(&mut self) -> &mut Slot<Vec<LogEvent>>;

    /// Logged events, oldest first.
    fn log_events(&self) -> &[LogEvent] {
        self.log_slot().get().map_or(&[], Vec::as_slice)
    }

    /// Append `(now, who, what, comment)` and mark the record dirty.
    ///
    /// # Errors
    ///
    /// Returns an error if the log was still in raw form and does not decode.
    fn log(&mut self, what: &str, who: &str, comment: Option<&str>) -> Result<()> {
        self.log_slot_mut()
            .make_mut()?
            .push(LogEvent::now(who, what, comment));
        self.mark_dirty();
        Ok(())
    }

    /// Time of the newest event.
    fn last_event_time(&self) -> Option<Timestamp> {
        self.log_events().last().map(|event| event.time)
    }
}
