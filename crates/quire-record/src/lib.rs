//! Declarative record schemas with a diff-friendly YAML codec.
//!
//! A record type declares an ordered table of fields ([`Schema`]) and keeps
//! each field in a [`Slot`] that remembers both the in-memory value and its
//! last on-disk form. On top of that this crate provides:
//!
//! - schema-driven construction, either from supplied values ([`construct`])
//!   or by asking an operator through a [`Prompter`] ([`construct_interactively`]);
//! - a YAML codec ([`encode`], [`decode`]) that writes fields in declared
//!   order under a type tag and tolerates unknown or missing keys on read,
//!   reporting them as [`DecodeWarning`]s;
//! - dirty tracking and a graph [`walk`] for deciding what to write back;
//! - change logs ([`ChangeLog`]) and UTC [`Timestamp`]s.
//!
//! # Example
//!
//! ```
//! use quire_record::{
//!     FieldSlot, FieldSpec, FieldValues, Node, Record, RecordState, Schema, Slot,
//! };
//! use std::sync::LazyLock;
//!
//! #[derive(Default)]
//! struct Note {
//!     state: RecordState,
//!     title: Slot<String>,
//!     tags: Slot<Vec<String>>,
//! }
//!
//! impl Node for Note {
//!     fn record_type(&self) -> &'static str {
//!         Self::TYPE_NAME
//!     }
//!
//!     fn is_dirty(&self) -> bool {
//!         self.state.is_dirty()
//!     }
//! }
//!
//! static NOTE_SCHEMA: LazyLock<Schema<Note>> = LazyLock::new(|| {
//!     Schema::build([FieldSpec::new("title"), FieldSpec::new("tags").multi().ask(false)])
//!         .expect("note schema")
//! });
//!
//! impl Record for Note {
//!     type Context = ();
//!     const TYPE_NAME: &'static str = "Note";
//!
//!     fn schema() -> &'static Schema<Self> {
//!         &NOTE_SCHEMA
//!     }
//!
//!     fn state(&self) -> &RecordState {
//!         &self.state
//!     }
//!
//!     fn state_mut(&mut self) -> &mut RecordState {
//!         &mut self.state
//!     }
//!
//!     fn slot(&self, field: &str) -> Option<&dyn FieldSlot> {
//!         match field {
//!             "title" => Some(&self.title),
//!             "tags" => Some(&self.tags),
//!             _ => None,
//!         }
//!     }
//!
//!     fn slot_mut(&mut self, field: &str) -> Option<&mut dyn FieldSlot> {
//!         match field {
//!             "title" => Some(&mut self.title),
//!             "tags" => Some(&mut self.tags),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let mut note: Note =
//!     quire_record::construct(&FieldValues::new().with("title", "groceries"), &())?;
//! let text = quire_record::encode(&mut note)?;
//! assert!(text.starts_with("!note\n"));
//! assert!(text.find("title:") < text.find("tags:"));
//!
//! let back = quire_record::decode::<Note>(&text)?.record;
//! assert_eq!(back.title.get().map(String::as_str), Some("groceries"));
//! assert!(!back.is_dirty());
//! # Ok::<(), quire_record::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod changelog;
pub mod codec;
pub mod error;
pub mod prompt;
pub mod record;
pub mod schema;
pub mod slot;
pub mod timestamp;
pub mod walk;
pub mod warning;

pub use atomic::write_atomic;
pub use changelog::{ChangeLog, LogEvent};
pub use codec::{
    Decoded, decode, decode_file, encode, encode_file, encode_value,
    from_value, to_value, type_tag,
};
pub use error::{Error, Result, SchemaError};
#[cfg(any(test, feature = "test-util"))]
pub use prompt::ScriptedPrompter;
pub use prompt::{AskOptions, Prompter};
pub use record::{FieldValues, Record, RecordState, construct, construct_interactively};
pub use schema::{FieldSpec, Generator, InteractiveGenerator, LOG_EVENTS, Schema};
pub use slot::{FieldSlot, Named, Slot};
pub use timestamp::Timestamp;
pub use walk::{Node, Walk, file_is_dirty, walk, walk_file};
pub use warning::DecodeWarning;
