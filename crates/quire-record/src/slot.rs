//! Per-field value storage.
//!
//! A [`Slot`] holds one field of a record. The value either lives in memory
//! as its typed form, or in the raw form it had in the file, or both when the
//! two are known to agree. Writing through the typed accessor drops the raw
//! form, so the next encode recomputes it; encoding a field caches the raw
//! form so unchanged fields are never re-encoded.

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::Value;

/// One field's value, in memory, serialized, or both.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    /// Never assigned and not present in the file.
    Unset,
    /// Assigned in memory since the last encode.
    Memory(T),
    /// Read from a file and not yet converted to `T`.
    Serialized(Value),
    /// Both forms at once. Only the typed value is authoritative: the raw
    /// form is never read back into it, and [`Slot::get_mut`] and
    /// [`Slot::set`] drop it before the value can change. This is the one
    /// state that holds both, and it exists so an unchanged field is written
    /// back byte for byte.
    Synced(T, Value),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> Slot<T> {
    /// The typed value, if it has been assigned or materialized.
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Memory(value) | Self::Synced(value, _) => Some(value),
            Self::Unset | Self::Serialized(_) => None,
        }
    }

    /// Replace the value, dropping any cached raw form.
    pub fn set(&mut self, value: T) {
        *self = Self::Memory(value);
    }

    /// Reset to [`Slot::Unset`].
    pub fn clear(&mut self) {
        *self = Self::Unset;
    }

    /// Mutable access to the typed value. The cached raw form is dropped,
    /// since the caller is about to change what it encodes.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if let Self::Synced(..) = self
            && let Self::Synced(value, _) = std::mem::take(self)
        {
            *self = Self::Memory(value);
        }
        match self {
            Self::Memory(value) => Some(value),
            _ => None,
        }
    }

    /// Mutable access that keeps the cached raw form.
    ///
    /// Only for changes that do not affect the encoding, such as clearing the
    /// dirty flag of a nested record after a save.
    pub fn peek_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Memory(value) | Self::Synced(value, _) => Some(value),
            Self::Unset | Self::Serialized(_) => None,
        }
    }

    /// The cached raw form, if any.
    pub fn serialized(&self) -> Option<&Value> {
        match self {
            Self::Serialized(raw) | Self::Synced(_, raw) => Some(raw),
            Self::Unset | Self::Memory(_) => None,
        }
    }

    /// True unless the slot is [`Slot::Unset`].
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// True while the raw form still waits to be converted.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Serialized(_))
    }
}

impl<T: DeserializeOwned + Default> Slot<T> {
    /// Mutable access that materializes the value first.
    ///
    /// An unset slot starts from `T::default()`. A pending raw form is
    /// converted directly, without the owning record's deserialization hook.
    ///
    /// # Errors
    ///
    /// Returns an error if a pending raw form does not convert to `T`.
    pub fn make_mut(&mut self) -> Result<&mut T> {
        let value = match std::mem::take(self) {
            Self::Unset => T::default(),
            Self::Serialized(raw) => match serde_yaml::from_value(raw.clone()) {
                Ok(value) => value,
                Err(e) => {
                    *self = Self::Serialized(raw);
                    return Err(e.into());
                }
            },
            Self::Memory(value) | Self::Synced(value, _) => value,
        };
        *self = Self::Memory(value);
        let Self::Memory(value) = self else {
            unreachable!("slot was just set to Memory")
        };
        Ok(value)
    }
}

/// Type-erased access to a [`Slot`], used by the generic construct and codec routines.
pub trait FieldSlot {
    /// True unless the slot is unset.
    fn is_set(&self) -> bool;

    /// The cached raw form, if any.
    fn serialized(&self) -> Option<&Value>;

    /// True while only the raw form is present.
    fn is_pending(&self) -> bool;

    /// The in-memory value converted to a raw value, before any record hook.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented.
    fn memory_value(&self) -> std::result::Result<Option<Value>, serde_yaml::Error>;

    /// Assign from a raw value. `Null` clears the slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not convert to the slot's type.
    fn assign(&mut self, value: Value) -> std::result::Result<(), serde_yaml::Error>;

    /// Store a raw value read from a file. `Null` leaves the slot unset.
    fn load_serialized(&mut self, raw: Value);

    /// Remember the encoding of an in-memory value.
    fn cache_serialized(&mut self, raw: Value);

    /// Convert a pending raw form, keeping the raw form as the cache.
    /// `decoded` is the raw form after the record's deserialization hook.
    ///
    /// # Errors
    ///
    /// Returns an error if `decoded` does not convert to the slot's type.
    fn materialize(&mut self, decoded: Value) -> std::result::Result<(), serde_yaml::Error>;

    /// Drop the in-memory value when it was derived from the cached raw
    /// form, so it can be materialized again.
    fn invalidate_memory(&mut self);
}

impl<T: Serialize + DeserializeOwned> FieldSlot for Slot<T> {
    fn is_set(&self) -> bool {
        Slot::is_set(self)
    }

    fn serialized(&self) -> Option<&Value> {
        Slot::serialized(self)
    }

    fn is_pending(&self) -> bool {
        Slot::is_pending(self)
    }

    fn memory_value(&self) -> std::result::Result<Option<Value>, serde_yaml::Error> {
        self.get().map(serde_yaml::to_value).transpose()
    }

    fn assign(&mut self, value: Value) -> std::result::Result<(), serde_yaml::Error> {
        if value.is_null() {
            self.clear();
        } else {
            self.set(serde_yaml::from_value(value)?);
        }
        Ok(())
    }

    fn load_serialized(&mut self, raw: Value) {
        *self = if raw.is_null() {
            Self::Unset
        } else {
            Self::Serialized(raw)
        };
    }

    fn cache_serialized(&mut self, raw: Value) {
        if let Self::Memory(_) = self
            && let Self::Memory(value) = std::mem::take(self)
        {
            *self = Self::Synced(value, raw);
        }
    }

    fn materialize(&mut self, decoded: Value) -> std::result::Result<(), serde_yaml::Error> {
        if let Self::Serialized(raw) = self {
            let value = serde_yaml::from_value(decoded)?;
            let raw = std::mem::take(raw);
            *self = Self::Synced(value, raw);
        }
        Ok(())
    }

    fn invalidate_memory(&mut self) {
        if let Self::Synced(_, raw) = self {
            let raw = std::mem::take(raw);
            *self = Self::Serialized(raw);
        }
    }
}

/// A sub-record that is unique by name within its collection.
pub trait Named {
    /// Singular noun for the item, used in error messages.
    const KIND: &'static str;

    /// The item's name.
    fn name(&self) -> &str;
}

impl<T: Named + DeserializeOwned> Slot<Vec<T>> {
    /// Find an item by name.
    pub fn find_named(&self, name: &str) -> Option<&T> {
        self.get()?.iter().find(|item| item.name() == name)
    }

    /// Append an item, rejecting a name already in the collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] on a collision, or a conversion error
    /// if the collection was still in raw form and does not decode.
    pub fn add_named(&mut self, item: T) -> Result<()> {
        let items = self.make_mut()?;
        if items.iter().any(|existing| existing.name() == item.name()) {
            return Err(Error::DuplicateName {
                item: T::KIND.to_string(),
                name: item.name().to_string(),
            });
        }
        items.push(item);
        Ok(())
    }

    /// Remove and return the item with the given name.
    ///
    /// # Errors
    ///
    /// Returns a conversion error if the collection was still in raw form and does not decode.
    pub fn remove_named(&mut self, name: &str) -> Result<Option<T>> {
        let items = self.make_mut()?;
        Ok(items
            .iter()
            .position(|item| item.name() == name)
            .map(|index| items.remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag {
        name: String,
    }

    impl Named for Tag {
        const KIND: &'static str = "tag";

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn tag(name: &str) -> Tag {
        Tag {
            name: name.to_string(),
        }
    }

    #[test]
    fn setting_drops_cached_raw() {
        let mut slot = Slot::Synced("old".to_string(), Value::from("old"));
        slot.set("new".to_string());
        assert_eq!(slot, Slot::Memory("new".to_string()));
        assert!(FieldSlot::serialized(&slot).is_none());
    }

    #[test]
    fn get_mut_invalidates_but_peek_mut_does_not() {
        let mut slot = Slot::Synced(1_i64, Value::from(1));
        let _ = slot.peek_mut();
        assert!(slot.serialized().is_some());
        *slot.get_mut().unwrap() += 1;
        assert_eq!(slot, Slot::Memory(2));
    }

    #[test]
    fn set_never_leaves_a_stale_cache() {
        let mut slot = Slot::Synced("old".to_string(), Value::from("old"));
        slot.set("new".to_string());
        assert_eq!(slot.serialized(), None);
        assert_eq!(slot.get().map(String::as_str), Some("new"));
    }

    #[test]
    fn cache_then_materialize_cycle() {
        let mut slot: Slot<String> = Slot::default();
        FieldSlot::load_serialized(&mut slot, Value::from("raw"));
        assert!(slot.is_pending());
        assert_eq!(slot.get(), None);

        slot.materialize(Value::from("decoded")).unwrap();
        assert_eq!(slot.get().map(String::as_str), Some("decoded"));
        assert_eq!(slot.serialized(), Some(&Value::from("raw")));

        slot.invalidate_memory();
        assert_eq!(slot, Slot::Serialized(Value::from("raw")));
    }

    #[test]
    fn null_means_unset() {
        let mut slot: Slot<String> = Slot::Memory("x".into());
        FieldSlot::assign(&mut slot, Value::Null).unwrap();
        assert_eq!(slot, Slot::Unset);
        FieldSlot::load_serialized(&mut slot, Value::Null);
        assert!(!slot.is_set());
    }

    #[test]
    fn cache_only_applies_to_memory_values() {
        let mut slot: Slot<String> = Slot::Unset;
        slot.cache_serialized(Value::Null);
        assert_eq!(slot, Slot::Unset);

        let mut pending: Slot<String> = Slot::Serialized(Value::from("raw"));
        pending.cache_serialized(Value::from("other"));
        assert_eq!(pending, Slot::Serialized(Value::from("raw")));
    }

    #[test]
    fn add_named_rejects_duplicates() {
        let mut slot: Slot<Vec<Tag>> = Slot::Unset;
        slot.add_named(tag("a")).unwrap();
        slot.add_named(tag("b")).unwrap();
        let err = slot.add_named(tag("a")).unwrap_err();
        assert_eq!(err.to_string(), "already has a tag with name \"a\"");
        assert_eq!(slot.get().unwrap().len(), 2);
    }

    #[test]
    fn remove_named_from_raw_collection() {
        let raw = serde_yaml::to_value(vec![tag("a"), tag("b")]).unwrap();
        let mut slot: Slot<Vec<Tag>> = Slot::Serialized(raw);
        assert_eq!(slot.remove_named("a").unwrap(), Some(tag("a")));
        assert_eq!(slot.remove_named("zzz").unwrap(), None);
        assert_eq!(slot.find_named("b"), Some(&tag("b")));
    }
}
