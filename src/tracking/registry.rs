//! Field registry and the `Entity` contract
//!
//! Every entity type declares an ordered list of field descriptors. The audit
//! compiler snapshots current values through the getters, and generic callers
//! (the CLI `set` commands) write through the setters, which route into the
//! entity's tracked setter methods.

use std::fmt;

use serde::Serialize;

use super::state::{ChangeTracker, Tracked};
use crate::error::{ChronicleError, ChronicleResult};
use crate::housekeeping::Housekeeping;
use crate::models::{ActorId, RowId};
use crate::versioning::Versioned;

/// Getter for one field, rendering its natural textual form
pub type FieldGetter<E> = fn(&E) -> String;

/// Setter for one field, parsing the raw text
pub type FieldSetter<E> = fn(&mut E, &str) -> ChronicleResult<()>;

/// One entry in an entity type's field registry
pub struct FieldDescriptor<E> {
    pub name: &'static str,
    pub get: FieldGetter<E>,
    pub set: Option<FieldSetter<E>>,
}

impl<E> fmt::Debug for FieldDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("writable", &self.set.is_some())
            .finish()
    }
}

/// A record that can be tracked, stamped, persisted and audited
pub trait Entity: Tracked + Housekeeping + Serialize + Sized + 'static {
    /// Type name written to audit records and used as the table name
    const ENTITY_TYPE: &'static str;

    /// Ordered field registry
    fn fields() -> &'static [FieldDescriptor<Self>];

    /// Surrogate key assigned by the record store
    fn row_id(&self) -> Option<RowId>;

    fn assign_row_id(&mut self, id: Option<RowId>);

    /// Identifier of the logical record for audit purposes
    fn identifier(&self) -> Option<String> {
        self.row_id().map(|id| id.to_string())
    }

    /// Identifiers of parent/owner records the change is also attributed to
    fn related_identifiers(&self) -> Vec<String> {
        Vec::new()
    }

    /// Actor the entity itself names as performing the change
    fn executing_actor(&self) -> Option<ActorId> {
        None
    }

    fn versioned(&self) -> Option<&dyn Versioned> {
        None
    }

    fn versioned_mut(&mut self) -> Option<&mut dyn Versioned> {
        None
    }
}

/// Natural textual representation of a field value
///
/// Absent optional values render as the empty string.
pub trait FieldText {
    fn field_text(&self) -> String;
}

macro_rules! field_text_via_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldText for $ty {
                fn field_text(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

field_text_via_display!(String, bool, i64, u32, u64, RowId, ActorId);

impl<T: FieldText> FieldText for Option<T> {
    fn field_text(&self) -> String {
        self.as_ref().map(FieldText::field_text).unwrap_or_default()
    }
}

/// Record the prior value of `slot` in `tracker`, then overwrite it
pub fn set_tracked<T: FieldText>(
    tracker: &mut ChangeTracker,
    field: &'static str,
    slot: &mut T,
    value: T,
) {
    tracker.record_field_change(field, slot.field_text());
    *slot = value;
}

/// Current value of every registered field, in registry order
pub fn snapshot<E: Entity>(entity: &E) -> Vec<(&'static str, String)> {
    E::fields()
        .iter()
        .map(|field| (field.name, (field.get)(entity)))
        .collect()
}

/// Current value of one field
pub fn field_value<E: Entity>(entity: &E, name: &str) -> Option<String> {
    E::fields()
        .iter()
        .find(|field| field.name == name)
        .map(|field| (field.get)(entity))
}

/// Parse `raw` and write it through the field's setter
pub fn apply_field<E: Entity>(entity: &mut E, name: &str, raw: &str) -> ChronicleResult<()> {
    let field = E::fields()
        .iter()
        .find(|field| field.name == name)
        .ok_or_else(|| ChronicleError::UnknownField {
            entity_type: E::ENTITY_TYPE,
            field: name.to_string(),
        })?;

    let set = field.set.ok_or_else(|| ChronicleError::ReadOnlyField {
        entity_type: E::ENTITY_TYPE,
        field: name.to_string(),
    })?;

    set(entity, raw)
}

/// Split a `field=value` assignment
pub fn parse_assignment(s: &str) -> ChronicleResult<(&str, &str)> {
    s.split_once('=')
        .map(|(name, value)| (name.trim(), value))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| {
            ChronicleError::Validation(format!("Expected field=value, got '{}'", s))
        })
}

/// Parse helper for numeric setters
pub fn parse_number<T>(field: &'static str, raw: &str) -> ChronicleResult<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ChronicleError::invalid_value(field, raw, e.to_string()))
}

/// Empty text clears an optional field
pub fn parse_optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
