//! Rows, change sets and the object-safe view of an entity
//!
//! The engine handles entities of different types in one batch, so it sees
//! them through `Persistable`, which every `Entity` implements.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{ChronicleError, ChronicleResult};
use crate::housekeeping::{is_housekeeping_field, Housekeeping};
use crate::models::RowId;
use crate::tracking::Entity;
use crate::versioning::Versioned;

/// Stored field values of one row
pub type Row = Map<String, Value>;

/// One field's transition inside a change set
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    /// Value in the baseline row, `None` when there is no baseline
    pub old: Option<Value>,
    pub new: Value,
}

/// Fields whose current value differs from a baseline row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: BTreeMap<String, FieldChange>,
}

impl ChangeSet {
    /// Compute the changes of `current` relative to `baseline`
    ///
    /// Without a baseline every field of `current` is a change, which is what
    /// an insert persists.
    pub fn against(baseline: Option<&Row>, current: &Row) -> Self {
        let changes = current
            .iter()
            .filter_map(|(name, value)| {
                let old = baseline.and_then(|row| row.get(name));
                if baseline.is_some() && old == Some(value) {
                    return None;
                }
                Some((
                    name.clone(),
                    FieldChange {
                        old: old.cloned(),
                        new: value.clone(),
                    },
                ))
            })
            .collect();

        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.changes.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.changes.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    /// True if any changed field is caller-owned rather than housekeeping
    pub fn has_non_housekeeping_changes(&self) -> bool {
        self.fields().any(|field| !is_housekeeping_field(field))
    }

    /// Write the new values into `row`
    pub fn apply_to(&self, row: &mut Row) {
        for (name, change) in &self.changes {
            row.insert(name.clone(), change.new.clone());
        }
    }

    /// New values as a full row
    pub fn into_row(self) -> Row {
        self.changes
            .into_iter()
            .map(|(name, change)| (name, change.new))
            .collect()
    }
}

/// Object-safe view of an entity used by the engine and its hooks
pub trait Persistable {
    fn entity_type(&self) -> &'static str;

    fn persisted_id(&self) -> Option<RowId>;

    fn assign_persisted_id(&mut self, id: Option<RowId>);

    /// Serialized field values, excluding the row id and tracking state
    fn to_row(&self) -> ChronicleResult<Row>;

    fn housekeeping_mut(&mut self) -> &mut dyn Housekeeping;

    fn as_versioned(&self) -> Option<&dyn Versioned>;

    fn as_versioned_mut(&mut self) -> Option<&mut dyn Versioned>;

    /// Short label for logs, e.g. `Order#42`
    fn describe(&self) -> String {
        match self.persisted_id() {
            Some(id) => format!("{}#{}", self.entity_type(), id),
            None => format!("{}#new", self.entity_type()),
        }
    }
}

impl<E: Entity> Persistable for E {
    fn entity_type(&self) -> &'static str {
        E::ENTITY_TYPE
    }

    fn persisted_id(&self) -> Option<RowId> {
        self.row_id()
    }

    fn assign_persisted_id(&mut self, id: Option<RowId>) {
        self.assign_row_id(id)
    }

    fn to_row(&self) -> ChronicleResult<Row> {
        match serde_json::to_value(self)? {
            Value::Object(row) => Ok(row),
            other => Err(ChronicleError::Storage(format!(
                "{} serialized to {} instead of an object",
                E::ENTITY_TYPE,
                other
            ))),
        }
    }

    fn housekeeping_mut(&mut self) -> &mut dyn Housekeeping {
        self
    }

    fn as_versioned(&self) -> Option<&dyn Versioned> {
        self.versioned()
    }

    fn as_versioned_mut(&mut self) -> Option<&mut dyn Versioned> {
        self.versioned_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_against_empty_baseline_takes_all_fields() {
        let current = row(json!({"status": "PENDING", "total_cents": 100}));
        let changes = ChangeSet::against(None, &current);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes.get("status").unwrap().old, None);
        assert_eq!(changes.into_row(), current);
    }

    #[test]
    fn test_against_baseline_keeps_only_differences() {
        let baseline = row(json!({"status": "PENDING", "total_cents": 100}));
        let current = row(json!({"status": "SHIPPED", "total_cents": 100}));
        let changes = ChangeSet::against(Some(&baseline), &current);

        assert_eq!(changes.len(), 1);
        let change = changes.get("status").unwrap();
        assert_eq!(change.old, Some(json!("PENDING")));
        assert_eq!(change.new, json!("SHIPPED"));
    }

    #[test]
    fn test_housekeeping_only_changes() {
        let baseline = row(json!({"status": "PENDING", "modified_on": 1}));
        let current = row(json!({"status": "PENDING", "modified_on": 2}));
        let changes = ChangeSet::against(Some(&baseline), &current);

        assert!(!changes.is_empty());
        assert!(!changes.has_non_housekeeping_changes());
    }

    #[test]
    fn test_apply_to_merges_new_values() {
        let mut stored = row(json!({"status": "PENDING", "notes": "x"}));
        let current = row(json!({"status": "SHIPPED", "notes": "x"}));
        ChangeSet::against(Some(&stored.clone()), &current).apply_to(&mut stored);
        assert_eq!(stored, current);
    }
}
