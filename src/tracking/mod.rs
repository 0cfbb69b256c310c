//! Change tracking for entities
//!
//! A tracking session is a bounded `begin_*` .. `end_*` interval during which
//! every field setter records the field's prior value. Sessions come in two
//! kinds, creation and edit, and there is no transition between them:
//!
//! ```text
//! UNCHANGED --begin_new--> CREATING --end_new--> UNCHANGED
//! UNCHANGED --begin_edit-> EDITING  --end_edit-> UNCHANGED
//! ```
//!
//! Mutations made while no session is open are not recorded.

mod registry;
mod state;

pub use registry::{
    apply_field, field_value, parse_assignment, parse_number, parse_optional_text, set_tracked,
    snapshot, Entity, FieldDescriptor, FieldGetter, FieldSetter, FieldText,
};
pub use state::{ChangeTracker, Tracked, TrackingState};

use crate::error::ChronicleResult;

/// Open a creation session; no-op if a session is already open
pub fn begin_new<E: Entity>(entity: &mut E) {
    if entity.tracker_mut().begin_new() {
        tracing::debug!(entity_type = E::ENTITY_TYPE, "tracking session opened (new)");
    }
}

/// Open an edit session; no-op if a session is already open
pub fn begin_edit<E: Entity>(entity: &mut E) {
    if entity.tracker_mut().begin_edit() {
        tracing::debug!(
            entity_type = E::ENTITY_TYPE,
            id = ?entity.identifier(),
            "tracking session opened (edit)"
        );
    }
}

/// Close a creation session
pub fn end_new<E: Entity>(entity: &mut E) -> ChronicleResult<()> {
    entity.tracker_mut().end_new(E::ENTITY_TYPE)
}

/// Close an edit session
pub fn end_edit<E: Entity>(entity: &mut E) -> ChronicleResult<()> {
    entity.tracker_mut().end_edit(E::ENTITY_TYPE)
}
