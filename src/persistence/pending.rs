//! Pending changes of one commit
//!
//! Callers collect work in a `UnitOfWork`, which only borrows their entities.
//! At commit time the engine turns each scheduled entry into a
//! `PendingChange` carrying its change set, and hands the whole
//! `PendingBatch` to the registered hooks, which may rewrite it.

use std::fmt;

use super::change_set::{ChangeSet, Persistable, Row};
use crate::error::ChronicleResult;

/// Work scheduled by the caller, before change sets exist
pub(crate) enum Scheduled<'a> {
    Insert(&'a mut dyn Persistable),
    Update(&'a mut dyn Persistable),
    Delete(&'a mut dyn Persistable),
}

/// Inserts, updates and deletes to be committed together
#[derive(Default)]
pub struct UnitOfWork<'a> {
    scheduled: Vec<Scheduled<'a>>,
}

impl<'a> UnitOfWork<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a new row
    pub fn insert(&mut self, entity: &'a mut dyn Persistable) -> &mut Self {
        self.scheduled.push(Scheduled::Insert(entity));
        self
    }

    /// Schedule an update of an already committed row
    pub fn update(&mut self, entity: &'a mut dyn Persistable) -> &mut Self {
        self.scheduled.push(Scheduled::Update(entity));
        self
    }

    /// Schedule removal of an already committed row
    pub fn delete(&mut self, entity: &'a mut dyn Persistable) -> &mut Self {
        self.scheduled.push(Scheduled::Delete(entity));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.scheduled.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scheduled.len()
    }

    pub(crate) fn into_scheduled(self) -> Vec<Scheduled<'a>> {
        self.scheduled
    }
}

/// A change the engine is about to write
pub enum PendingChange<'a> {
    /// New row; the change set holds every field
    Insert {
        entity: &'a mut dyn Persistable,
        change_set: ChangeSet,
    },
    /// Existing row; the change set holds fields differing from `baseline`
    Update {
        entity: &'a mut dyn Persistable,
        baseline: Row,
        change_set: ChangeSet,
    },
    Delete {
        entity: &'a mut dyn Persistable,
    },
}

impl<'a> PendingChange<'a> {
    /// Build an insert whose change set is computed against an empty baseline
    pub fn insert(entity: &'a mut dyn Persistable) -> ChronicleResult<Self> {
        let change_set = ChangeSet::against(None, &entity.to_row()?);
        Ok(Self::Insert { entity, change_set })
    }

    /// Build an update whose change set is computed against `baseline`
    pub fn update(entity: &'a mut dyn Persistable, baseline: Row) -> ChronicleResult<Self> {
        let change_set = ChangeSet::against(Some(&baseline), &entity.to_row()?);
        Ok(Self::Update {
            entity,
            baseline,
            change_set,
        })
    }

    pub fn entity(&self) -> &dyn Persistable {
        match self {
            Self::Insert { entity, .. } | Self::Update { entity, .. } | Self::Delete { entity } => {
                &**entity
            }
        }
    }

    pub fn entity_mut(&mut self) -> &mut dyn Persistable {
        match self {
            Self::Insert { entity, .. } | Self::Update { entity, .. } | Self::Delete { entity } => {
                &mut **entity
            }
        }
    }

    pub fn change_set(&self) -> Option<&ChangeSet> {
        match self {
            Self::Insert { change_set, .. } | Self::Update { change_set, .. } => Some(change_set),
            Self::Delete { .. } => None,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Insert { .. })
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Self::Update { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }

    pub fn is_versioned(&self) -> bool {
        self.entity().as_versioned().is_some()
    }

    /// Recompute the change set from the entity's current field values
    ///
    /// Needed after anything mutates the entity once the change set exists,
    /// otherwise the mutation is not written.
    pub fn recompute_change_set(&mut self) -> ChronicleResult<()> {
        match self {
            Self::Insert { entity, change_set } => {
                *change_set = ChangeSet::against(None, &entity.to_row()?);
            }
            Self::Update {
                entity,
                baseline,
                change_set,
            } => {
                *change_set = ChangeSet::against(Some(&*baseline), &entity.to_row()?);
            }
            Self::Delete { .. } => {}
        }
        Ok(())
    }
}

impl fmt::Debug for PendingChange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Insert { .. } => "Insert",
            Self::Update { .. } => "Update",
            Self::Delete { .. } => "Delete",
        };
        f.debug_struct(kind)
            .field("entity", &self.entity().describe())
            .field("change_set", &self.change_set())
            .finish()
    }
}

/// All pending changes of one commit, in scheduling order
#[derive(Default)]
pub struct PendingBatch<'a> {
    changes: Vec<PendingChange<'a>>,
}

impl<'a> PendingBatch<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: PendingChange<'a>) {
        self.changes.push(change);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PendingChange<'a>> {
        self.changes.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, PendingChange<'a>> {
        self.changes.iter_mut()
    }

    pub fn inserts(&self) -> impl Iterator<Item = &PendingChange<'a>> {
        self.changes.iter().filter(|c| c.is_insert())
    }

    pub fn updates(&self) -> impl Iterator<Item = &PendingChange<'a>> {
        self.changes.iter().filter(|c| c.is_update())
    }

    pub fn deletes(&self) -> impl Iterator<Item = &PendingChange<'a>> {
        self.changes.iter().filter(|c| c.is_delete())
    }

    /// Take every change out, leaving the batch empty
    pub fn take(&mut self) -> Vec<PendingChange<'a>> {
        std::mem::take(&mut self.changes)
    }

    /// Replace the batch contents
    pub fn replace(&mut self, changes: Vec<PendingChange<'a>>) {
        self.changes = changes;
    }

    pub(crate) fn into_changes(self) -> Vec<PendingChange<'a>> {
        self.changes
    }
}
