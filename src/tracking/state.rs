//! Per-entity tracking session state
//!
//! A `ChangeTracker` lives inside every tracked entity. While a session is
//! open it remembers the value each field had before its first write.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ChronicleError, ChronicleResult};

/// Tracking session state of an entity instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingState {
    /// No session open
    #[default]
    Unchanged,
    /// Inside a `begin_new` session
    Creating,
    /// Inside a `begin_edit` session
    Editing,
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingState::Unchanged => write!(f, "UNCHANGED"),
            TrackingState::Creating => write!(f, "CREATING"),
            TrackingState::Editing => write!(f, "EDITING"),
        }
    }
}

/// Session state plus the prior value of every field written in the session
///
/// Invariant: `modified` is empty whenever `state` is `Unchanged`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    state: TrackingState,
    modified: BTreeMap<String, String>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state != TrackingState::Unchanged
    }

    /// Field name to value before the first write of this session
    pub fn modified_properties(&self) -> &BTreeMap<String, String> {
        &self.modified
    }

    /// Open a creation session. Returns false (and changes nothing) if any
    /// session is already open.
    pub fn begin_new(&mut self) -> bool {
        self.begin(TrackingState::Creating)
    }

    /// Open an edit session. Returns false (and changes nothing) if any
    /// session is already open.
    pub fn begin_edit(&mut self) -> bool {
        self.begin(TrackingState::Editing)
    }

    fn begin(&mut self, state: TrackingState) -> bool {
        if self.is_tracking() {
            return false;
        }
        self.state = state;
        self.modified.clear();
        true
    }

    /// Remember `old` as the prior value of `field`
    ///
    /// First write wins: later writes in the same session keep the value
    /// captured first. Writes outside a session are not recorded.
    pub fn record_field_change(&mut self, field: &str, old: String) {
        if !self.is_tracking() || self.modified.contains_key(field) {
            return;
        }
        self.modified.insert(field.to_string(), old);
    }

    /// Fail unless a session of kind `expected` is open
    pub fn ensure_session(
        &self,
        expected: TrackingState,
        entity_type: &'static str,
    ) -> ChronicleResult<()> {
        match self.state {
            TrackingState::Unchanged => Err(ChronicleError::UntrackedEntity { entity_type }),
            actual if actual != expected => Err(ChronicleError::SessionMismatch {
                entity_type,
                expected,
                actual,
            }),
            _ => Ok(()),
        }
    }

    /// Close a creation session
    pub fn end_new(&mut self, entity_type: &'static str) -> ChronicleResult<()> {
        self.end(TrackingState::Creating, entity_type)
    }

    /// Close an edit session
    pub fn end_edit(&mut self, entity_type: &'static str) -> ChronicleResult<()> {
        self.end(TrackingState::Editing, entity_type)
    }

    fn end(&mut self, expected: TrackingState, entity_type: &'static str) -> ChronicleResult<()> {
        self.ensure_session(expected, entity_type)?;
        self.state = TrackingState::Unchanged;
        self.modified.clear();
        Ok(())
    }
}

/// Access to the tracker embedded in an entity
pub trait Tracked {
    fn tracker(&self) -> &ChangeTracker;
    fn tracker_mut(&mut self) -> &mut ChangeTracker;

    fn tracking_state(&self) -> TrackingState {
        self.tracker().state()
    }
}
