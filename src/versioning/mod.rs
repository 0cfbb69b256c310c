//! Effective-dated versioning
//!
//! A versioned record is never overwritten once committed. Every edit becomes
//! a new row sharing the record's logical key, and the row with the greatest
//! effective time is the current version. The commit interceptor performs the
//! update-to-insert redirect through `VersioningPolicy`.

mod policy;

pub use policy::VersioningPolicy;

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;

/// Capability of entities that keep their history as versions
pub trait Versioned {
    /// Identity shared by every version of the record
    fn logical_key(&self) -> String;

    fn effective_time(&self) -> Option<Timestamp>;

    /// Set the effective time explicitly; the policy will use it as is
    fn set_effective_time(&mut self, at: Timestamp);

    /// Set the effective time on behalf of the system
    fn assign_effective_time(&mut self, at: Timestamp);

    fn has_explicit_effective_time(&self) -> bool;
}

/// Effective time storage embedded in versioned entities
///
/// Whether the value was set explicitly is session state and is not
/// persisted: a version loaded from the store counts as not explicit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveDating {
    #[serde(default)]
    effective_time: Option<Timestamp>,
    #[serde(skip)]
    explicit: bool,
}

impl EffectiveDating {
    pub fn effective_time(&self) -> Option<Timestamp> {
        self.effective_time
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn set_explicit(&mut self, at: Timestamp) {
        self.effective_time = Some(at);
        self.explicit = true;
    }

    pub fn assign(&mut self, at: Timestamp) {
        self.effective_time = Some(at);
        self.explicit = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_flag_not_persisted() {
        let mut dating = EffectiveDating::default();
        dating.set_explicit(500);
        assert!(dating.is_explicit());

        let json = serde_json::to_string(&dating).unwrap();
        let loaded: EffectiveDating = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.effective_time(), Some(500));
        assert!(!loaded.is_explicit());
    }

    #[test]
    fn test_assign_clears_explicit() {
        let mut dating = EffectiveDating::default();
        dating.set_explicit(10);
        dating.assign(20);
        assert_eq!(dating.effective_time(), Some(20));
        assert!(!dating.is_explicit());
    }
}
