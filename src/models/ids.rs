//! Strongly-typed ID wrappers
//!
//! Using newtype wrappers prevents accidentally mixing up row ids, actor ids
//! and audit record ids at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Macro to generate UUID-backed ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse an ID from a string
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.to_string()[..8])
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if let Ok(uuid) = Uuid::parse_str(s) {
                    return Ok(Self(uuid));
                }
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

/// Macro to generate integer-backed ID newtype wrappers
macro_rules! define_numeric_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

define_id!(AuditLogId, "aud-");

// Surrogate key generated by the record store, sequential per entity type
define_numeric_id!(RowId);

// Acting principal; 0 is the system
define_numeric_id!(ActorId);

impl ActorId {
    /// Actor recorded for system-initiated changes
    pub const SYSTEM: ActorId = ActorId(0);

    pub fn is_system(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_log_id_display() {
        let id = AuditLogId::new();
        let display = format!("{}", id);
        assert!(display.starts_with("aud-"));
        assert_eq!(display.len(), 12);
    }

    #[test]
    fn test_audit_log_id_parse() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id = AuditLogId::parse(uuid_str).unwrap();
        assert_eq!(id.as_uuid().to_string(), uuid_str);
        assert_eq!(uuid_str.parse::<AuditLogId>().unwrap(), id);
    }

    #[test]
    fn test_row_id_display_is_plain_number() {
        assert_eq!(RowId::new(42).to_string(), "42");
        assert_eq!("42".parse::<RowId>().unwrap(), RowId::new(42));
    }

    #[test]
    fn test_row_id_serializes_transparently() {
        let json = serde_json::to_string(&RowId::new(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn test_system_actor() {
        assert!(ActorId::SYSTEM.is_system());
        assert!(ActorId::default().is_system());
        assert!(!ActorId::new(7).is_system());
    }
}
