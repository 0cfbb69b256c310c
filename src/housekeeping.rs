//! Housekeeping fields stamped at commit time
//!
//! Entities opt into each housekeeping field by overriding the matching
//! setter. The defaults do nothing, so the commit interceptor can stamp every
//! pending entity without knowing which fields its type carries.

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::error::ChronicleResult;
use crate::models::ActorId;

pub const CREATED_BY: &str = "created_by";
pub const CREATED_ON: &str = "created_on";
pub const MODIFIED_BY: &str = "modified_by";
pub const MODIFIED_ON: &str = "modified_on";

/// Row fields owned by housekeeping rather than by the caller
pub const HOUSEKEEPING_FIELDS: [&str; 4] = [CREATED_BY, CREATED_ON, MODIFIED_BY, MODIFIED_ON];

pub fn is_housekeeping_field(name: &str) -> bool {
    HOUSEKEEPING_FIELDS.contains(&name)
}

/// Optional housekeeping setters
pub trait Housekeeping {
    fn set_created_by(&mut self, _actor: ActorId) -> ChronicleResult<()> {
        Ok(())
    }

    fn set_created_on(&mut self, _at: Timestamp) -> ChronicleResult<()> {
        Ok(())
    }

    fn set_modified_by(&mut self, _actor: ActorId) -> ChronicleResult<()> {
        Ok(())
    }

    fn set_modified_on(&mut self, _at: Timestamp) -> ChronicleResult<()> {
        Ok(())
    }
}

/// Created and modified stamps for mutable records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamps {
    #[serde(default)]
    pub created_by: Option<ActorId>,
    #[serde(default)]
    pub created_on: Option<Timestamp>,
    #[serde(default)]
    pub modified_by: Option<ActorId>,
    #[serde(default)]
    pub modified_on: Option<Timestamp>,
}

impl Housekeeping for Stamps {
    fn set_created_by(&mut self, actor: ActorId) -> ChronicleResult<()> {
        self.created_by = Some(actor);
        Ok(())
    }

    fn set_created_on(&mut self, at: Timestamp) -> ChronicleResult<()> {
        self.created_on = Some(at);
        Ok(())
    }

    fn set_modified_by(&mut self, actor: ActorId) -> ChronicleResult<()> {
        self.modified_by = Some(actor);
        Ok(())
    }

    fn set_modified_on(&mut self, at: Timestamp) -> ChronicleResult<()> {
        self.modified_on = Some(at);
        Ok(())
    }
}

/// Creation stamps only, for rows that are never modified after commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationStamps {
    #[serde(default)]
    pub created_by: Option<ActorId>,
    #[serde(default)]
    pub created_on: Option<Timestamp>,
}

impl CreationStamps {
    pub fn set_created_by(&mut self, actor: ActorId) {
        self.created_by = Some(actor);
    }

    pub fn set_created_on(&mut self, at: Timestamp) {
        self.created_on = Some(at);
    }
}
