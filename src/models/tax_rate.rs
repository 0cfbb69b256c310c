//! Tax rate model
//!
//! Tax rates are versioned: a rate is never edited in place. Each change is
//! committed as a new version with its own effective time, so the rate that
//! applied at any past moment can still be looked up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{ActorId, RowId};
use crate::clock::{parse_date, Timestamp};
use crate::error::{ChronicleError, ChronicleResult};
use crate::housekeeping::{CreationStamps, Housekeeping, MODIFIED_ON};
use crate::tracking::{
    parse_number, parse_optional_text, set_tracked, ChangeTracker, Entity, FieldDescriptor,
    FieldText, Tracked,
};
use crate::versioning::{EffectiveDating, Versioned};

/// Whether a rate version is in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateStatus {
    #[default]
    Active,
    Retired,
}

impl fmt::Display for RateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateStatus::Active => write!(f, "ACTIVE"),
            RateStatus::Retired => write!(f, "RETIRED"),
        }
    }
}

impl FromStr for RateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(RateStatus::Active),
            "RETIRED" => Ok(RateStatus::Retired),
            other => Err(format!("unknown rate status '{}'", other)),
        }
    }
}

impl FieldText for RateStatus {
    fn field_text(&self) -> String {
        self.to_string()
    }
}

/// One version of a tax rate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxRate {
    #[serde(skip)]
    id: Option<RowId>,

    /// Logical key shared by all versions
    code: String,

    /// Rate in basis points (2000 = 20%)
    rate_bps: u32,

    #[serde(default)]
    status: RateStatus,

    #[serde(default)]
    description: Option<String>,

    #[serde(flatten)]
    dating: EffectiveDating,

    #[serde(flatten)]
    stamps: CreationStamps,

    #[serde(skip)]
    tracker: ChangeTracker,
}

/// Accepts either unix seconds or a `YYYY-MM-DD` date
fn parse_effective_time(raw: &str) -> ChronicleResult<Timestamp> {
    let raw = raw.trim();
    if let Ok(seconds) = raw.parse::<Timestamp>() {
        return Ok(seconds);
    }
    parse_date(raw).map_err(|e| ChronicleError::invalid_value("effective_time", raw, e.to_string()))
}

static TAX_RATE_FIELDS: &[FieldDescriptor<TaxRate>] = &[
    FieldDescriptor {
        name: "id",
        get: |r: &TaxRate| r.id.field_text(),
        set: None,
    },
    FieldDescriptor {
        name: "code",
        get: |r: &TaxRate| r.code.clone(),
        set: None,
    },
    FieldDescriptor {
        name: "rate_bps",
        get: |r: &TaxRate| r.rate_bps.field_text(),
        set: Some(|r: &mut TaxRate, raw: &str| {
            r.set_rate_bps(parse_number("rate_bps", raw)?);
            Ok(())
        }),
    },
    FieldDescriptor {
        name: "status",
        get: |r: &TaxRate| r.status.field_text(),
        set: Some(|r: &mut TaxRate, raw: &str| {
            let status = raw
                .parse::<RateStatus>()
                .map_err(|e: String| ChronicleError::invalid_value("status", raw, e))?;
            r.set_status(status);
            Ok(())
        }),
    },
    FieldDescriptor {
        name: "description",
        get: |r: &TaxRate| r.description.field_text(),
        set: Some(|r: &mut TaxRate, raw: &str| {
            r.set_description(parse_optional_text(raw));
            Ok(())
        }),
    },
    FieldDescriptor {
        name: "effective_time",
        get: |r: &TaxRate| r.dating.effective_time().field_text(),
        set: Some(|r: &mut TaxRate, raw: &str| {
            r.set_effective_time(parse_effective_time(raw)?);
            Ok(())
        }),
    },
    FieldDescriptor {
        name: "created_by",
        get: |r: &TaxRate| r.stamps.created_by.field_text(),
        set: None,
    },
    FieldDescriptor {
        name: "created_on",
        get: |r: &TaxRate| r.stamps.created_on.field_text(),
        set: None,
    },
];

impl TaxRate {
    /// Create the first version of a rate
    pub fn new(code: impl Into<String>, rate_bps: u32) -> Self {
        Self {
            code: code.into(),
            rate_bps,
            ..Self::default()
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn rate_bps(&self) -> u32 {
        self.rate_bps
    }

    pub fn status(&self) -> RateStatus {
        self.status
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_by(&self) -> Option<ActorId> {
        self.stamps.created_by
    }

    pub fn created_on(&self) -> Option<Timestamp> {
        self.stamps.created_on
    }

    pub fn is_active(&self) -> bool {
        self.status == RateStatus::Active
    }

    pub fn set_rate_bps(&mut self, rate_bps: u32) {
        set_tracked(&mut self.tracker, "rate_bps", &mut self.rate_bps, rate_bps);
    }

    pub fn set_status(&mut self, status: RateStatus) {
        set_tracked(&mut self.tracker, "status", &mut self.status, status);
    }

    pub fn set_description(&mut self, description: Option<String>) {
        set_tracked(&mut self.tracker, "description", &mut self.description, description);
    }

    /// Take the rate out of force from the next version on
    pub fn retire(&mut self) {
        self.set_status(RateStatus::Retired);
    }

    /// Format the rate as a percentage
    pub fn format_percent(&self) -> String {
        format!("{}.{:02}%", self.rate_bps / 100, self.rate_bps % 100)
    }
}

impl Versioned for TaxRate {
    fn logical_key(&self) -> String {
        self.code.clone()
    }

    fn effective_time(&self) -> Option<Timestamp> {
        self.dating.effective_time()
    }

    fn set_effective_time(&mut self, at: Timestamp) {
        self.tracker
            .record_field_change("effective_time", self.dating.effective_time().field_text());
        self.dating.set_explicit(at);
    }

    fn assign_effective_time(&mut self, at: Timestamp) {
        self.dating.assign(at);
    }

    fn has_explicit_effective_time(&self) -> bool {
        self.dating.is_explicit()
    }
}

impl Tracked for TaxRate {
    fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    fn tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }
}

impl Housekeeping for TaxRate {
    fn set_created_by(&mut self, actor: ActorId) -> ChronicleResult<()> {
        self.stamps.set_created_by(actor);
        Ok(())
    }

    fn set_created_on(&mut self, at: Timestamp) -> ChronicleResult<()> {
        self.stamps.set_created_on(at);
        Ok(())
    }

    fn set_modified_on(&mut self, _at: Timestamp) -> ChronicleResult<()> {
        Err(ChronicleError::HousekeepingRejected {
            entity_type: Self::ENTITY_TYPE,
            field: MODIFIED_ON,
        })
    }
}

impl Entity for TaxRate {
    const ENTITY_TYPE: &'static str = "TaxRate";

    fn fields() -> &'static [FieldDescriptor<Self>] {
        TAX_RATE_FIELDS
    }

    fn row_id(&self) -> Option<RowId> {
        self.id
    }

    fn assign_row_id(&mut self, id: Option<RowId>) {
        self.id = id;
    }

    fn identifier(&self) -> Option<String> {
        Some(self.code.clone())
    }

    fn versioned(&self) -> Option<&dyn Versioned> {
        Some(self)
    }

    fn versioned_mut(&mut self) -> Option<&mut dyn Versioned> {
        Some(self)
    }
}
