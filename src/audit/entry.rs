//! Audit record data structures
//!
//! Defines the audit record written for every completed tracking session,
//! the caller-supplied action code and request context.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::diff::summarize_diff;
use crate::models::{ActorId, AuditLogId};
use crate::tracking::TrackingState;

/// Caller-defined action code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditAction(pub u16);

impl AuditAction {
    pub const CREATE: AuditAction = AuditAction(1);
    pub const UPDATE: AuditAction = AuditAction(2);
    pub const DELETE: AuditAction = AuditAction(3);

    pub fn code(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            AuditAction::CREATE => write!(f, "CREATE"),
            AuditAction::UPDATE => write!(f, "UPDATE"),
            AuditAction::DELETE => write!(f, "DELETE"),
            AuditAction(code) => write!(f, "ACTION({})", code),
        }
    }
}

/// Kind of session the record was compiled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditState {
    Created,
    Modified,
    Unchanged,
}

impl From<TrackingState> for AuditState {
    fn from(state: TrackingState) -> Self {
        match state {
            TrackingState::Creating => AuditState::Created,
            TrackingState::Editing => AuditState::Modified,
            TrackingState::Unchanged => AuditState::Unchanged,
        }
    }
}

impl fmt::Display for AuditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditState::Created => write!(f, "CREATED"),
            AuditState::Modified => write!(f, "MODIFIED"),
            AuditState::Unchanged => write!(f, "UNCHANGED"),
        }
    }
}

/// Before and after value of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDiff {
    pub old_value: String,
    pub new_value: String,
}

/// Field name to change, ordered by field name
pub type AuditData = BTreeMap<String, FieldDiff>;

/// Request context the compiler reads actor and client details from
///
/// Every part is optional; a missing client address or user agent is simply
/// left out of the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditContext {
    pub current_actor: Option<ActorId>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub comment: Option<String>,
}

impl AuditContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actor(mut self, actor: ActorId) -> Self {
        self.current_actor = Some(actor);
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// One immutable audit log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogRecord {
    pub id: AuditLogId,

    /// Type name of the audited entity
    pub entity_type: String,

    pub affected_entity_id: String,

    /// Parent or owner records the change is also attributed to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_entity_ids: Vec<String>,

    pub tracking_state: AuditState,

    /// Changed fields only
    pub audit_data: AuditData,

    pub actor_id: ActorId,

    pub action: AuditAction,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Channel the change came through
    pub source: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    pub added_on: DateTime<Utc>,
}

impl AuditLogRecord {
    /// True if the record names `id` as affected or related entity
    pub fn concerns(&self, id: &str) -> bool {
        self.affected_entity_id == id || self.related_entity_ids.iter().any(|r| r == id)
    }

    /// Format the record for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}#{} by {} via {}",
            self.added_on.format("%Y-%m-%d %H:%M:%S UTC"),
            self.action,
            self.tracking_state,
            self.entity_type,
            self.affected_entity_id,
            self.actor_id,
            self.source
        );

        if let Some(comment) = &self.comment {
            output.push_str(&format!(" ({})", comment));
        }

        if let Some(diff) = summarize_diff(&self.audit_data) {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> AuditLogRecord {
        let mut audit_data = AuditData::new();
        audit_data.insert(
            "status".to_string(),
            FieldDiff {
                old_value: "PENDING".to_string(),
                new_value: "SHIPPED".to_string(),
            },
        );

        AuditLogRecord {
            id: AuditLogId::new(),
            entity_type: "Order".to_string(),
            affected_entity_id: "42".to_string(),
            related_entity_ids: vec!["7".to_string()],
            tracking_state: AuditState::Modified,
            audit_data,
            actor_id: ActorId::new(7),
            action: AuditAction::UPDATE,
            comment: Some("shipped early".to_string()),
            source: "OTP".to_string(),
            ip: None,
            user_agent: None,
            added_on: Utc::now(),
        }
    }

    #[test]
    fn test_action_display() {
        assert_eq!(AuditAction::CREATE.to_string(), "CREATE");
        assert_eq!(AuditAction::DELETE.to_string(), "DELETE");
        assert_eq!(AuditAction(40).to_string(), "ACTION(40)");
    }

    #[test]
    fn test_state_from_tracking_state() {
        assert_eq!(AuditState::from(TrackingState::Creating), AuditState::Created);
        assert_eq!(AuditState::from(TrackingState::Editing), AuditState::Modified);
        assert_eq!(AuditState::Modified.to_string(), "MODIFIED");
    }

    #[test]
    fn test_serialized_shape() {
        let record = sample_record();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["tracking_state"], "MODIFIED");
        assert_eq!(value["action"], 2);
        assert_eq!(value["actor_id"], 7);
        assert_eq!(value["audit_data"]["status"]["oldValue"], "PENDING");
        assert_eq!(value["audit_data"]["status"]["newValue"], "SHIPPED");
        assert!(value.get("ip").is_none());

        let back: AuditLogRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_concerns_related_ids() {
        let record = sample_record();
        assert!(record.concerns("42"));
        assert!(record.concerns("7"));
        assert!(!record.concerns("8"));
    }

    #[test]
    fn test_human_readable_format() {
        let formatted = sample_record().format_human_readable();
        assert!(formatted.contains("UPDATE MODIFIED Order#42 by 7 via OTP"));
        assert!(formatted.contains("(shipped early)"));
        assert!(formatted.contains("status: \"PENDING\" -> \"SHIPPED\""));
    }
}
