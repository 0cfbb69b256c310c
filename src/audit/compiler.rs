//! Audit log compiler
//!
//! Closes a tracking session and turns what it collected into one audit
//! record. Nothing is written and the session stays open if the record
//! cannot be built.

use chrono::Utc;

use super::diff::compile_diff;
use super::entry::{AuditAction, AuditContext, AuditLogRecord};
use super::logger::AuditSink;
use crate::error::{ChronicleError, ChronicleResult};
use crate::models::{ActorId, AuditLogId};
use crate::tracking::{self, snapshot, Entity, TrackingState};

/// Compiles tracking sessions into audit records written to a sink
#[derive(Debug)]
pub struct AuditCompiler<S: AuditSink> {
    sink: S,
    system_actor: ActorId,
}

impl<S: AuditSink> AuditCompiler<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            system_actor: ActorId::SYSTEM,
        }
    }

    /// Actor recorded when no other actor can be resolved
    pub fn with_system_actor(mut self, actor: ActorId) -> Self {
        self.system_actor = actor;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Open a creation session on `entity`
    pub fn start_new<E: Entity>(&self, entity: &mut E) {
        tracking::begin_new(entity);
    }

    /// Open an edit session on `entity`
    pub fn start_edit<E: Entity>(&self, entity: &mut E) {
        tracking::begin_edit(entity);
    }

    /// Close a creation session and write its audit record
    pub fn end_new<E: Entity>(
        &self,
        entity: &mut E,
        action: AuditAction,
        actor_id: Option<ActorId>,
        source: &str,
        ctx: &AuditContext,
    ) -> ChronicleResult<AuditLogRecord> {
        self.end(entity, TrackingState::Creating, action, actor_id, source, ctx)
    }

    /// Close an edit session and write its audit record
    pub fn end_edit<E: Entity>(
        &self,
        entity: &mut E,
        action: AuditAction,
        actor_id: Option<ActorId>,
        source: &str,
        ctx: &AuditContext,
    ) -> ChronicleResult<AuditLogRecord> {
        self.end(entity, TrackingState::Editing, action, actor_id, source, ctx)
    }

    fn end<E: Entity>(
        &self,
        entity: &mut E,
        session: TrackingState,
        action: AuditAction,
        actor_id: Option<ActorId>,
        source: &str,
        ctx: &AuditContext,
    ) -> ChronicleResult<AuditLogRecord> {
        entity.tracker().ensure_session(session, E::ENTITY_TYPE)?;

        let audit_data = compile_diff(entity.tracker().modified_properties(), &snapshot(&*entity));
        let actor_id = self.resolve_actor(&*entity, actor_id, ctx);
        let affected_entity_id = entity.identifier().ok_or(ChronicleError::MissingIdentifier {
            entity_type: E::ENTITY_TYPE,
        })?;

        let record = AuditLogRecord {
            id: AuditLogId::new(),
            entity_type: E::ENTITY_TYPE.to_string(),
            affected_entity_id,
            related_entity_ids: entity.related_identifiers(),
            tracking_state: session.into(),
            audit_data,
            actor_id,
            action,
            comment: ctx.comment.clone(),
            source: source.to_string(),
            ip: ctx.ip.clone(),
            user_agent: ctx.user_agent.clone(),
            added_on: Utc::now(),
        };

        self.sink.append(&record)?;

        match session {
            TrackingState::Creating => tracking::end_new(entity)?,
            _ => tracking::end_edit(entity)?,
        }

        tracing::info!(
            entity_type = E::ENTITY_TYPE,
            id = %record.affected_entity_id,
            action = %record.action,
            actor = %record.actor_id,
            changed = record.audit_data.len(),
            "audit record written"
        );

        Ok(record)
    }

    /// Explicit actor, then the request's actor, then the entity's own
    /// executing actor, then the system actor
    fn resolve_actor<E: Entity>(
        &self,
        entity: &E,
        explicit: Option<ActorId>,
        ctx: &AuditContext,
    ) -> ActorId {
        explicit
            .or(ctx.current_actor)
            .or_else(|| entity.executing_actor())
            .unwrap_or(self.system_actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditState, MemoryAuditLog};
    use crate::models::{Order, OrderLine, OrderStatus, RowId};
    use crate::tracking::Tracked;

    fn order_42() -> Order {
        let mut order = Order::new("ACME");
        order.assign_row_id(Some(RowId::new(42)));
        order
    }

    #[test]
    fn test_end_to_end_order_edit() {
        let compiler = AuditCompiler::new(MemoryAuditLog::new());
        let mut order = order_42();

        compiler.start_edit(&mut order);
        order.set_status(OrderStatus::Shipped);
        let record = compiler
            .end_edit(
                &mut order,
                AuditAction::UPDATE,
                Some(ActorId::new(7)),
                "OTP",
                &AuditContext::new(),
            )
            .unwrap();

        assert_eq!(record.entity_type, "Order");
        assert_eq!(record.affected_entity_id, "42");
        assert_eq!(record.tracking_state, AuditState::Modified);
        assert_eq!(record.actor_id, ActorId::new(7));
        assert_eq!(record.action, AuditAction::UPDATE);
        assert_eq!(record.source, "OTP");
        assert_eq!(
            serde_json::to_value(&record.audit_data).unwrap(),
            serde_json::json!({"status": {"oldValue": "PENDING", "newValue": "SHIPPED"}})
        );
        assert_eq!(order.tracking_state(), TrackingState::Unchanged);
        assert_eq!(compiler.sink().records(), vec![record]);
    }

    #[test]
    fn test_first_write_wins_across_session() {
        let compiler = AuditCompiler::new(MemoryAuditLog::new());
        let mut order = order_42();

        compiler.start_edit(&mut order);
        order.set_status(OrderStatus::Paid);
        order.set_status(OrderStatus::Shipped);
        let record = compiler
            .end_edit(&mut order, AuditAction::UPDATE, None, "web", &AuditContext::new())
            .unwrap();

        let diff = &record.audit_data["status"];
        assert_eq!(diff.old_value, "PENDING");
        assert_eq!(diff.new_value, "SHIPPED");
    }

    #[test]
    fn test_unchanged_fields_excluded() {
        let compiler = AuditCompiler::new(MemoryAuditLog::new());
        let mut order = order_42();

        compiler.start_edit(&mut order);
        order.set_notes(Some("leave at door".to_string()));
        let record = compiler
            .end_edit(&mut order, AuditAction::UPDATE, None, "web", &AuditContext::new())
            .unwrap();

        let fields: Vec<_> = record.audit_data.keys().cloned().collect();
        assert_eq!(fields, vec!["notes".to_string()]);
        assert_eq!(record.audit_data["notes"].old_value, "");
    }

    #[test]
    fn test_untracked_end_fails_without_record() {
        let compiler = AuditCompiler::new(MemoryAuditLog::new());
        let mut order = order_42();

        let err = compiler
            .end_edit(&mut order, AuditAction::UPDATE, None, "web", &AuditContext::new())
            .unwrap_err();

        assert!(matches!(err, ChronicleError::UntrackedEntity { .. }));
        assert!(compiler.sink().is_empty());
    }

    #[test]
    fn test_mismatched_end_keeps_session() {
        let compiler = AuditCompiler::new(MemoryAuditLog::new());
        let mut order = order_42();

        compiler.start_new(&mut order);
        let err = compiler
            .end_edit(&mut order, AuditAction::UPDATE, None, "web", &AuditContext::new())
            .unwrap_err();

        assert!(matches!(err, ChronicleError::SessionMismatch { .. }));
        assert_eq!(order.tracking_state(), TrackingState::Creating);
        assert!(compiler.sink().is_empty());
    }

    #[test]
    fn test_missing_identifier_writes_nothing() {
        let compiler = AuditCompiler::new(MemoryAuditLog::new());
        let mut order = Order::new("ACME");

        compiler.start_new(&mut order);
        order.set_total_cents(1_500);
        let err = compiler
            .end_new(&mut order, AuditAction::CREATE, None, "web", &AuditContext::new())
            .unwrap_err();

        assert!(matches!(err, ChronicleError::MissingIdentifier { entity_type: "Order" }));
        assert!(compiler.sink().is_empty());
        assert_eq!(order.tracking_state(), TrackingState::Creating);
    }

    #[test]
    fn test_actor_resolution_order() {
        let compiler = AuditCompiler::new(MemoryAuditLog::new()).with_system_actor(ActorId::new(99));
        let ctx = AuditContext::new().with_actor(ActorId::new(5));

        let mut order = order_42();
        compiler.start_edit(&mut order);
        let from_ctx = compiler
            .end_edit(&mut order, AuditAction::UPDATE, None, "web", &ctx)
            .unwrap();
        assert_eq!(from_ctx.actor_id, ActorId::new(5));

        order.set_handled_by(Some(ActorId::new(3)));
        compiler.start_edit(&mut order);
        let from_entity = compiler
            .end_edit(&mut order, AuditAction::UPDATE, None, "web", &AuditContext::new())
            .unwrap();
        assert_eq!(from_entity.actor_id, ActorId::new(3));

        let mut plain = order_42();
        compiler.start_edit(&mut plain);
        let fallback = compiler
            .end_edit(&mut plain, AuditAction::UPDATE, None, "web", &AuditContext::new())
            .unwrap();
        assert_eq!(fallback.actor_id, ActorId::new(99));
    }

    #[test]
    fn test_context_details_and_related_ids() {
        let compiler = AuditCompiler::new(MemoryAuditLog::new());
        let ctx = AuditContext::new()
            .with_ip("10.0.0.1")
            .with_user_agent("chronicle-cli/test")
            .with_comment("bulk import");

        let mut line = OrderLine::new(RowId::new(42), "SKU-1", 2, 500);
        line.assign_row_id(Some(RowId::new(3)));
        compiler.start_new(&mut line);
        line.set_quantity(3);
        let record = compiler
            .end_new(&mut line, AuditAction::CREATE, None, "import", &ctx)
            .unwrap();

        assert_eq!(record.tracking_state, AuditState::Created);
        assert_eq!(record.related_entity_ids, vec!["42".to_string()]);
        assert_eq!(record.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(record.user_agent.as_deref(), Some("chronicle-cli/test"));
        assert_eq!(record.comment.as_deref(), Some("bulk import"));
        assert_eq!(record.actor_id, ActorId::SYSTEM);
        assert_eq!(record.audit_data["quantity"].old_value, "2");
        assert_eq!(record.audit_data["quantity"].new_value, "3");
    }
}
