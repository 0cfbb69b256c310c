//! Commit pipeline
//!
//! `Database::commit` turns a unit of work into a pending batch, lets the
//! registered hooks inspect and rewrite it, and then writes it to the record
//! store in one step.

use std::fmt;
use std::sync::Arc;

use super::change_set::{ChangeSet, Persistable};
use super::pending::{PendingBatch, PendingChange, Scheduled, UnitOfWork};
use super::store::{RecordStore, VersionLookup};
use crate::clock::{Clock, SystemClock, Timestamp};
use crate::error::{ChronicleError, ChronicleResult};
use crate::models::{ActorId, RowId};

/// Time and actor fixed once at the start of a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitContext {
    pub now: Timestamp,
    pub actor: ActorId,
}

/// Callbacks the engine invokes before anything is written
///
/// Returning an error from either callback aborts the commit and leaves the
/// store untouched.
pub trait CommitHook {
    /// Called once for every scheduled insert, before its change set exists
    fn on_before_insert(
        &self,
        _entity: &mut dyn Persistable,
        _ctx: &CommitContext,
    ) -> ChronicleResult<()> {
        Ok(())
    }

    /// Called once with the whole batch; may reclassify or drop changes
    fn on_before_commit(
        &self,
        _batch: &mut PendingBatch<'_>,
        _ctx: &CommitContext,
        _lookup: &dyn VersionLookup,
    ) -> ChronicleResult<()> {
        Ok(())
    }
}

/// Reference to a written row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRef {
    pub entity_type: &'static str,
    pub id: RowId,
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.id)
    }
}

/// Rows written by one commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub inserted: Vec<RowRef>,
    pub updated: Vec<RowRef>,
    pub deleted: Vec<RowRef>,
}

impl CommitReport {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    pub fn total(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.deleted.len()
    }
}

/// Record store plus the hooks and clock used to commit into it
pub struct Database {
    store: RecordStore,
    hooks: Vec<Box<dyn CommitHook>>,
    clock: Arc<dyn Clock>,
}

impl Database {
    /// Create a database over `store` using the wall clock
    pub fn new(store: RecordStore) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: RecordStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            hooks: Vec::new(),
            clock,
        }
    }

    /// Register a hook; hooks run in registration order
    pub fn with_hook(mut self, hook: impl CommitHook + 'static) -> Self {
        self.add_hook(hook);
        self
    }

    pub fn add_hook(&mut self, hook: impl CommitHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RecordStore {
        &mut self.store
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Commit a unit of work on behalf of `actor`
    ///
    /// Updates whose entity matches its stored row are dropped. On success
    /// inserted entities carry their new row ids.
    pub fn commit(&mut self, uow: UnitOfWork<'_>, actor: ActorId) -> ChronicleResult<CommitReport> {
        let ctx = CommitContext {
            now: self.clock.now(),
            actor,
        };

        let mut batch = PendingBatch::new();
        for scheduled in uow.into_scheduled() {
            match scheduled {
                Scheduled::Insert(entity) => {
                    for hook in &self.hooks {
                        hook.on_before_insert(&mut *entity, &ctx)?;
                    }
                    batch.push(PendingChange::insert(entity)?);
                }
                Scheduled::Update(entity) => {
                    let entity_type = entity.entity_type();
                    let id = entity.persisted_id().ok_or_else(|| {
                        ChronicleError::Validation(format!(
                            "Cannot update {} before it has been committed",
                            entity.describe()
                        ))
                    })?;
                    let baseline = self
                        .store
                        .find_row(entity_type, id)
                        .ok_or_else(|| ChronicleError::row_not_found(entity_type, id.to_string()))?
                        .fields
                        .clone();

                    let change = PendingChange::update(entity, baseline)?;
                    if change.change_set().is_some_and(ChangeSet::is_empty) {
                        tracing::debug!(entity = %change.entity().describe(), "skipping unchanged update");
                        continue;
                    }
                    batch.push(change);
                }
                Scheduled::Delete(entity) => batch.push(PendingChange::Delete { entity }),
            }
        }

        for hook in &self.hooks {
            hook.on_before_commit(&mut batch, &ctx, &self.store)?;
        }

        if batch.is_empty() {
            return Ok(CommitReport::default());
        }

        let report = self.store.apply(batch)?;
        tracing::info!(
            actor = %actor,
            inserted = report.inserted.len(),
            updated = report.updated.len(),
            deleted = report.deleted.len(),
            "commit written"
        );
        Ok(report)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("store", &self.store)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::{Order, OrderStatus};
    use crate::tracking::Entity;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn database() -> Database {
        Database::with_clock(RecordStore::in_memory(), Arc::new(ManualClock::new(1_000)))
    }

    fn commit_new(db: &mut Database, order: &mut Order) {
        let mut uow = UnitOfWork::new();
        uow.insert(order);
        db.commit(uow, ActorId::new(1)).unwrap();
    }

    #[test]
    fn test_insert_update_delete() {
        let mut db = database();
        let mut order = Order::new("ACME");
        commit_new(&mut db, &mut order);
        let id = order.row_id().unwrap();

        order.set_status(OrderStatus::Shipped);
        let mut uow = UnitOfWork::new();
        uow.update(&mut order);
        let report = db.commit(uow, ActorId::new(1)).unwrap();
        assert_eq!(report.updated.len(), 1);
        assert_eq!(db.store().get::<Order>(id).unwrap().status(), OrderStatus::Shipped);

        let mut uow = UnitOfWork::new();
        uow.delete(&mut order);
        let report = db.commit(uow, ActorId::new(1)).unwrap();
        assert_eq!(report.deleted[0].to_string(), format!("Order#{}", id));
        assert_eq!(db.store().count(Order::ENTITY_TYPE), 0);
    }

    #[test]
    fn test_unchanged_update_is_dropped() {
        let mut db = database();
        let mut order = Order::new("ACME");
        commit_new(&mut db, &mut order);

        let mut uow = UnitOfWork::new();
        uow.update(&mut order);
        let report = db.commit(uow, ActorId::new(1)).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_update_requires_committed_row() {
        let mut db = database();
        let mut fresh = Order::new("ACME");
        let mut uow = UnitOfWork::new();
        uow.update(&mut fresh);
        assert!(db.commit(uow, ActorId::new(1)).unwrap_err().is_validation());

        let mut ghost = Order::new("Ghost");
        ghost.assign_row_id(Some(RowId::new(7)));
        let mut uow = UnitOfWork::new();
        uow.update(&mut ghost);
        assert!(db.commit(uow, ActorId::new(1)).unwrap_err().is_not_found());
    }

    struct Recorder {
        calls: Rc<RefCell<Vec<String>>>,
        fail_commit: bool,
    }

    impl CommitHook for Recorder {
        fn on_before_insert(
            &self,
            entity: &mut dyn Persistable,
            ctx: &CommitContext,
        ) -> ChronicleResult<()> {
            self.calls
                .borrow_mut()
                .push(format!("insert {} at {}", entity.entity_type(), ctx.now));
            Ok(())
        }

        fn on_before_commit(
            &self,
            batch: &mut PendingBatch<'_>,
            _ctx: &CommitContext,
            _lookup: &dyn VersionLookup,
        ) -> ChronicleResult<()> {
            self.calls
                .borrow_mut()
                .push(format!("commit {}", batch.len()));
            if self.fail_commit {
                return Err(ChronicleError::Validation("refused".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_hooks_run_before_write() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut db = database().with_hook(Recorder {
            calls: Rc::clone(&calls),
            fail_commit: false,
        });

        let mut order = Order::new("ACME");
        commit_new(&mut db, &mut order);

        assert_eq!(
            *calls.borrow(),
            vec!["insert Order at 1000".to_string(), "commit 1".to_string()]
        );
    }

    #[test]
    fn test_hook_error_aborts_commit() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut db = database().with_hook(Recorder {
            calls,
            fail_commit: true,
        });

        let mut order = Order::new("ACME");
        let mut uow = UnitOfWork::new();
        uow.insert(&mut order);
        assert!(db.commit(uow, ActorId::new(1)).is_err());
        assert_eq!(db.store().count(Order::ENTITY_TYPE), 0);
        assert_eq!(order.row_id(), None);
    }
}
