//! Update-to-insert redirect for versioned entities

use super::Versioned;
use crate::clock::{to_datetime, Timestamp};
use crate::error::{ChronicleError, ChronicleResult};
use crate::persistence::{CommitContext, PendingChange};

/// Decides effective times and rewrites versioned updates as inserts
#[derive(Debug, Clone, Copy, Default)]
pub struct VersioningPolicy;

impl VersioningPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Effective time for a new version when none was given
    ///
    /// Never earlier than `now`, and always strictly after the previous
    /// version so that the chain keeps a total order.
    pub fn next_effective_time(&self, now: Timestamp, previous: Option<Timestamp>) -> Timestamp {
        match previous {
            Some(previous) => now.max(previous.saturating_add(1)),
            None => now,
        }
    }

    /// Effective time a pending version will be written with
    ///
    /// An explicit effective time wins, but it must be a representable
    /// instant.
    pub fn resolve(
        &self,
        versioned: &dyn Versioned,
        now: Timestamp,
        previous: Option<Timestamp>,
    ) -> ChronicleResult<Timestamp> {
        match versioned.effective_time() {
            Some(explicit) if versioned.has_explicit_effective_time() => {
                to_datetime(explicit)?;
                Ok(explicit)
            }
            _ => Ok(self.next_effective_time(now, previous)),
        }
    }

    /// Turn an update of a versioned entity into the insert of a new version
    ///
    /// `previous` is the effective time of the latest version of the same
    /// logical record. Other changes are returned unchanged.
    pub fn redirect<'a>(
        &self,
        change: PendingChange<'a>,
        previous: Option<Timestamp>,
        ctx: &CommitContext,
    ) -> ChronicleResult<PendingChange<'a>> {
        let entity = match change {
            PendingChange::Update { entity, .. } if entity.as_versioned().is_some() => entity,
            other => return Ok(other),
        };

        let from = entity.describe();

        let housekeeping = entity.housekeeping_mut();
        housekeeping.set_created_by(ctx.actor)?;
        housekeeping.set_created_on(ctx.now)?;

        let versioned = entity.as_versioned_mut().ok_or_else(|| {
            ChronicleError::Storage(format!("{} lost its versioning capability", from))
        })?;
        let effective = self.resolve(&*versioned, ctx.now, previous)?;
        if !versioned.has_explicit_effective_time() {
            versioned.assign_effective_time(effective);
        }

        entity.assign_persisted_id(None);

        tracing::info!(
            from = %from,
            key = %entity.as_versioned().map(|v| v.logical_key()).unwrap_or_default(),
            effective,
            "versioned update redirected to new version"
        );

        PendingChange::insert(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActorId, RowId, TaxRate};
    use crate::persistence::Persistable;
    use crate::tracking::Entity;

    fn ctx(now: Timestamp) -> CommitContext {
        CommitContext {
            now,
            actor: ActorId::new(9),
        }
    }

    fn committed_rate(effective: Timestamp) -> TaxRate {
        let mut rate = TaxRate::new("VAT", 2000);
        rate.assign_row_id(Some(RowId::new(1)));
        rate.assign_effective_time(effective);
        rate
    }

    #[test]
    fn test_next_effective_time_is_after_previous() {
        let policy = VersioningPolicy::new();
        assert_eq!(policy.next_effective_time(100, None), 100);
        assert_eq!(policy.next_effective_time(100, Some(50)), 100);
        assert_eq!(policy.next_effective_time(100, Some(100)), 101);
        assert_eq!(policy.next_effective_time(100, Some(500)), 501);
    }

    #[test]
    fn test_redirect_creates_new_version() {
        let policy = VersioningPolicy::new();
        let mut rate = committed_rate(1_000);
        let baseline = rate.to_row().unwrap();
        rate.set_rate_bps(2100);

        let change = PendingChange::update(&mut rate, baseline).unwrap();
        let redirected = policy.redirect(change, Some(1_000), &ctx(900)).unwrap();

        assert!(redirected.is_insert());
        let change_set = redirected.change_set().unwrap();
        assert!(change_set.contains("code"));
        assert!(change_set.contains("rate_bps"));
        assert_eq!(redirected.entity().persisted_id(), None);

        drop(redirected);
        assert_eq!(rate.effective_time(), Some(1_001));
        assert_eq!(rate.created_by(), Some(ActorId::new(9)));
        assert_eq!(rate.created_on(), Some(900));
    }

    #[test]
    fn test_explicit_effective_time_bypasses_policy() {
        let policy = VersioningPolicy::new();
        let mut rate = committed_rate(1_000);
        let baseline = rate.to_row().unwrap();
        rate.set_effective_time(10);

        let change = PendingChange::update(&mut rate, baseline).unwrap();
        policy.redirect(change, Some(1_000), &ctx(5_000)).unwrap();

        assert_eq!(rate.effective_time(), Some(10));
    }

    #[test]
    fn test_unrepresentable_explicit_time_rejected() {
        let policy = VersioningPolicy::new();
        let mut rate = committed_rate(1_000);
        let baseline = rate.to_row().unwrap();
        rate.set_effective_time(i64::MAX);

        let change = PendingChange::update(&mut rate, baseline).unwrap();
        let err = policy.redirect(change, None, &ctx(5_000)).unwrap_err();
        assert!(matches!(err, ChronicleError::InvalidEffectiveTime(_)));
    }

    #[test]
    fn test_inserts_pass_through() {
        let policy = VersioningPolicy::new();
        let mut rate = TaxRate::new("VAT", 2000);
        let change = PendingChange::insert(&mut rate).unwrap();
        let same = policy.redirect(change, None, &ctx(1)).unwrap();
        assert!(same.is_insert());
    }
}
