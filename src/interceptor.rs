//! Commit interceptor
//!
//! Runs inside `Database::commit` before anything is written. It stamps
//! housekeeping fields, assigns effective times, vetoes deletion of versioned
//! history and turns versioned updates into inserts of new versions.

use std::collections::HashMap;

use crate::clock::{to_datetime, Timestamp};
use crate::error::{ChronicleError, ChronicleResult};
use crate::persistence::{
    CommitContext, CommitHook, PendingBatch, PendingChange, Persistable, VersionLookup,
};
use crate::versioning::VersioningPolicy;

/// Housekeeping and versioning hook for `Database`
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitInterceptor {
    policy: VersioningPolicy,
}

impl CommitInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: VersioningPolicy) -> Self {
        Self { policy }
    }

    fn reject_versioned_deletes(batch: &PendingBatch<'_>) -> ChronicleResult<()> {
        let Some(change) = batch.deletes().find(|change| change.is_versioned()) else {
            return Ok(());
        };

        let entity = change.entity();
        let identifier = entity
            .as_versioned()
            .map(|versioned| versioned.logical_key())
            .unwrap_or_else(|| entity.describe());
        tracing::warn!(
            entity_type = entity.entity_type(),
            identifier = %identifier,
            "rejecting commit that deletes versioned history"
        );

        Err(ChronicleError::VersionedDeleteRejected {
            entity_type: entity.entity_type(),
            identifier,
        })
    }

    fn stamp_modified(entity: &mut dyn Persistable, ctx: &CommitContext) -> ChronicleResult<()> {
        let housekeeping = entity.housekeeping_mut();
        housekeeping.set_modified_by(ctx.actor)?;
        housekeeping.set_modified_on(ctx.now)
    }

    /// Move a system-assigned effective time past earlier versions of the chain
    fn settle_insert(
        &self,
        change: &mut PendingChange<'_>,
        previous: Option<Timestamp>,
        ctx: &CommitContext,
    ) -> ChronicleResult<()> {
        let Some(versioned) = change.entity_mut().as_versioned_mut() else {
            return Ok(());
        };
        if versioned.has_explicit_effective_time() || previous.is_none() {
            return Ok(());
        }

        let effective = self.policy.next_effective_time(ctx.now, previous);
        if versioned.effective_time() == Some(effective) {
            return Ok(());
        }
        versioned.assign_effective_time(effective);
        tracing::debug!(
            key = %versioned.logical_key(),
            effective,
            "versioned insert moved after existing version"
        );
        change.recompute_change_set()
    }
}

/// Logical record a versioned change belongs to
fn version_chain(entity: &dyn Persistable) -> Option<(&'static str, String)> {
    entity
        .as_versioned()
        .map(|versioned| (entity.entity_type(), versioned.logical_key()))
}

type Claimed = HashMap<(&'static str, String), Timestamp>;

fn claim(claimed: &mut Claimed, chain: (&'static str, String), at: Option<Timestamp>) {
    if let Some(at) = at {
        let slot = claimed.entry(chain).or_insert(at);
        *slot = (*slot).max(at);
    }
}

/// Effective time a pending versioned change will be written with
fn pending_effective_time(change: &PendingChange<'_>) -> Option<Timestamp> {
    change
        .entity()
        .as_versioned()
        .and_then(|versioned| versioned.effective_time())
}

impl CommitHook for CommitInterceptor {
    fn on_before_insert(
        &self,
        entity: &mut dyn Persistable,
        ctx: &CommitContext,
    ) -> ChronicleResult<()> {
        let housekeeping = entity.housekeeping_mut();
        housekeeping.set_created_by(ctx.actor)?;
        housekeeping.set_created_on(ctx.now)?;

        match entity.as_versioned_mut() {
            Some(versioned) => match versioned.effective_time() {
                Some(explicit) if versioned.has_explicit_effective_time() => {
                    to_datetime(explicit)?;
                }
                _ => versioned.assign_effective_time(ctx.now),
            },
            None => Self::stamp_modified(entity, ctx)?,
        }

        Ok(())
    }

    fn on_before_commit(
        &self,
        batch: &mut PendingBatch<'_>,
        ctx: &CommitContext,
        lookup: &dyn VersionLookup,
    ) -> ChronicleResult<()> {
        Self::reject_versioned_deletes(batch)?;

        // Latest effective time already claimed in this batch per logical record.
        // Changes are walked in batch order so a rerun reaches the same times.
        let mut claimed: Claimed = HashMap::new();

        let changes = batch.take();
        let mut rewritten = Vec::with_capacity(changes.len());
        for mut change in changes {
            if change.is_delete() {
                rewritten.push(change);
                continue;
            }

            match version_chain(change.entity()) {
                Some(chain) if change.is_insert() => {
                    let stored = lookup.latest_effective_time(chain.0, &chain.1);
                    let previous = stored.max(claimed.get(&chain).copied());
                    self.settle_insert(&mut change, previous, ctx)?;
                    claim(&mut claimed, chain, pending_effective_time(&change));
                    rewritten.push(change);
                }
                Some(chain) => {
                    let stored = lookup.latest_effective_time(chain.0, &chain.1);
                    let previous = stored.max(claimed.get(&chain).copied());
                    let redirected = self.policy.redirect(change, previous, ctx)?;
                    claim(&mut claimed, chain, pending_effective_time(&redirected));
                    rewritten.push(redirected);
                }
                None if change.is_update() => {
                    let needs_stamp = change
                        .change_set()
                        .is_some_and(|change_set| change_set.has_non_housekeeping_changes());
                    if needs_stamp {
                        Self::stamp_modified(change.entity_mut(), ctx)?;
                        change.recompute_change_set()?;
                    }
                    rewritten.push(change);
                }
                None => rewritten.push(change),
            }
        }

        batch.replace(rewritten);
        Ok(())
    }
}
