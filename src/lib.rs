//! chronicle - change tracking, effective-dated versioning and audit logs
//!
//! Entities record which of their fields changed since a tracking session
//! began. Commits run through hooks that stamp housekeeping fields and turn
//! edits of versioned records into new versions, and the audit compiler
//! turns a finished session into an append-only audit record.
//!
//! # Architecture
//!
//! - `tracking`: per-entity change tracking and field registries
//! - `housekeeping`: created/modified stamps
//! - `versioning`: effective-dated versions and the versioning policy
//! - `persistence`: record store, units of work and the commit pipeline
//! - `interceptor`: the commit hook that enforces stamping and versioning
//! - `audit`: diff compilation, audit records and sinks
//! - `config`, `telemetry`: paths, settings and logging
//! - `models`: sample domain (orders, order lines, tax rates)
//! - `cli`, `display`: command handlers and terminal output
//!
//! # Example
//!
//! ```rust,ignore
//! use chronicle::interceptor::CommitInterceptor;
//! use chronicle::persistence::{Database, RecordStore, UnitOfWork};
//!
//! let mut db = Database::new(RecordStore::in_memory()).with_hook(CommitInterceptor::new());
//! let mut uow = UnitOfWork::new();
//! uow.insert(&mut order);
//! db.commit(uow, actor)?;
//! ```

pub mod audit;
pub mod cli;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod housekeeping;
pub mod interceptor;
pub mod models;
pub mod persistence;
pub mod telemetry;
pub mod tracking;
pub mod versioning;

pub use error::{ChronicleError, ChronicleResult};
