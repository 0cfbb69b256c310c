//! Persistence engine
//!
//! A small unit-of-work engine over a JSON-backed record store. Callers
//! schedule inserts, updates and deletes; `Database::commit` computes change
//! sets, runs the commit hooks and writes everything or nothing.

mod change_set;
mod database;
pub mod file_io;
mod pending;
mod store;

pub use change_set::{ChangeSet, FieldChange, Persistable, Row};
pub use database::{CommitContext, CommitHook, CommitReport, Database, RowRef};
pub use pending::{PendingBatch, PendingChange, UnitOfWork};
pub use store::{RecordStore, StoredRow, VersionLookup};
