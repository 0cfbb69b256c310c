//! Audit logging for chronicle
//!
//! Every completed tracking session produces one append-only audit record
//! holding the changed fields with their old and new values.
//!
//! # Architecture
//!
//! - `AuditLogRecord`: one immutable record with actor, action, source and
//!   the `oldValue`/`newValue` diff of the fields written in the session.
//! - `AuditCompiler`: closes a session and builds the record.
//! - `AuditSink`: append-only destination. `AuditLogger` writes JSONL to a
//!   file, `MemoryAuditLog` keeps records in process.
//!
//! # Example
//!
//! ```rust,ignore
//! use chronicle::audit::{AuditAction, AuditCompiler, AuditContext, AuditLogger};
//!
//! let compiler = AuditCompiler::new(AuditLogger::new(paths.audit_log()));
//!
//! compiler.start_edit(&mut order);
//! order.set_status(OrderStatus::Shipped);
//! let record = compiler.end_edit(
//!     &mut order,
//!     AuditAction::UPDATE,
//!     Some(ActorId::new(7)),
//!     "OTP",
//!     &AuditContext::new(),
//! )?;
//! ```

mod compiler;
mod diff;
mod entry;
mod logger;

pub use compiler::AuditCompiler;
pub use diff::{compile_diff, summarize_diff};
pub use entry::{AuditAction, AuditContext, AuditData, AuditLogRecord, AuditState, FieldDiff};
pub use logger::{AuditFilter, AuditLogger, AuditSink, MemoryAuditLog};
