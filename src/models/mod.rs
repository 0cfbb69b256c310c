//! Core data models for chronicle
//!
//! Typed identifiers plus the bundled sample domain: orders and their lines
//! (mutable records) and tax rates (versioned records).

pub mod ids;
mod order;
mod order_line;
mod tax_rate;

pub use ids::{ActorId, AuditLogId, RowId};
pub use order::{Order, OrderStatus};
pub use order_line::OrderLine;
pub use tax_rate::{RateStatus, TaxRate};
