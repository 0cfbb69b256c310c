//! Display formatting for terminal output
//!
//! Plain-text tables and detail views for the CLI.

pub mod audit;
pub mod order;
pub mod rate;

pub use audit::format_audit_list;
pub use order::{format_order_details, format_order_list};
pub use rate::{format_rate_details, format_rate_history, format_rate_list};

use crate::clock::{format_timestamp, Timestamp};

/// Render an optional timestamp, blank when absent
pub(crate) fn format_optional_time(at: Option<Timestamp>) -> String {
    at.map(format_timestamp).unwrap_or_else(|| "-".to_string())
}
