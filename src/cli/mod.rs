//! CLI command handlers
//!
//! This module contains the implementation of CLI commands, bridging the
//! clap argument parsing with the tracking, commit and audit layers.

pub mod audit;
pub mod context;
pub mod order;
pub mod rate;

pub use audit::{handle_audit_command, AuditCommands};
pub use context::{CommandContext, RequestOptions};
pub use order::{handle_order_command, OrderCommands};
pub use rate::{handle_rate_command, RateCommands};
