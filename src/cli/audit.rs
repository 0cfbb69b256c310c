//! Audit log CLI commands

use clap::Subcommand;

use super::context::CommandContext;
use crate::audit::AuditFilter;
use crate::display::audit::format_audit_list;
use crate::error::ChronicleResult;
use crate::models::ActorId;

/// Audit log subcommands
#[derive(Subcommand)]
pub enum AuditCommands {
    /// Show recent audit entries, newest first
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Only entries for this entity type (e.g. Order)
        #[arg(short = 't', long)]
        entity_type: Option<String>,
        /// Only entries that affect or relate to this entity id
        #[arg(short, long)]
        entity: Option<String>,
        /// Only entries attributed to this actor id
        #[arg(short, long = "by")]
        by: Option<u64>,
    },
    /// Show where the audit log lives and how many entries it has
    Info,
}

/// Handle an audit command
pub fn handle_audit_command(ctx: &CommandContext, cmd: AuditCommands) -> ChronicleResult<()> {
    let logger = ctx.audit.sink();

    match cmd {
        AuditCommands::List {
            limit,
            entity_type,
            entity,
            by,
        } => {
            let filter = AuditFilter {
                entity_type,
                entity_id: entity,
                actor_id: by.map(ActorId::new),
                limit: Some(limit),
            };
            let records = logger.query(&filter)?;
            print!("{}", format_audit_list(&records));
        }

        AuditCommands::Info => {
            println!("Audit log: {}", logger.path().display());
            if logger.exists() {
                println!("Entries:   {}", logger.entry_count()?);
            } else {
                println!("Entries:   0 (no log written yet)");
            }
        }
    }

    Ok(())
}
