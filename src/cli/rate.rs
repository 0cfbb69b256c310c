//! Tax rate CLI commands
//!
//! Rates are versioned, so `set` on an existing code commits a new version
//! instead of editing the current one.

use std::collections::BTreeMap;

use clap::Subcommand;

use super::context::CommandContext;
use crate::audit::AuditAction;
use crate::clock::{format_timestamp, parse_date};
use crate::display::rate::{format_rate_details, format_rate_history, format_rate_list};
use crate::error::{ChronicleError, ChronicleResult};
use crate::models::TaxRate;
use crate::persistence::UnitOfWork;
use crate::tracking::{self, Entity};
use crate::versioning::Versioned;

const SECONDS_PER_DAY: i64 = 86_400;

/// Tax rate subcommands
#[derive(Subcommand)]
pub enum RateCommands {
    /// Create a rate or commit a new version of it
    Set {
        /// Rate code (e.g. VAT)
        code: String,
        /// Rate in basis points (2000 = 20%)
        #[arg(short, long)]
        bps: u32,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Effective date (YYYY-MM-DD); defaults to the commit time
        #[arg(short, long)]
        effective: Option<String>,
    },
    /// Retire a rate from its next version on
    Retire {
        /// Rate code
        code: String,
        /// Effective date (YYYY-MM-DD); defaults to the commit time
        #[arg(short, long)]
        effective: Option<String>,
    },
    /// Show the current version of a rate
    Show {
        /// Rate code
        code: String,
    },
    /// List the latest version of every rate
    List,
    /// Show every version of a rate
    History {
        /// Rate code
        code: String,
    },
    /// Show the version in force on a date
    At {
        /// Rate code
        code: String,
        /// Date (YYYY-MM-DD)
        date: String,
    },
}

/// Handle a tax rate command
pub fn handle_rate_command(ctx: &mut CommandContext, cmd: RateCommands) -> ChronicleResult<()> {
    let actor = ctx.actor();

    match cmd {
        RateCommands::Set {
            code,
            bps,
            description,
            effective,
        } => {
            let effective = effective.as_deref().map(parse_date).transpose()?;

            match ctx.db.store().latest::<TaxRate>(&code)? {
                Some(mut rate) => {
                    ctx.audit.start_edit(&mut rate);
                    rate.set_rate_bps(bps);
                    if description.is_some() {
                        rate.set_description(description);
                    }
                    if let Some(at) = effective {
                        rate.set_effective_time(at);
                    }

                    let mut uow = UnitOfWork::new();
                    uow.update(&mut rate);
                    let report = ctx.db.commit(uow, actor)?;

                    if report.is_empty() {
                        tracking::end_edit(&mut rate)?;
                        println!("Rate {} unchanged", rate.code());
                        return Ok(());
                    }

                    ctx.audit.end_edit(
                        &mut rate,
                        AuditAction::UPDATE,
                        None,
                        &ctx.source,
                        &ctx.request,
                    )?;
                    print_committed(&rate);
                }
                None => {
                    let mut rate = TaxRate::new(code.trim(), 0);
                    if rate.code().is_empty() {
                        return Err(ChronicleError::Validation(
                            "Rate code cannot be empty".into(),
                        ));
                    }
                    ctx.audit.start_new(&mut rate);
                    rate.set_rate_bps(bps);
                    rate.set_description(description);
                    if let Some(at) = effective {
                        rate.set_effective_time(at);
                    }

                    let mut uow = UnitOfWork::new();
                    uow.insert(&mut rate);
                    ctx.db.commit(uow, actor)?;

                    ctx.audit.end_new(
                        &mut rate,
                        AuditAction::CREATE,
                        None,
                        &ctx.source,
                        &ctx.request,
                    )?;
                    print_committed(&rate);
                }
            }
        }

        RateCommands::Retire { code, effective } => {
            let effective = effective.as_deref().map(parse_date).transpose()?;
            let mut rate = require_latest(ctx, &code)?;
            if !rate.is_active() {
                println!("Rate {} is already retired", code);
                return Ok(());
            }

            ctx.audit.start_edit(&mut rate);
            rate.retire();
            if let Some(at) = effective {
                rate.set_effective_time(at);
            }

            let mut uow = UnitOfWork::new();
            uow.update(&mut rate);
            ctx.db.commit(uow, actor)?;

            ctx.audit.end_edit(
                &mut rate,
                AuditAction::UPDATE,
                None,
                &ctx.source,
                &ctx.request,
            )?;
            print_committed(&rate);
        }

        RateCommands::Show { code } => {
            let now = ctx.db.now();
            let rate = ctx
                .db
                .store()
                .effective_at::<TaxRate>(&code, now)?
                .ok_or_else(|| ChronicleError::row_not_found(TaxRate::ENTITY_TYPE, code.clone()))?;
            print!("{}", format_rate_details(&rate));
        }

        RateCommands::List => {
            let mut latest: BTreeMap<String, TaxRate> = BTreeMap::new();
            for rate in ctx.db.store().all::<TaxRate>()? {
                let newer = latest
                    .get(rate.code())
                    .map_or(true, |seen| rate.effective_time() >= seen.effective_time());
                if newer {
                    latest.insert(rate.code().to_string(), rate);
                }
            }
            let rates: Vec<TaxRate> = latest.into_values().collect();
            print!("{}", format_rate_list(&rates));
        }

        RateCommands::History { code } => {
            let versions = ctx.db.store().versions::<TaxRate>(&code)?;
            if versions.is_empty() {
                return Err(ChronicleError::row_not_found(TaxRate::ENTITY_TYPE, code));
            }
            print!("{}", format_rate_history(&versions));
        }

        RateCommands::At { code, date } => {
            // Anything that took effect during that day counts
            let end_of_day = parse_date(&date)? + SECONDS_PER_DAY - 1;
            match ctx.db.store().effective_at::<TaxRate>(&code, end_of_day)? {
                Some(rate) => print!("{}", format_rate_details(&rate)),
                None => println!("No version of {} in force on {}", code, date),
            }
        }
    }

    Ok(())
}

fn require_latest(ctx: &CommandContext, code: &str) -> ChronicleResult<TaxRate> {
    ctx.db
        .store()
        .latest::<TaxRate>(code)?
        .ok_or_else(|| ChronicleError::row_not_found(TaxRate::ENTITY_TYPE, code))
}

fn print_committed(rate: &TaxRate) {
    println!(
        "Committed {} version {} at {} effective {}",
        rate.code(),
        rate.row_id().map(|id| id.to_string()).unwrap_or_default(),
        rate.format_percent(),
        rate.effective_time()
            .map(format_timestamp)
            .unwrap_or_default()
    );
}
