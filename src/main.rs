use anyhow::Result;
use clap::{Parser, Subcommand};

use chronicle::cli::{
    handle_audit_command, handle_order_command, handle_rate_command, AuditCommands,
    CommandContext, OrderCommands, RateCommands, RequestOptions,
};
use chronicle::config::{ChroniclePaths, Settings};
use chronicle::persistence::RecordStore;
use chronicle::telemetry;

#[derive(Parser)]
#[command(
    name = "chronicle",
    author = "Kaylee Beyene",
    version,
    about = "Change tracking, effective-dated versioning and audit logs",
    long_about = "chronicle records who changed what and when. Orders are edited \
                  in place, tax rates are versioned by effective time, and every \
                  change lands in an append-only audit log."
)]
struct Cli {
    /// Actor id the changes are attributed to
    #[arg(long, global = true, env = "CHRONICLE_ACTOR")]
    actor: Option<u64>,

    /// Source tag written to audit records
    #[arg(long, global = true)]
    source: Option<String>,

    /// Comment written to audit records
    #[arg(long, global = true)]
    comment: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Order management commands
    #[command(subcommand)]
    Order(OrderCommands),

    /// Tax rate commands
    #[command(subcommand)]
    Rate(RateCommands),

    /// Audit log commands
    #[command(subcommand)]
    Audit(AuditCommands),

    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = ChroniclePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    telemetry::init_tracing(&settings.logging);

    let options = RequestOptions {
        actor: cli.actor,
        source: cli.source,
        comment: cli.comment,
    };

    match cli.command {
        Some(Commands::Order(cmd)) => {
            let mut ctx = CommandContext::open(paths, settings, options)?;
            handle_order_command(&mut ctx, cmd)?;
        }
        Some(Commands::Rate(cmd)) => {
            let mut ctx = CommandContext::open(paths, settings, options)?;
            handle_rate_command(&mut ctx, cmd)?;
        }
        Some(Commands::Audit(cmd)) => {
            let ctx = CommandContext::open(paths, settings, options)?;
            handle_audit_command(&ctx, cmd)?;
        }
        Some(Commands::Init) => {
            paths.ensure_directories()?;
            settings.save(&paths)?;
            RecordStore::with_file(paths.records_file()).save()?;
            println!("Initialized chronicle at {}", paths.base_dir().display());
        }
        Some(Commands::Config) => {
            println!("chronicle configuration");
            println!("=======================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!("Records file:   {}", paths.records_file().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!("Initialized:    {}", paths.is_initialized());
            println!();
            println!("Default source: {}", settings.default_source);
            println!("System actor:   {}", settings.system_actor);
            println!("Log level:      {}", settings.logging.level);
        }
        None => {
            println!("chronicle - change tracking and audit logs");
            println!();
            println!("Run 'chronicle --help' for usage information.");
        }
    }

    Ok(())
}
