//! Order CLI commands
//!
//! Every mutating command runs inside a tracking session, commits through
//! the interceptor and then writes an audit record.

use clap::Subcommand;

use super::context::CommandContext;
use crate::audit::AuditAction;
use crate::display::order::{format_order_details, format_order_list};
use crate::error::{ChronicleError, ChronicleResult};
use crate::models::{Order, OrderLine, RowId};
use crate::persistence::UnitOfWork;
use crate::tracking::{apply_field, parse_assignment, Entity};

/// Order subcommands
#[derive(Subcommand)]
pub enum OrderCommands {
    /// Create a new order
    Create {
        /// Customer name
        #[arg(short, long)]
        customer: String,
        /// Order total in cents
        #[arg(short, long, default_value = "0")]
        total: i64,
        /// Free-text notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Change fields of an order
    Set {
        /// Order ID
        id: RowId,
        /// Assignments such as status=SHIPPED
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Add a line to an order
    AddLine {
        /// Order ID
        id: RowId,
        /// Product SKU
        #[arg(short, long)]
        sku: String,
        /// Quantity
        #[arg(short, long, default_value = "1")]
        quantity: u32,
        /// Unit price in cents
        #[arg(short, long)]
        price: i64,
    },
    /// Show order details
    Show {
        /// Order ID
        id: RowId,
    },
    /// List all orders
    List,
    /// Delete an order
    Delete {
        /// Order ID
        id: RowId,
    },
}

/// Handle an order command
pub fn handle_order_command(ctx: &mut CommandContext, cmd: OrderCommands) -> ChronicleResult<()> {
    let actor = ctx.actor();

    match cmd {
        OrderCommands::Create {
            customer,
            total,
            notes,
        } => {
            let mut order = Order::default();
            ctx.audit.start_new(&mut order);
            apply_field(&mut order, "customer", &customer)?;
            order.set_total_cents(total);
            if notes.is_some() {
                order.set_notes(notes);
            }

            let mut uow = UnitOfWork::new();
            uow.insert(&mut order);
            ctx.db.commit(uow, actor)?;

            ctx.audit.end_new(
                &mut order,
                AuditAction::CREATE,
                None,
                &ctx.source,
                &ctx.request,
            )?;

            println!(
                "Created order {} for '{}'",
                order.identifier().unwrap_or_default(),
                order.customer()
            );
        }

        OrderCommands::Set { id, assignments } => {
            let mut order: Order = ctx.db.store().get(id)?;
            ctx.audit.start_edit(&mut order);
            for assignment in &assignments {
                let (field, value) = parse_assignment(assignment)?;
                apply_field(&mut order, field, value)?;
            }

            let mut uow = UnitOfWork::new();
            uow.update(&mut order);
            let report = ctx.db.commit(uow, actor)?;

            let record = ctx.audit.end_edit(
                &mut order,
                AuditAction::UPDATE,
                None,
                &ctx.source,
                &ctx.request,
            )?;

            if report.is_empty() {
                println!("Order {} unchanged", id);
            } else {
                println!("Updated order {} ({} field(s) changed)", id, record.audit_data.len());
            }
        }

        OrderCommands::AddLine {
            id,
            sku,
            quantity,
            price,
        } => {
            let order: Order = ctx.db.store().get(id)?;
            if price < 0 {
                return Err(ChronicleError::Validation(
                    "Unit price cannot be negative".into(),
                ));
            }

            let mut line = OrderLine::new(id, "", 0, 0);
            ctx.audit.start_new(&mut line);
            apply_field(&mut line, "sku", &sku)?;
            line.set_quantity(quantity);
            line.set_unit_price_cents(price);

            let mut uow = UnitOfWork::new();
            uow.insert(&mut line);
            ctx.db.commit(uow, actor)?;

            ctx.audit.end_new(
                &mut line,
                AuditAction::CREATE,
                None,
                &ctx.source,
                &ctx.request,
            )?;

            println!(
                "Added {} x {} to order {} for '{}'",
                line.quantity(),
                line.sku(),
                id,
                order.customer()
            );
        }

        OrderCommands::Show { id } => {
            let order: Order = ctx.db.store().get(id)?;
            let lines: Vec<OrderLine> = ctx
                .db
                .store()
                .all::<OrderLine>()?
                .into_iter()
                .filter(|line| line.order_id() == id)
                .collect();
            print!("{}", format_order_details(&order, &lines));
        }

        OrderCommands::List => {
            let orders: Vec<Order> = ctx.db.store().all()?;
            print!("{}", format_order_list(&orders));
        }

        OrderCommands::Delete { id } => {
            let mut order: Order = ctx.db.store().get(id)?;

            let mut uow = UnitOfWork::new();
            uow.delete(&mut order);
            ctx.db.commit(uow, actor)?;

            ctx.audit.start_edit(&mut order);
            ctx.audit.end_edit(
                &mut order,
                AuditAction::DELETE,
                None,
                &ctx.source,
                &ctx.request,
            )?;

            println!("Deleted order {}", id);
        }
    }

    Ok(())
}
