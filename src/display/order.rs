//! Order display formatting

use super::format_optional_time;
use crate::models::{Order, OrderLine};
use crate::tracking::Entity;

/// Format a list of orders as a table
pub fn format_order_list(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders found.\n".to_string();
    }

    let customer_width = orders
        .iter()
        .map(|o| o.customer().len())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:>6}  {:<customer_width$}  {:<10}  {:>12}  {}\n",
        "ID",
        "Customer",
        "Status",
        "Total",
        "Modified",
        customer_width = customer_width,
    ));
    output.push_str(&format!(
        "{:->6}  {:-<customer_width$}  {:-<10}  {:->12}  {:-<23}\n",
        "",
        "",
        "",
        "",
        "",
        customer_width = customer_width,
    ));

    for order in orders {
        output.push_str(&format!(
            "{:>6}  {:<customer_width$}  {:<10}  {:>12}  {}\n",
            order.row_id().map(|id| id.to_string()).unwrap_or_default(),
            order.customer(),
            order.status().to_string(),
            order.format_total(),
            format_optional_time(order.modified_on()),
            customer_width = customer_width,
        ));
    }

    output
}

/// Format a single order with its lines
pub fn format_order_details(order: &Order, lines: &[OrderLine]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Order {}\n",
        order.row_id().map(|id| id.to_string()).unwrap_or_default()
    ));
    output.push_str(&format!("  Customer:     {}\n", order.customer()));
    output.push_str(&format!("  Status:       {}\n", order.status()));
    output.push_str(&format!("  Total:        {}\n", order.format_total()));
    if let Some(notes) = order.notes() {
        output.push_str(&format!("  Notes:        {}\n", notes));
    }
    if let Some(actor) = order.handled_by() {
        output.push_str(&format!("  Handled By:   {}\n", actor));
    }
    output.push('\n');
    output.push_str(&format!(
        "  Created:      {} by {}\n",
        format_optional_time(order.created_on()),
        order
            .created_by()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    output.push_str(&format!(
        "  Modified:     {} by {}\n",
        format_optional_time(order.modified_on()),
        order
            .modified_by()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));

    if !lines.is_empty() {
        output.push('\n');
        output.push_str(&format!(
            "  {:<16}  {:>8}  {:>12}  {:>12}\n",
            "SKU", "Qty", "Unit", "Line Total"
        ));
        for line in lines {
            output.push_str(&format!(
                "  {:<16}  {:>8}  {:>12}  {:>12}\n",
                line.sku(),
                line.quantity(),
                format_cents(line.unit_price_cents()),
                format_cents(line.line_total_cents()),
            ));
        }
    }

    output
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
