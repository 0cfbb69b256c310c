//! Order model
//!
//! A mutable record: edits overwrite the stored row and are stamped with
//! modified-by/on at commit time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{ActorId, RowId};
use crate::clock::Timestamp;
use crate::error::{ChronicleError, ChronicleResult};
use crate::housekeeping::{Housekeeping, Stamps};
use crate::tracking::{
    parse_number, parse_optional_text, set_tracked, ChangeTracker, Entity, FieldDescriptor,
    FieldText, Tracked,
};

/// Fulfilment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Paid => write!(f, "PAID"),
            OrderStatus::Shipped => write!(f, "SHIPPED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "PAID" => Ok(OrderStatus::Paid),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "CANCELLED" | "CANCELED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status '{}'", other)),
        }
    }
}

impl FieldText for OrderStatus {
    fn field_text(&self) -> String {
        self.to_string()
    }
}

/// A customer order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    #[serde(skip)]
    id: Option<RowId>,

    customer: String,

    #[serde(default)]
    status: OrderStatus,

    /// Order total in cents
    #[serde(default)]
    total_cents: i64,

    #[serde(default)]
    notes: Option<String>,

    /// Staff member currently handling the order
    #[serde(default)]
    handled_by: Option<ActorId>,

    #[serde(flatten)]
    stamps: Stamps,

    #[serde(skip)]
    tracker: ChangeTracker,
}

static ORDER_FIELDS: &[FieldDescriptor<Order>] = &[
    FieldDescriptor {
        name: "id",
        get: |o: &Order| o.id.field_text(),
        set: None,
    },
    FieldDescriptor {
        name: "customer",
        get: |o: &Order| o.customer.clone(),
        set: Some(|o: &mut Order, raw: &str| {
            let customer = raw.trim();
            if customer.is_empty() {
                return Err(ChronicleError::invalid_value("customer", raw, "must not be empty"));
            }
            o.set_customer(customer);
            Ok(())
        }),
    },
    FieldDescriptor {
        name: "status",
        get: |o: &Order| o.status.field_text(),
        set: Some(|o: &mut Order, raw: &str| {
            let status = raw
                .parse::<OrderStatus>()
                .map_err(|e: String| ChronicleError::invalid_value("status", raw, e))?;
            o.set_status(status);
            Ok(())
        }),
    },
    FieldDescriptor {
        name: "total_cents",
        get: |o: &Order| o.total_cents.field_text(),
        set: Some(|o: &mut Order, raw: &str| {
            o.set_total_cents(parse_number("total_cents", raw)?);
            Ok(())
        }),
    },
    FieldDescriptor {
        name: "notes",
        get: |o: &Order| o.notes.field_text(),
        set: Some(|o: &mut Order, raw: &str| {
            o.set_notes(parse_optional_text(raw));
            Ok(())
        }),
    },
    FieldDescriptor {
        name: "handled_by",
        get: |o: &Order| o.handled_by.field_text(),
        set: Some(|o: &mut Order, raw: &str| {
            let actor = match parse_optional_text(raw) {
                Some(text) => Some(parse_number::<ActorId>("handled_by", &text)?),
                None => None,
            };
            o.set_handled_by(actor);
            Ok(())
        }),
    },
    FieldDescriptor {
        name: "created_by",
        get: |o: &Order| o.stamps.created_by.field_text(),
        set: None,
    },
    FieldDescriptor {
        name: "created_on",
        get: |o: &Order| o.stamps.created_on.field_text(),
        set: None,
    },
    FieldDescriptor {
        name: "modified_by",
        get: |o: &Order| o.stamps.modified_by.field_text(),
        set: None,
    },
    FieldDescriptor {
        name: "modified_on",
        get: |o: &Order| o.stamps.modified_on.field_text(),
        set: None,
    },
];

impl Order {
    /// Create a new pending order
    pub fn new(customer: impl Into<String>) -> Self {
        Self {
            customer: customer.into(),
            ..Self::default()
        }
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total_cents(&self) -> i64 {
        self.total_cents
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn handled_by(&self) -> Option<ActorId> {
        self.handled_by
    }

    pub fn created_by(&self) -> Option<ActorId> {
        self.stamps.created_by
    }

    pub fn created_on(&self) -> Option<Timestamp> {
        self.stamps.created_on
    }

    pub fn modified_by(&self) -> Option<ActorId> {
        self.stamps.modified_by
    }

    pub fn modified_on(&self) -> Option<Timestamp> {
        self.stamps.modified_on
    }

    pub fn set_customer(&mut self, customer: impl Into<String>) {
        set_tracked(&mut self.tracker, "customer", &mut self.customer, customer.into());
    }

    pub fn set_status(&mut self, status: OrderStatus) {
        set_tracked(&mut self.tracker, "status", &mut self.status, status);
    }

    pub fn set_total_cents(&mut self, total_cents: i64) {
        set_tracked(&mut self.tracker, "total_cents", &mut self.total_cents, total_cents);
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        set_tracked(&mut self.tracker, "notes", &mut self.notes, notes);
    }

    pub fn set_handled_by(&mut self, actor: Option<ActorId>) {
        set_tracked(&mut self.tracker, "handled_by", &mut self.handled_by, actor);
    }

    /// Format the total as a currency amount
    pub fn format_total(&self) -> String {
        let sign = if self.total_cents < 0 { "-" } else { "" };
        let cents = self.total_cents.unsigned_abs();
        format!("{}{}.{:02}", sign, cents / 100, cents % 100)
    }
}

impl Tracked for Order {
    fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    fn tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }
}

impl Housekeeping for Order {
    fn set_created_by(&mut self, actor: ActorId) -> ChronicleResult<()> {
        self.stamps.set_created_by(actor)
    }

    fn set_created_on(&mut self, at: Timestamp) -> ChronicleResult<()> {
        self.stamps.set_created_on(at)
    }

    fn set_modified_by(&mut self, actor: ActorId) -> ChronicleResult<()> {
        self.stamps.set_modified_by(actor)
    }

    fn set_modified_on(&mut self, at: Timestamp) -> ChronicleResult<()> {
        self.stamps.set_modified_on(at)
    }
}

impl Entity for Order {
    const ENTITY_TYPE: &'static str = "Order";

    fn fields() -> &'static [FieldDescriptor<Self>] {
        ORDER_FIELDS
    }

    fn row_id(&self) -> Option<RowId> {
        self.id
    }

    fn assign_row_id(&mut self, id: Option<RowId>) {
        self.id = id;
    }

    fn executing_actor(&self) -> Option<ActorId> {
        self.handled_by
    }
}
