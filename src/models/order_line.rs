//! Order line model

use serde::{Deserialize, Serialize};

use super::ids::{ActorId, RowId};
use crate::clock::Timestamp;
use crate::error::{ChronicleError, ChronicleResult};
use crate::housekeeping::{Housekeeping, Stamps};
use crate::tracking::{
    parse_number, set_tracked, ChangeTracker, Entity, FieldDescriptor, FieldText, Tracked,
};

/// One product line of an order
///
/// Audit records for a line are also attributed to its order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(skip)]
    id: Option<RowId>,

    order_id: RowId,

    sku: String,

    quantity: u32,

    /// Unit price in cents
    unit_price_cents: i64,

    #[serde(flatten)]
    stamps: Stamps,

    #[serde(skip)]
    tracker: ChangeTracker,
}

static ORDER_LINE_FIELDS: &[FieldDescriptor<OrderLine>] = &[
    FieldDescriptor {
        name: "id",
        get: |l: &OrderLine| l.id.field_text(),
        set: None,
    },
    FieldDescriptor {
        name: "order_id",
        get: |l: &OrderLine| l.order_id.field_text(),
        set: None,
    },
    FieldDescriptor {
        name: "sku",
        get: |l: &OrderLine| l.sku.clone(),
        set: Some(|l: &mut OrderLine, raw: &str| {
            let sku = raw.trim();
            if sku.is_empty() {
                return Err(ChronicleError::invalid_value("sku", raw, "must not be empty"));
            }
            l.set_sku(sku);
            Ok(())
        }),
    },
    FieldDescriptor {
        name: "quantity",
        get: |l: &OrderLine| l.quantity.field_text(),
        set: Some(|l: &mut OrderLine, raw: &str| {
            l.set_quantity(parse_number("quantity", raw)?);
            Ok(())
        }),
    },
    FieldDescriptor {
        name: "unit_price_cents",
        get: |l: &OrderLine| l.unit_price_cents.field_text(),
        set: Some(|l: &mut OrderLine, raw: &str| {
            l.set_unit_price_cents(parse_number("unit_price_cents", raw)?);
            Ok(())
        }),
    },
    FieldDescriptor {
        name: "created_by",
        get: |l: &OrderLine| l.stamps.created_by.field_text(),
        set: None,
    },
    FieldDescriptor {
        name: "created_on",
        get: |l: &OrderLine| l.stamps.created_on.field_text(),
        set: None,
    },
    FieldDescriptor {
        name: "modified_by",
        get: |l: &OrderLine| l.stamps.modified_by.field_text(),
        set: None,
    },
    FieldDescriptor {
        name: "modified_on",
        get: |l: &OrderLine| l.stamps.modified_on.field_text(),
        set: None,
    },
];

impl OrderLine {
    pub fn new(order_id: RowId, sku: impl Into<String>, quantity: u32, unit_price_cents: i64) -> Self {
        Self {
            order_id,
            sku: sku.into(),
            quantity,
            unit_price_cents,
            ..Self::default()
        }
    }

    pub fn order_id(&self) -> RowId {
        self.order_id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price_cents(&self) -> i64 {
        self.unit_price_cents
    }

    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }

    pub fn set_sku(&mut self, sku: impl Into<String>) {
        set_tracked(&mut self.tracker, "sku", &mut self.sku, sku.into());
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        set_tracked(&mut self.tracker, "quantity", &mut self.quantity, quantity);
    }

    pub fn set_unit_price_cents(&mut self, unit_price_cents: i64) {
        set_tracked(
            &mut self.tracker,
            "unit_price_cents",
            &mut self.unit_price_cents,
            unit_price_cents,
        );
    }
}

impl Tracked for OrderLine {
    fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    fn tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }
}

impl Housekeeping for OrderLine {
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

impl Entity for OrderLine {
    const ENTITY_TYPE: &'static str = "OrderLine";

    fn fields() -> &'static [FieldDescriptor<Self>] {
        ORDER_LINE_FIELDS
    }

    fn row_id(&self) -> Option<RowId> {
        self.id
    }

    fn assign_row_id(&mut self, id: Option<RowId>) {
        self.id = id;
    }

    fn related_identifiers(&self) -> Vec<String> {
        vec![self.order_id.to_string()]
    }
}
