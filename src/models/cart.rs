use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of the cart being checked out. Owned by the cart; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    #[serde(default)]
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    /// Fractional tax rate applied to the line total, e.g. 0.18.
    pub tax_rate: Decimal,
    #[serde(default)]
    pub category_id: Option<Uuid>,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn tax_amount(&self) -> Decimal {
        self.line_total() * self.tax_rate
    }
}

/// Point-in-time view of the cart handed to coupon validation and pricing,
/// so their inputs cannot drift while a request is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    pub fn of(lines: &[CartLine]) -> Self {
        Self {
            lines: lines.to_vec(),
        }
    }

    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn tax_total(&self) -> Decimal {
        self.lines.iter().map(CartLine::tax_amount).sum()
    }

    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.lines.iter().map(|line| line.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn category_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .lines
            .iter()
            .filter_map(|line| line.category_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
