use serde::{Deserialize, Serialize};

use super::address::ShippingAddress;

/// Ordered checkout phases. Backward transitions are always permitted;
/// skipping ahead is not.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    #[strum(serialize = "shipping")]
    Shipping,
    #[strum(serialize = "payment")]
    Payment,
    #[strum(serialize = "review")]
    Review,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Online payment through the gateway widget. The default.
    #[strum(serialize = "gateway")]
    Gateway,
    #[strum(serialize = "cash_on_delivery")]
    CashOnDelivery,
}

/// Everything the shopper has entered so far. Created when the cart becomes
/// non-empty, persisted incrementally to the backend cart record at each
/// phase transition, discarded on order placement or cart clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub order_notes: Option<String>,
    #[serde(default)]
    pub gift_wrap: bool,
    /// GSTIN for buyers who want a business invoice.
    #[serde(default)]
    pub business_gstin: Option<String>,
    pub phase: CheckoutPhase,
}

impl Default for CheckoutDraft {
    fn default() -> Self {
        Self {
            address: ShippingAddress::default(),
            payment_method: PaymentMethod::Gateway,
            order_notes: None,
            gift_wrap: false,
            business_gstin: None,
            phase: CheckoutPhase::Shipping,
        }
    }
}
