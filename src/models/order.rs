use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::address::ShippingAddress;
use super::cart::CartLine;
use super::draft::PaymentMethod;
use crate::pricing::PriceBreakdown;

/// Immutable snapshot submitted to create an order. Built once per placement
/// attempt; nothing in it changes after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub cart_id: Uuid,
    pub lines: Vec<CartLine>,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub pricing: PriceBreakdown,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub order_notes: Option<String>,
    #[serde(default)]
    pub gift_wrap: bool,
    #[serde(default)]
    pub business_gstin: Option<String>,
}

/// Server-authoritative identity assigned when the order record is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub id: Uuid,
    pub order_number: String,
}

/// Gateway-side payment order opened against a backend order. The amount is
/// the backend's integer minor-unit value and is authoritative; the client
/// never recomputes or rounds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub gateway_order_id: String,
    pub amount_minor: i64,
    #[serde(default)]
    pub key_id: Option<String>,
}

/// Identifiers returned by the widget's success callback, proven authentic
/// by the backend before the order is considered paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
    pub order_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub verified: bool,
    #[serde(default)]
    pub message: Option<String>,
}
