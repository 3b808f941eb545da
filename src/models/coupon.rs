use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Backend decision about one coupon code. At most one may be active on a
/// checkout session at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub valid: bool,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub message: Option<String>,
}
