use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Delivery eligibility for one postal code. Session-scoped only, never
/// persisted; invalidated whenever the code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceabilityResult {
    pub serviceable: bool,
    #[serde(default)]
    pub estimate_days: Option<u32>,
    #[serde(default)]
    pub cod_available: Option<bool>,
    #[serde(default)]
    pub shipping_cost: Option<Decimal>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ServiceabilityResult {
    /// The fail-closed result for a check that could not be completed.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            serviceable: false,
            estimate_days: None,
            cod_available: None,
            shipping_cost: None,
            message: Some(message.into()),
        }
    }
}
