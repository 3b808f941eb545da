use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CheckoutConfig;
use crate::errors::CheckoutError;
use crate::models::{AppliedCoupon, CartSnapshot};

/// Shipping resolution when serviceability supplies no explicit cost:
/// flat rate below the free-shipping threshold, free above it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShippingPolicy {
    pub flat_rate: Decimal,
    pub free_threshold: Decimal,
}

impl ShippingPolicy {
    pub fn from_config(config: &CheckoutConfig) -> Self {
        Self {
            flat_rate: config.flat_shipping,
            free_threshold: config.free_shipping_threshold,
        }
    }

    /// A cost quoted by the serviceability check wins over the policy.
    pub fn cost_for(&self, subtotal: Decimal, quoted: Option<Decimal>) -> Decimal {
        if let Some(cost) = quoted {
            return cost;
        }
        if subtotal >= self.free_threshold {
            Decimal::ZERO
        } else {
            self.flat_rate
        }
    }
}

/// The priced cart. Always satisfies
/// `total = subtotal + tax + shipping - discount` and `discount <= subtotal`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl PriceBreakdown {
    /// Prices a cart snapshot. A discount exceeding the subtotal is an
    /// error here, never a silent clamp; the ledger should have rejected
    /// the coupon before it got this far.
    pub fn compute(
        snapshot: &CartSnapshot,
        coupon: Option<&AppliedCoupon>,
        shipping: Decimal,
    ) -> Result<Self, CheckoutError> {
        let subtotal = snapshot.subtotal();
        let tax = snapshot.tax_total();
        let discount = coupon
            .filter(|c| c.valid)
            .map(|c| c.discount_amount)
            .unwrap_or(Decimal::ZERO);

        if discount > subtotal {
            return Err(CheckoutError::Coupon(format!(
                "Discount {} exceeds cart subtotal {}",
                discount, subtotal
            )));
        }

        let breakdown = Self {
            subtotal,
            tax,
            shipping,
            discount,
            total: subtotal + tax + shipping - discount,
        };
        debug!(?breakdown, "priced cart");
        Ok(breakdown)
    }
}

/// Cosmetic "from X/mo" figure shown next to high-value totals: the total
/// split over a fixed installment count, rounded to whole currency units.
/// Never the authoritative charge amount; that is the gateway order's.
pub fn monthly_installment_estimate(total: Decimal, installments: u32) -> Decimal {
    if installments == 0 {
        return total;
    }
    (total / Decimal::from(installments)).round_dp(0)
}
