use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::client::{CouponValidationRequest, StorefrontClient};
use crate::errors::CheckoutError;
use crate::events::{Event, EventSender};
use crate::models::{AppliedCoupon, CartSnapshot};

/// Holds at most one applied coupon and relays the backend's eligibility
/// decisions. Replacing or removing the coupon is atomic: there is no state
/// where a stale discount shows against a new code.
pub struct CouponLedger {
    client: Arc<dyn StorefrontClient>,
    events: EventSender,
    applied: Option<AppliedCoupon>,
}

impl CouponLedger {
    pub fn new(client: Arc<dyn StorefrontClient>, events: EventSender) -> Self {
        Self {
            client,
            events,
            applied: None,
        }
    }

    /// Validates and applies a coupon. The code is captured here, before any
    /// await, so a concurrently edited input buffer cannot change which code
    /// the response is attributed to.
    #[instrument(skip(self, snapshot))]
    pub async fn apply(
        &mut self,
        code: &str,
        snapshot: &CartSnapshot,
    ) -> Result<AppliedCoupon, CheckoutError> {
        let code = code.trim().to_string();
        if code.is_empty() {
            return Err(CheckoutError::Coupon("Enter a coupon code".into()));
        }

        let request = CouponValidationRequest::for_snapshot(code.clone(), snapshot);
        let coupon = self.client.validate_coupon(request).await?;

        if !coupon.valid {
            // Only the same code may clear previously shown discount state;
            // an already-applied different coupon stays untouched.
            if self.applied.as_ref().map(|c| c.code.as_str()) == Some(code.as_str()) {
                self.applied = None;
            }
            return Err(CheckoutError::Coupon(
                coupon
                    .message
                    .unwrap_or_else(|| "This coupon cannot be applied".into()),
            ));
        }

        if coupon.discount_amount > snapshot.subtotal() {
            return Err(CheckoutError::Coupon(
                "Coupon discount exceeds the cart value".into(),
            ));
        }

        info!(code = %coupon.code, discount = %coupon.discount_amount, "coupon applied");
        self.applied = Some(coupon.clone());
        self.events
            .send_or_log(Event::CouponApplied {
                code: coupon.code.clone(),
                discount: coupon.discount_amount,
            })
            .await;

        Ok(coupon)
    }

    /// Removes the active coupon, resetting the discount to zero.
    pub async fn remove(&mut self) -> Option<String> {
        let removed = self.applied.take().map(|c| c.code);
        if let Some(code) = &removed {
            self.events
                .send_or_log(Event::CouponRemoved { code: code.clone() })
                .await;
        }
        removed
    }

    pub fn applied(&self) -> Option<&AppliedCoupon> {
        self.applied.as_ref()
    }

    /// Clears coupon state without notification; session teardown only.
    pub(crate) fn reset(&mut self) {
        self.applied = None;
    }

    pub fn discount(&self) -> Decimal {
        self.applied
            .as_ref()
            .map(|c| c.discount_amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Relays the promotional coupon listing.
    pub async fn active_coupons(&self) -> Result<Vec<AppliedCoupon>, CheckoutError> {
        self.client.get_active_coupons().await
    }
}
