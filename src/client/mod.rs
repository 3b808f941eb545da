use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CheckoutError;
use crate::models::{
    AppliedCoupon, CartSnapshot, CheckoutPhase, GatewayOrder, OrderIntent, OrderReceipt,
    PaymentMethod, PaymentVerification, ServiceabilityResult, VerificationOutcome,
};

pub mod http;

pub use http::HttpStorefrontClient;

/// Partial draft snapshot persisted to the backend cart record when a
/// checkout phase is left. Progress tracking only; a failed save never
/// blocks the transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftUpdate {
    pub phase: Option<CheckoutPhase>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub order_notes: Option<String>,
}

/// Inputs the backend needs to decide coupon eligibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponValidationRequest {
    pub code: String,
    pub cart_total: Decimal,
    pub cart_items: i32,
    pub product_ids: Vec<Uuid>,
    pub category_ids: Vec<Uuid>,
}

impl CouponValidationRequest {
    pub fn for_snapshot(code: impl Into<String>, snapshot: &CartSnapshot) -> Self {
        Self {
            code: code.into(),
            cart_total: snapshot.subtotal(),
            cart_items: snapshot.item_count(),
            product_ids: snapshot.product_ids(),
            category_ids: snapshot.category_ids(),
        }
    }
}

/// Best-effort postal code metadata used for city/state autofill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostalCodeInfo {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentOrderRequest {
    pub order_id: Uuid,
    pub amount: Decimal,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub customer_phone: String,
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
}

/// The storefront backend as seen from the orchestration core. Every call
/// is a suspension point; implementations must be cancel-safe per call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorefrontClient: Send + Sync {
    async fn check_delivery(
        &self,
        postal_code: &str,
    ) -> Result<ServiceabilityResult, CheckoutError>;

    async fn lookup_postal_code(&self, postal_code: &str)
        -> Result<PostalCodeInfo, CheckoutError>;

    async fn get_active_coupons(&self) -> Result<Vec<AppliedCoupon>, CheckoutError>;

    async fn validate_coupon(
        &self,
        request: CouponValidationRequest,
    ) -> Result<AppliedCoupon, CheckoutError>;

    async fn save_checkout_progress(
        &self,
        cart_id: Uuid,
        update: DraftUpdate,
    ) -> Result<(), CheckoutError>;

    async fn create_order(&self, intent: &OrderIntent) -> Result<OrderReceipt, CheckoutError>;

    async fn create_payment_order(
        &self,
        request: CreatePaymentOrderRequest,
    ) -> Result<GatewayOrder, CheckoutError>;

    async fn verify_payment(
        &self,
        verification: PaymentVerification,
    ) -> Result<VerificationOutcome, CheckoutError>;

    async fn mark_cart_converted(&self, order_id: Uuid) -> Result<(), CheckoutError>;
}
