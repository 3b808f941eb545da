//! Shared fixtures for the integration tests: a programmable in-memory
//! storefront backend with per-operation call counters, and a scripted
//! payment widget.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;
use uuid::Uuid;

use checkout_core::client::{
    CouponValidationRequest, CreatePaymentOrderRequest, DraftUpdate, PostalCodeInfo,
    StorefrontClient,
};
use checkout_core::config::CheckoutConfig;
use checkout_core::errors::CheckoutError;
use checkout_core::events::{self, Event};
use checkout_core::models::{
    AppliedCoupon, CartLine, CartSnapshot, GatewayOrder, OrderIntent, OrderReceipt,
    PaymentMethod, PaymentVerification, Region, ServiceabilityResult, ShippingAddress,
    VerificationOutcome,
};
use checkout_core::payment::{
    GatewayCallback, PaymentOrchestrator, PaymentWidget, WidgetConfig, WidgetOutcome,
};
use checkout_core::pricing::PriceBreakdown;
use checkout_core::CheckoutSession;

// ==================== Fake Backend ====================

#[derive(Default)]
pub struct FakeBackend {
    pub check_delivery_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
    pub validate_coupon_calls: AtomicUsize,
    pub progress_calls: AtomicUsize,
    pub create_order_calls: AtomicUsize,
    pub payment_order_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
    pub converted_calls: AtomicUsize,

    serviceability: Mutex<HashMap<String, ServiceabilityResult>>,
    coupons: Mutex<HashMap<String, AppliedCoupon>>,
    postal_info: Mutex<HashMap<String, PostalCodeInfo>>,
    saved_updates: Mutex<Vec<DraftUpdate>>,

    pub fail_create_order: AtomicBool,
    pub fail_payment_order: AtomicBool,
    pub deny_verification: AtomicBool,
    pub error_verification: AtomicBool,

    key_id: Mutex<Option<String>>,
    amount_minor_override: Mutex<Option<i64>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        let backend = Self {
            key_id: Mutex::new(Some("rzp_key_123".to_string())),
            ..Self::default()
        };
        Arc::new(backend)
    }

    pub fn serviceable(&self, postal_code: &str, cod_available: bool) {
        self.serviceability.lock().unwrap().insert(
            postal_code.to_string(),
            ServiceabilityResult {
                serviceable: true,
                estimate_days: Some(3),
                cod_available: Some(cod_available),
                shipping_cost: None,
                message: None,
            },
        );
    }

    pub fn not_serviceable(&self, postal_code: &str, message: &str) {
        self.serviceability.lock().unwrap().insert(
            postal_code.to_string(),
            ServiceabilityResult {
                serviceable: false,
                estimate_days: None,
                cod_available: None,
                shipping_cost: None,
                message: Some(message.to_string()),
            },
        );
    }

    pub fn with_coupon(&self, code: &str, discount: Decimal) {
        self.coupons.lock().unwrap().insert(
            code.to_string(),
            AppliedCoupon {
                code: code.to_string(),
                valid: true,
                discount_amount: discount,
                message: None,
            },
        );
    }

    pub fn with_postal_info(&self, postal_code: &str, city: &str, state: &str) {
        self.postal_info.lock().unwrap().insert(
            postal_code.to_string(),
            PostalCodeInfo {
                city: Some(city.to_string()),
                state: Some(state.to_string()),
            },
        );
    }

    pub fn set_key_id(&self, key_id: Option<&str>) {
        *self.key_id.lock().unwrap() = key_id.map(str::to_string);
    }

    pub fn set_amount_minor(&self, amount: i64) {
        *self.amount_minor_override.lock().unwrap() = Some(amount);
    }

    pub fn saved_updates(&self) -> Vec<DraftUpdate> {
        self.saved_updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorefrontClient for FakeBackend {
    async fn check_delivery(
        &self,
        postal_code: &str,
    ) -> Result<ServiceabilityResult, CheckoutError> {
        self.check_delivery_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.serviceability.lock().unwrap().get(postal_code).cloned();
        Ok(scripted.unwrap_or(ServiceabilityResult {
            serviceable: true,
            estimate_days: Some(4),
            cod_available: Some(true),
            shipping_cost: None,
            message: None,
        }))
    }

    async fn lookup_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<PostalCodeInfo, CheckoutError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .postal_info
            .lock()
            .unwrap()
            .get(postal_code)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_active_coupons(&self) -> Result<Vec<AppliedCoupon>, CheckoutError> {
        Ok(self.coupons.lock().unwrap().values().cloned().collect())
    }

    async fn validate_coupon(
        &self,
        request: CouponValidationRequest,
    ) -> Result<AppliedCoupon, CheckoutError> {
        self.validate_coupon_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.coupons.lock().unwrap().get(&request.code).cloned();
        Ok(scripted.unwrap_or(AppliedCoupon {
            code: request.code,
            valid: false,
            discount_amount: Decimal::ZERO,
            message: Some("Invalid coupon code".to_string()),
        }))
    }

    async fn save_checkout_progress(
        &self,
        _cart_id: Uuid,
        update: DraftUpdate,
    ) -> Result<(), CheckoutError> {
        self.progress_calls.fetch_add(1, Ordering::SeqCst);
        self.saved_updates.lock().unwrap().push(update);
        Ok(())
    }

    async fn create_order(&self, _intent: &OrderIntent) -> Result<OrderReceipt, CheckoutError> {
        if self.fail_create_order.load(Ordering::SeqCst) {
            return Err(CheckoutError::ExternalService(
                "order service unavailable".into(),
            ));
        }
        let n = self.create_order_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(OrderReceipt {
            id: Uuid::new_v4(),
            order_number: format!("SF-{:04}", 1000 + n),
        })
    }

    async fn create_payment_order(
        &self,
        request: CreatePaymentOrderRequest,
    ) -> Result<GatewayOrder, CheckoutError> {
        if self.fail_payment_order.load(Ordering::SeqCst) {
            return Err(CheckoutError::ExternalService(
                "gateway order service unavailable".into(),
            ));
        }
        let n = self.payment_order_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let amount_minor = self
            .amount_minor_override
            .lock()
            .unwrap()
            .unwrap_or_else(|| (request.amount * dec!(100)).to_i64().unwrap_or(0));
        Ok(GatewayOrder {
            gateway_order_id: format!("order_gw_{}", n),
            amount_minor,
            key_id: self.key_id.lock().unwrap().clone(),
        })
    }

    async fn verify_payment(
        &self,
        _verification: PaymentVerification,
    ) -> Result<VerificationOutcome, CheckoutError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.error_verification.load(Ordering::SeqCst) {
            return Err(CheckoutError::ExternalService(
                "verification service unavailable".into(),
            ));
        }
        if self.deny_verification.load(Ordering::SeqCst) {
            return Ok(VerificationOutcome {
                verified: false,
                message: Some("Payment signature mismatch".into()),
            });
        }
        Ok(VerificationOutcome {
            verified: true,
            message: None,
        })
    }

    async fn mark_cart_converted(&self, _order_id: Uuid) -> Result<(), CheckoutError> {
        self.converted_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ==================== Scripted Widget ====================

pub struct ScriptedWidget {
    outcomes: Mutex<VecDeque<WidgetOutcome>>,
    pub opens: AtomicUsize,
    pub last_config: Mutex<Option<WidgetConfig>>,
    hold: Mutex<Option<Duration>>,
}

impl ScriptedWidget {
    pub fn always_succeeding() -> Arc<Self> {
        Self::with_outcomes(vec![])
    }

    pub fn with_outcomes(outcomes: Vec<WidgetOutcome>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            opens: AtomicUsize::new(0),
            last_config: Mutex::new(None),
            hold: Mutex::new(None),
        })
    }

    pub fn dismiss_once() -> Arc<Self> {
        Self::with_outcomes(vec![WidgetOutcome::Dismissed])
    }

    /// Keeps the widget "open" for the given duration before resolving, to
    /// model the shopper taking time inside the payment sheet.
    pub fn set_hold(&self, duration: Duration) {
        *self.hold.lock().unwrap() = Some(duration);
    }

    pub fn last_config(&self) -> Option<WidgetConfig> {
        self.last_config.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentWidget for ScriptedWidget {
    async fn open(&self, config: WidgetConfig) -> Result<WidgetOutcome, CheckoutError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let gateway_order_id = config.gateway_order_id.clone();
        *self.last_config.lock().unwrap() = Some(config);

        let hold = *self.hold.lock().unwrap();
        if let Some(duration) = hold {
            tokio::time::sleep(duration).await;
        }

        let scripted = self.outcomes.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or(WidgetOutcome::Success(GatewayCallback {
            gateway_order_id,
            gateway_payment_id: "pay_abc123".into(),
            gateway_signature: "sig_abc123".into(),
        })))
    }
}

// ==================== Builders ====================

/// Two lines, subtotal 1000, 18% tax on both.
pub fn sample_lines() -> Vec<CartLine> {
    vec![
        CartLine {
            product_id: Uuid::new_v4(),
            variant_id: Some(Uuid::new_v4()),
            name: "Mixer Grinder 750W".into(),
            unit_price: dec!(400),
            quantity: 2,
            tax_rate: dec!(0.18),
            category_id: Some(Uuid::new_v4()),
        },
        CartLine {
            product_id: Uuid::new_v4(),
            variant_id: None,
            name: "Steel Water Bottle".into(),
            unit_price: dec!(200),
            quantity: 1,
            tax_rate: dec!(0.18),
            category_id: Some(Uuid::new_v4()),
        },
    ]
}

/// One line above the high-value installment threshold.
pub fn premium_lines() -> Vec<CartLine> {
    vec![CartLine {
        product_id: Uuid::new_v4(),
        variant_id: None,
        name: "Split Air Conditioner 1.5T".into(),
        unit_price: dec!(60000),
        quantity: 1,
        tax_rate: dec!(0),
        category_id: Some(Uuid::new_v4()),
    }]
}

pub fn valid_address() -> ShippingAddress {
    ShippingAddress {
        name: "Asha Rao".into(),
        phone: "9876543210".into(),
        email: Some("asha@example.com".into()),
        line1: "14 MG Road".into(),
        line2: Some("Near Metro".into()),
        city: "Bengaluru".into(),
        region: Some(Region::Karnataka),
        postal_code: "560001".into(),
        country: "IN".into(),
    }
}

pub fn test_config() -> Arc<CheckoutConfig> {
    Arc::new(CheckoutConfig::default())
}

pub fn intent_for(lines: &[CartLine], method: PaymentMethod) -> OrderIntent {
    let snapshot = CartSnapshot::of(lines);
    let pricing = PriceBreakdown::compute(&snapshot, None, Decimal::ZERO).unwrap();
    OrderIntent {
        cart_id: Uuid::new_v4(),
        lines: lines.to_vec(),
        address: valid_address(),
        payment_method: method,
        pricing,
        coupon_code: None,
        referral_code: None,
        order_notes: None,
        gift_wrap: false,
        business_gstin: None,
    }
}

pub async fn session_with(
    backend: Arc<FakeBackend>,
    config: Arc<CheckoutConfig>,
    lines: Vec<CartLine>,
) -> (CheckoutSession, mpsc::Receiver<Event>) {
    let (sender, rx) = events::channel(64);
    let session = CheckoutSession::begin(Uuid::new_v4(), lines, backend, sender, config)
        .await
        .expect("non-empty cart");
    (session, rx)
}

pub fn orchestrator_with(
    backend: Arc<FakeBackend>,
    widget: Arc<ScriptedWidget>,
    config: Arc<CheckoutConfig>,
) -> (PaymentOrchestrator, mpsc::Receiver<Event>) {
    let (sender, rx) = events::channel(64);
    (
        PaymentOrchestrator::new(backend, widget, sender, config),
        rx,
    )
}

/// Drains whatever events have been emitted so far.
pub fn drain_events(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
