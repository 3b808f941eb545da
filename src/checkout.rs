use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::client::{DraftUpdate, StorefrontClient};
use crate::config::CheckoutConfig;
use crate::coupons::CouponLedger;
use crate::errors::CheckoutError;
use crate::events::{Event, EventSender};
use crate::models::{
    AppliedCoupon, CartLine, CartSnapshot, CheckoutDraft, CheckoutPhase, OrderIntent,
    OrderReceipt, PaymentMethod, ServiceabilityResult, ShippingAddress, POSTAL_CODE_PATTERN,
};
use crate::payment::PaymentOrchestrator;
use crate::pricing::{monthly_installment_estimate, PriceBreakdown, ShippingPolicy};
use crate::serviceability::ServiceabilityGate;

/// Session-scoped checkout state machine.
///
/// Owns the draft, the serviceability gate and the coupon ledger for one
/// cart. Phases run `Shipping -> Payment -> Review`; backward transitions
/// are always permitted and re-enter with the draft intact, skipping ahead
/// is not. The session begins when the cart becomes non-empty and ends on
/// order placement or cart clear.
pub struct CheckoutSession {
    cart_id: Uuid,
    lines: Vec<CartLine>,
    draft: CheckoutDraft,
    gate: ServiceabilityGate,
    ledger: CouponLedger,
    client: Arc<dyn StorefrontClient>,
    events: EventSender,
    config: Arc<CheckoutConfig>,
    referral_code: Option<String>,
}

impl std::fmt::Debug for CheckoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutSession")
            .field("cart_id", &self.cart_id)
            .field("lines", &self.lines)
            .field("draft", &self.draft)
            .field("referral_code", &self.referral_code)
            .finish_non_exhaustive()
    }
}

impl CheckoutSession {
    #[instrument(skip(lines, client, events, config))]
    pub async fn begin(
        cart_id: Uuid,
        lines: Vec<CartLine>,
        client: Arc<dyn StorefrontClient>,
        events: EventSender,
        config: Arc<CheckoutConfig>,
    ) -> Result<Self, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let session = Self {
            cart_id,
            lines,
            draft: CheckoutDraft::default(),
            gate: ServiceabilityGate::new(Arc::clone(&client), events.clone()),
            ledger: CouponLedger::new(Arc::clone(&client), events.clone()),
            client,
            events,
            config,
            referral_code: None,
        };
        session
            .events
            .send_or_log(Event::CheckoutStarted { cart_id })
            .await;
        Ok(session)
    }

    pub fn cart_id(&self) -> Uuid {
        self.cart_id
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.draft.phase
    }

    pub fn draft(&self) -> &CheckoutDraft {
        &self.draft
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::of(&self.lines)
    }

    pub fn applied_coupon(&self) -> Option<&AppliedCoupon> {
        self.ledger.applied()
    }

    pub fn serviceability(&self) -> Option<&ServiceabilityResult> {
        self.gate.last_result()
    }

    pub fn referral_code(&self) -> Option<&str> {
        self.referral_code.as_deref()
    }

    pub fn set_referral_code(&mut self, code: Option<String>) {
        self.referral_code = code;
    }

    pub fn set_order_notes(&mut self, notes: Option<String>) {
        self.draft.order_notes = notes;
    }

    pub fn set_gift_wrap(&mut self, gift_wrap: bool) {
        self.draft.gift_wrap = gift_wrap;
    }

    pub fn set_business_gstin(&mut self, gstin: Option<String>) {
        self.draft.business_gstin = gstin;
    }

    /// Replaces the whole address draft (e.g. a saved-address selection).
    /// Any address change invalidates the serviceability memo.
    pub fn set_address(&mut self, address: ShippingAddress) {
        self.draft.address = address;
        self.gate.invalidate();
    }

    /// Updates the postal code from the address form. Invalidate first, then
    /// try a best-effort city/state autofill once the code looks complete;
    /// lookup failures are silently ignored.
    #[instrument(skip(self))]
    pub async fn edit_postal_code(&mut self, postal_code: &str) {
        self.draft.address.postal_code = postal_code.trim().to_string();
        self.gate.invalidate();

        if !self.draft.address.has_valid_postal_code() {
            return;
        }
        match self
            .client
            .lookup_postal_code(&self.draft.address.postal_code)
            .await
        {
            Ok(info) => {
                if let Some(city) = info.city {
                    self.draft.address.city = city;
                }
                if let Some(region) = info.state.and_then(|s| s.parse().ok()) {
                    self.draft.address.region = Some(region);
                }
            }
            Err(e) => debug!(error = %e, "postal code lookup failed; ignoring"),
        }
    }

    /// Runs (or reuses) the serviceability check for the drafted postal code
    /// and re-validates the payment method against the result.
    pub async fn check_serviceability(&mut self) -> ServiceabilityResult {
        let postal_code = self.draft.address.postal_code.clone();
        let result = self.gate.check(&postal_code).await;
        self.enforce_payment_method_rule().await;
        result
    }

    /// Explicit payment-method selection. COD cannot be selected once a
    /// serviceability result has denied it.
    pub async fn select_payment_method(
        &mut self,
        method: PaymentMethod,
    ) -> Result<(), CheckoutError> {
        if method == PaymentMethod::CashOnDelivery && !self.gate.cod_available() {
            return Err(CheckoutError::CodUnavailable(
                "Cash on delivery is not available for this PIN code".into(),
            ));
        }
        if self.draft.payment_method != method {
            self.draft.payment_method = method;
            self.events
                .send_or_log(Event::PaymentMethodChanged {
                    method,
                    auto_corrected: false,
                })
                .await;
        }
        Ok(())
    }

    /// Confirms the shipping phase. Blocks on a serviceability check for an
    /// unchecked 6-digit code and fails closed when the code cannot be
    /// served; then validates the address fields; then persists progress
    /// (fire-and-forget) and advances to Payment.
    #[instrument(skip(self), fields(cart_id = %self.cart_id))]
    pub async fn submit_shipping(&mut self) -> Result<(), CheckoutError> {
        if self.draft.phase != CheckoutPhase::Shipping {
            return Err(CheckoutError::InvalidTransition {
                from: self.draft.phase,
                to: CheckoutPhase::Payment,
            });
        }

        let postal_code = self.draft.address.postal_code.clone();
        if POSTAL_CODE_PATTERN.is_match(&postal_code) && self.gate.needs_check(&postal_code) {
            self.check_serviceability().await;
        }

        if let Some(result) = self.gate.last_result() {
            if !result.serviceable {
                return Err(CheckoutError::NotServiceable {
                    postal_code,
                    message: result
                        .message
                        .clone()
                        .unwrap_or_else(|| "We cannot deliver to this PIN code yet.".into()),
                });
            }
        }

        self.draft
            .address
            .validate_fields()
            .map_err(CheckoutError::Validation)?;

        self.persist_progress(DraftUpdate {
            phase: Some(CheckoutPhase::Payment),
            contact_name: Some(self.draft.address.name.clone()),
            contact_phone: Some(self.draft.address.phone.clone()),
            contact_email: self.draft.address.email.clone(),
            postal_code: Some(postal_code),
            payment_method: None,
            order_notes: self.draft.order_notes.clone(),
        });

        self.enter_phase(CheckoutPhase::Payment).await;
        Ok(())
    }

    /// Confirms the payment phase. The method always has a value (it
    /// defaults to the gateway), so the only gate is the COD rule.
    #[instrument(skip(self), fields(cart_id = %self.cart_id))]
    pub async fn submit_payment(&mut self) -> Result<(), CheckoutError> {
        if self.draft.phase != CheckoutPhase::Payment {
            return Err(CheckoutError::InvalidTransition {
                from: self.draft.phase,
                to: CheckoutPhase::Review,
            });
        }

        // Serviceability may have changed since the method was chosen.
        self.enforce_payment_method_rule().await;

        self.persist_progress(DraftUpdate {
            phase: Some(CheckoutPhase::Review),
            payment_method: Some(self.draft.payment_method),
            ..DraftUpdate::default()
        });

        self.enter_phase(CheckoutPhase::Review).await;
        Ok(())
    }

    /// Returns to an earlier phase with the draft intact.
    pub async fn back_to(&mut self, phase: CheckoutPhase) -> Result<(), CheckoutError> {
        if phase >= self.draft.phase {
            return Err(CheckoutError::InvalidTransition {
                from: self.draft.phase,
                to: phase,
            });
        }
        self.persist_progress(DraftUpdate {
            phase: Some(phase),
            ..DraftUpdate::default()
        });
        self.enter_phase(phase).await;
        Ok(())
    }

    pub async fn apply_coupon(&mut self, code: &str) -> Result<AppliedCoupon, CheckoutError> {
        let snapshot = self.snapshot();
        self.ledger.apply(code, &snapshot).await
    }

    pub async fn remove_coupon(&mut self) -> Option<String> {
        self.ledger.remove().await
    }

    pub async fn active_coupons(&self) -> Result<Vec<AppliedCoupon>, CheckoutError> {
        self.ledger.active_coupons().await
    }

    /// Prices the cart as drafted: serviceability-quoted shipping when
    /// available, the configured policy otherwise.
    pub fn price(&self) -> Result<PriceBreakdown, CheckoutError> {
        let snapshot = self.snapshot();
        let policy = ShippingPolicy::from_config(&self.config);
        let quoted = self.gate.last_result().and_then(|r| r.shipping_cost);
        let shipping = policy.cost_for(snapshot.subtotal(), quoted);
        PriceBreakdown::compute(&snapshot, self.ledger.applied(), shipping)
    }

    /// Cosmetic "from X/mo" figure for the review screen. Display only.
    pub fn installment_estimate(&self) -> Result<Decimal, CheckoutError> {
        Ok(monthly_installment_estimate(
            self.price()?.total,
            self.config.emi_installment_count,
        ))
    }

    /// Builds the immutable order snapshot for one placement attempt.
    /// Only valid from the Review phase.
    pub fn build_intent(&self) -> Result<OrderIntent, CheckoutError> {
        if self.draft.phase != CheckoutPhase::Review {
            return Err(CheckoutError::InvalidTransition {
                from: self.draft.phase,
                to: CheckoutPhase::Review,
            });
        }
        self.draft
            .address
            .validate_fields()
            .map_err(CheckoutError::Validation)?;
        let pricing = self.price()?;

        Ok(OrderIntent {
            cart_id: self.cart_id,
            lines: self.lines.clone(),
            address: self.draft.address.clone(),
            payment_method: self.draft.payment_method,
            pricing,
            coupon_code: self.ledger.applied().map(|c| c.code.clone()),
            referral_code: self.referral_code.clone(),
            order_notes: self.draft.order_notes.clone(),
            gift_wrap: self.draft.gift_wrap,
            business_gstin: self.draft.business_gstin.clone(),
        })
    }

    /// Places the order through the orchestrator and, on success, ends the
    /// session: cart lines, coupon, draft and (by default) referral
    /// attribution are cleared.
    #[instrument(skip(self, orchestrator), fields(cart_id = %self.cart_id))]
    pub async fn place_order(
        &mut self,
        orchestrator: &PaymentOrchestrator,
    ) -> Result<OrderReceipt, CheckoutError> {
        let intent = self.build_intent()?;
        let receipt = orchestrator.place(intent).await?;

        self.lines.clear();
        self.ledger.reset();
        if self.config.clear_referral_on_completion {
            self.referral_code = None;
        }
        self.draft = CheckoutDraft::default();

        Ok(receipt)
    }

    /// The single site enforcing the serviceability/payment-method rule:
    /// when COD becomes unavailable while selected, fall back to the
    /// gateway and tell the shopper.
    async fn enforce_payment_method_rule(&mut self) {
        if self.draft.payment_method == PaymentMethod::CashOnDelivery
            && !self.gate.cod_available()
        {
            self.draft.payment_method = PaymentMethod::Gateway;
            self.events
                .send_or_log(Event::PaymentMethodChanged {
                    method: PaymentMethod::Gateway,
                    auto_corrected: true,
                })
                .await;
        }
    }

    async fn enter_phase(&mut self, phase: CheckoutPhase) {
        self.draft.phase = phase;
        self.events
            .send_or_log(Event::PhaseEntered {
                cart_id: self.cart_id,
                phase,
            })
            .await;
    }

    fn persist_progress(&self, update: DraftUpdate) {
        let client = Arc::clone(&self.client);
        let cart_id = self.cart_id;
        tokio::spawn(async move {
            if let Err(e) = client.save_checkout_progress(cart_id, update).await {
                warn!(%cart_id, error = %e, "failed to persist checkout progress");
            }
        });
    }
}
