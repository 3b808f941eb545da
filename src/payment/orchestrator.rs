use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, instrument, warn};

use crate::client::{CreatePaymentOrderRequest, StorefrontClient};
use crate::config::CheckoutConfig;
use crate::errors::CheckoutError;
use crate::events::{Event, EventSender};
use crate::models::{OrderIntent, OrderReceipt, PaymentMethod, PaymentVerification};

use super::gateway::{InstallmentBlock, PaymentWidget, WidgetConfig, WidgetOutcome, WidgetPrefill};
use super::guard::PlacementGuard;

/// Steps of one placement attempt, strictly sequential. Logged so a support
/// trace shows exactly how far an attempt got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PaymentState {
    #[strum(serialize = "creating_order")]
    CreatingOrder,
    #[strum(serialize = "creating_gateway_order")]
    CreatingGatewayOrder,
    #[strum(serialize = "awaiting_gateway")]
    AwaitingGateway,
    #[strum(serialize = "verifying")]
    Verifying,
    #[strum(serialize = "complete")]
    Complete,
    #[strum(serialize = "failed")]
    Failed,
}

/// Turns a reviewed [`OrderIntent`] into a paid order, via the online
/// gateway protocol or the deferred cash-on-delivery path. All failure
/// modes resolve to a terminal error; the placement guard is released on
/// every failed outcome so the shopper can retry from review.
pub struct PaymentOrchestrator {
    client: Arc<dyn StorefrontClient>,
    widget: Arc<dyn PaymentWidget>,
    guard: Arc<PlacementGuard>,
    events: EventSender,
    config: Arc<CheckoutConfig>,
    /// Set when a payment went through the widget but could not be proven.
    /// The order may already exist server-side; further placements are
    /// refused with a support-contact outcome instead of a duplicate.
    unverified_order: AsyncMutex<Option<OrderReceipt>>,
}

impl PaymentOrchestrator {
    pub fn new(
        client: Arc<dyn StorefrontClient>,
        widget: Arc<dyn PaymentWidget>,
        events: EventSender,
        config: Arc<CheckoutConfig>,
    ) -> Self {
        Self {
            client,
            widget,
            guard: PlacementGuard::new(),
            events,
            config,
            unverified_order: AsyncMutex::new(None),
        }
    }

    pub fn guard(&self) -> Arc<PlacementGuard> {
        Arc::clone(&self.guard)
    }

    /// Clears the unverified-payment block after support has resolved the
    /// earlier attempt.
    pub async fn clear_unverified(&self) {
        *self.unverified_order.lock().await = None;
    }

    /// Places the order. No-op (error) when an attempt is already in
    /// flight: the guard is armed synchronously, before the first await.
    #[instrument(skip(self, intent), fields(cart_id = %intent.cart_id, method = %intent.payment_method))]
    pub async fn place(&self, intent: OrderIntent) -> Result<OrderReceipt, CheckoutError> {
        let permit = self.guard.try_begin()?;

        if let Some(pending) = self.unverified_order.lock().await.clone() {
            permit.release();
            return Err(CheckoutError::VerificationFailed(format!(
                "Payment for order {} could not be verified. Please contact support before paying again.",
                pending.order_number
            )));
        }

        let mut created: Option<OrderReceipt> = None;
        let result = match intent.payment_method {
            PaymentMethod::Gateway => self.place_via_gateway(&intent, &mut created).await,
            PaymentMethod::CashOnDelivery => {
                self.place_cash_on_delivery(&intent, &mut created).await
            }
        };

        match result {
            Ok(receipt) => {
                permit.complete();
                Ok(receipt)
            }
            Err(err) => {
                warn!(state = %PaymentState::Failed, error = %err, "placement attempt failed");
                self.events
                    .send_or_log(Event::PaymentFailed {
                        order_id: created.map(|r| r.id),
                        reason: err.user_message(),
                    })
                    .await;
                permit.release();
                Err(err)
            }
        }
    }

    async fn place_via_gateway(
        &self,
        intent: &OrderIntent,
        created: &mut Option<OrderReceipt>,
    ) -> Result<OrderReceipt, CheckoutError> {
        info!(state = %PaymentState::CreatingOrder, "creating backend order");
        let receipt = self
            .client
            .create_order(intent)
            .await
            .map_err(|e| CheckoutError::OrderCreation(e.to_string()))?;
        *created = Some(receipt.clone());
        self.events
            .send_or_log(Event::OrderCreated {
                order_id: receipt.id,
                order_number: receipt.order_number.clone(),
            })
            .await;

        info!(state = %PaymentState::CreatingGatewayOrder, order_id = %receipt.id, "opening gateway order");
        let gateway_order = self
            .client
            .create_payment_order(self.payment_order_request(intent, &receipt))
            .await
            .map_err(|e| CheckoutError::GatewayOrder(e.to_string()))?;
        self.events
            .send_or_log(Event::GatewayOrderOpened {
                order_id: receipt.id,
                gateway_order_id: gateway_order.gateway_order_id.clone(),
                amount_minor: gateway_order.amount_minor,
            })
            .await;

        let key_id = gateway_order
            .key_id
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.config
                    .gateway_key_id
                    .clone()
                    .filter(|k| !k.trim().is_empty())
            })
            .ok_or_else(|| {
                CheckoutError::Configuration(
                    "No payment gateway key available for this order".into(),
                )
            })?;

        let widget_config = WidgetConfig {
            key_id,
            gateway_order_id: gateway_order.gateway_order_id.clone(),
            // The backend's minor-unit amount is authoritative; never
            // recomputed or rounded here.
            amount_minor: gateway_order.amount_minor,
            currency: self.config.currency.clone(),
            merchant_name: self.config.merchant_name.clone(),
            description: format!("Payment for order {}", receipt.order_number),
            prefill: WidgetPrefill::from_address(&intent.address),
            theme_color: self.config.theme_color.clone(),
            installments: (intent.pricing.total >= self.config.high_value_threshold)
                .then(InstallmentBlock::expanded),
        };

        info!(state = %PaymentState::AwaitingGateway, order_id = %receipt.id, "handing off to payment widget");
        match self.widget.open(widget_config).await? {
            WidgetOutcome::Dismissed => Err(CheckoutError::Cancelled),
            WidgetOutcome::Success(callback) => {
                info!(state = %PaymentState::Verifying, order_id = %receipt.id, "verifying payment");
                let verification = PaymentVerification {
                    gateway_order_id: callback.gateway_order_id,
                    gateway_payment_id: callback.gateway_payment_id.clone(),
                    gateway_signature: callback.gateway_signature,
                    order_id: receipt.id,
                };

                match self.client.verify_payment(verification).await {
                    Ok(outcome) if outcome.verified => {
                        self.events
                            .send_or_log(Event::PaymentVerified {
                                order_id: receipt.id,
                                gateway_payment_id: callback.gateway_payment_id,
                            })
                            .await;
                        self.complete(intent, &receipt).await;
                        Ok(receipt)
                    }
                    Ok(outcome) => {
                        warn!(order_id = %receipt.id, message = ?outcome.message, "payment verification denied");
                        *self.unverified_order.lock().await = Some(receipt.clone());
                        Err(CheckoutError::VerificationFailed(format!(
                            "We could not confirm your payment for order {}. Please contact support before retrying.",
                            receipt.order_number
                        )))
                    }
                    Err(e) => {
                        warn!(order_id = %receipt.id, error = %e, "verification call failed");
                        *self.unverified_order.lock().await = Some(receipt.clone());
                        Err(CheckoutError::VerificationFailed(format!(
                            "We could not confirm your payment for order {}. Please contact support before retrying.",
                            receipt.order_number
                        )))
                    }
                }
            }
        }
    }

    async fn place_cash_on_delivery(
        &self,
        intent: &OrderIntent,
        created: &mut Option<OrderReceipt>,
    ) -> Result<OrderReceipt, CheckoutError> {
        info!(state = %PaymentState::CreatingOrder, "creating cash-on-delivery order");
        let receipt = self
            .client
            .create_order(intent)
            .await
            .map_err(|e| CheckoutError::OrderCreation(e.to_string()))?;
        *created = Some(receipt.clone());
        self.events
            .send_or_log(Event::OrderCreated {
                order_id: receipt.id,
                order_number: receipt.order_number.clone(),
            })
            .await;

        // Progress tracking only; a failed mark never blocks confirmation.
        if let Err(e) = self.client.mark_cart_converted(receipt.id).await {
            warn!(order_id = %receipt.id, error = %e, "failed to mark cart converted");
        }

        self.complete(intent, &receipt).await;
        Ok(receipt)
    }

    async fn complete(&self, intent: &OrderIntent, receipt: &OrderReceipt) {
        info!(state = %PaymentState::Complete, order_id = %receipt.id, order_number = %receipt.order_number, "order placed");
        self.events
            .send_or_log(Event::CheckoutCompleted {
                cart_id: intent.cart_id,
                order_id: receipt.id,
            })
            .await;
        self.events
            .send_or_log(Event::ConfirmationRequested {
                order_number: receipt.order_number.clone(),
            })
            .await;
    }

    fn payment_order_request(
        &self,
        intent: &OrderIntent,
        receipt: &OrderReceipt,
    ) -> CreatePaymentOrderRequest {
        let mut notes = BTreeMap::new();
        notes.insert("order_number".to_string(), receipt.order_number.clone());
        CreatePaymentOrderRequest {
            order_id: receipt.id,
            amount: intent.pricing.total,
            customer_name: intent.address.name.clone(),
            customer_email: intent.address.email.clone(),
            customer_phone: intent.address.phone.clone(),
            notes,
        }
    }
}
