use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::models::{CheckoutPhase, PaymentMethod};

/// Events emitted over the checkout session lifecycle. The host subscribes
/// to the receiving end to drive notifications, analytics, and navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CheckoutStarted {
        cart_id: Uuid,
    },
    PhaseEntered {
        cart_id: Uuid,
        phase: CheckoutPhase,
    },
    ServiceabilityChecked {
        postal_code: String,
        serviceable: bool,
        cod_available: Option<bool>,
    },
    PaymentMethodChanged {
        method: PaymentMethod,
        auto_corrected: bool,
    },
    CouponApplied {
        code: String,
        discount: Decimal,
    },
    CouponRemoved {
        code: String,
    },
    OrderCreated {
        order_id: Uuid,
        order_number: String,
    },
    GatewayOrderOpened {
        order_id: Uuid,
        gateway_order_id: String,
        amount_minor: i64,
    },
    PaymentVerified {
        order_id: Uuid,
        gateway_payment_id: String,
    },
    PaymentFailed {
        order_id: Option<Uuid>,
        reason: String,
    },
    CheckoutCompleted {
        cart_id: Uuid,
        order_id: Uuid,
    },
    /// Successful completion routes to a confirmation view keyed by the
    /// server-issued order number. The host must perform a full navigation.
    ConfirmationRequested {
        order_number: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the receiver is gone.
    /// Event delivery is observability, not correctness.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping checkout event: {}", e);
        }
    }
}

/// Builds an event channel with the given capacity.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Builds the event channel sized per configuration.
pub fn channel_for(config: &crate::config::CheckoutConfig) -> (EventSender, mpsc::Receiver<Event>) {
    channel(config.event_channel_capacity)
}
