use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::errors::CheckoutError;
use crate::models::ShippingAddress;

/// Contact details prefilled into the payment widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetPrefill {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
}

impl WidgetPrefill {
    pub fn from_address(address: &ShippingAddress) -> Self {
        Self {
            name: address.name.clone(),
            email: address.email.clone(),
            phone: address.phone.clone(),
        }
    }
}

/// Expanded financing options the widget is offered for high-value orders.
/// A display toggle only; it never affects the charge amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentBlock {
    pub emi: bool,
    pub cardless_emi: bool,
    pub pay_later: bool,
}

impl InstallmentBlock {
    pub fn expanded() -> Self {
        Self {
            emi: true,
            cardless_emi: true,
            pay_later: true,
        }
    }
}

/// Everything the opaque widget needs. `amount_minor` is the backend's
/// authoritative gateway-order amount, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub key_id: String,
    pub gateway_order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub merchant_name: String,
    pub description: String,
    pub prefill: WidgetPrefill,
    pub theme_color: String,
    #[serde(default)]
    pub installments: Option<InstallmentBlock>,
}

/// Identifiers delivered by the widget's success callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayCallback {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
}

/// The widget fires exactly one terminal callback per open.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetOutcome {
    Success(GatewayCallback),
    Dismissed,
}

/// Capability seam over the vendor payment widget. The real adapter wraps
/// the vendor script in the host shell; tests use a deterministic fake.
#[async_trait]
pub trait PaymentWidget: Send + Sync {
    async fn open(&self, config: WidgetConfig) -> Result<WidgetOutcome, CheckoutError>;
}

/// One-time initialization step for adapters whose widget must be loaded
/// before first use (e.g. injecting the vendor script).
#[async_trait]
pub trait WidgetLoader: Send + Sync {
    type Widget: PaymentWidget;

    async fn load(&self) -> Result<Self::Widget, CheckoutError>;
}

/// Defers the loader until the first `open` and runs it at most once per
/// session, matching the load-on-first-use contract of the vendor script.
pub struct OnceLoadedWidget<L: WidgetLoader> {
    loader: L,
    widget: OnceCell<L::Widget>,
}

impl<L: WidgetLoader> OnceLoadedWidget<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            widget: OnceCell::new(),
        }
    }
}

#[async_trait]
impl<L: WidgetLoader> PaymentWidget for OnceLoadedWidget<L> {
    async fn open(&self, config: WidgetConfig) -> Result<WidgetOutcome, CheckoutError> {
        let widget = self
            .widget
            .get_or_try_init(|| self.loader.load())
            .await?;
        widget.open(config).await
    }
}
