use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::config::CheckoutConfig;
use crate::errors::CheckoutError;
use crate::models::{
    AppliedCoupon, GatewayOrder, OrderIntent, OrderReceipt, PaymentVerification,
    ServiceabilityResult, VerificationOutcome,
};

use super::{
    CouponValidationRequest, CreatePaymentOrderRequest, DraftUpdate, PostalCodeInfo,
    StorefrontClient,
};

/// Reqwest-backed implementation of [`StorefrontClient`].
#[derive(Debug, Clone)]
pub struct HttpStorefrontClient {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpStorefrontClient {
    pub fn new(config: &CheckoutConfig) -> Result<Self, CheckoutError> {
        let base_url = reqwest::Url::parse(&config.backend_base_url).map_err(|e| {
            CheckoutError::Configuration(format!(
                "Invalid backend base URL {}: {}",
                config.backend_base_url, e
            ))
        })?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, CheckoutError> {
        // Joining on "segment" would drop the base path, so extend instead.
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                CheckoutError::Configuration("Backend base URL cannot be a base".into())
            })?;
            segments.pop_if_empty();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, CheckoutError> {
        let response = Self::ensure_success(path, response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn ensure_success(
        path: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, CheckoutError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        warn!(%path, %status, "backend call failed");
        Err(CheckoutError::ExternalService(format!(
            "{} returned {}: {}",
            path, status, snippet
        )))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CheckoutError> {
        let url = self.endpoint(path)?;
        let response = self.client.get(url).send().await?;
        Self::decode(path, response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CheckoutError> {
        let url = self.endpoint(path)?;
        let response = self.client.post(url).json(body).send().await?;
        Self::decode(path, response).await
    }
}

#[derive(Debug, Serialize)]
struct DeliveryCheckRequest<'a> {
    postal_code: &'a str,
}

// The backend keeps the gateway's native field name on the wire.
#[derive(Debug, Deserialize)]
struct PaymentOrderResponse {
    razorpay_order_id: String,
    amount: i64,
    #[serde(default)]
    key_id: Option<String>,
}

#[async_trait]
impl StorefrontClient for HttpStorefrontClient {
    #[instrument(skip(self))]
    async fn check_delivery(
        &self,
        postal_code: &str,
    ) -> Result<ServiceabilityResult, CheckoutError> {
        self.post_json("delivery/check", &DeliveryCheckRequest { postal_code })
            .await
    }

    #[instrument(skip(self))]
    async fn lookup_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<PostalCodeInfo, CheckoutError> {
        self.get_json(&format!("postal-codes/{}", postal_code)).await
    }

    #[instrument(skip(self))]
    async fn get_active_coupons(&self) -> Result<Vec<AppliedCoupon>, CheckoutError> {
        self.get_json("coupons/active").await
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    async fn validate_coupon(
        &self,
        request: CouponValidationRequest,
    ) -> Result<AppliedCoupon, CheckoutError> {
        self.post_json("coupons/validate", &request).await
    }

    #[instrument(skip(self, update))]
    async fn save_checkout_progress(
        &self,
        cart_id: Uuid,
        update: DraftUpdate,
    ) -> Result<(), CheckoutError> {
        let path = format!("carts/{}/checkout-progress", cart_id);
        let url = self.endpoint(&path)?;
        let response = self.client.put(url).json(&update).send().await?;
        Self::ensure_success(&path, response).await?;
        Ok(())
    }

    #[instrument(skip(self, intent), fields(cart_id = %intent.cart_id))]
    async fn create_order(&self, intent: &OrderIntent) -> Result<OrderReceipt, CheckoutError> {
        self.post_json("orders", intent).await
    }

    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn create_payment_order(
        &self,
        request: CreatePaymentOrderRequest,
    ) -> Result<GatewayOrder, CheckoutError> {
        let response: PaymentOrderResponse = self.post_json("payments/orders", &request).await?;
        Ok(GatewayOrder {
            gateway_order_id: response.razorpay_order_id,
            amount_minor: response.amount,
            key_id: response.key_id,
        })
    }

    #[instrument(skip(self, verification), fields(order_id = %verification.order_id))]
    async fn verify_payment(
        &self,
        verification: PaymentVerification,
    ) -> Result<VerificationOutcome, CheckoutError> {
        self.post_json("payments/verify", &verification).await
    }

    #[instrument(skip(self))]
    async fn mark_cart_converted(&self, order_id: Uuid) -> Result<(), CheckoutError> {
        let path = "carts/mark-converted";
        let url = self.endpoint(path)?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "order_id": order_id }))
            .send()
            .await?;
        Self::ensure_success(path, response).await?;
        Ok(())
    }
}
