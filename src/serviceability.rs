use std::sync::Arc;

use tracing::{instrument, warn};

use crate::client::StorefrontClient;
use crate::events::{Event, EventSender};
use crate::models::ServiceabilityResult;

const RETRY_MESSAGE: &str = "Could not verify delivery for this PIN code. Please try again.";

/// Delivery-serviceability lookup with a one-entry memo: the last checked
/// postal code, whether it resolved serviceable or not, short-circuits a
/// repeat check until the address changes.
pub struct ServiceabilityGate {
    client: Arc<dyn StorefrontClient>,
    events: EventSender,
    last_checked: Option<String>,
    last_result: Option<ServiceabilityResult>,
}

impl ServiceabilityGate {
    pub fn new(client: Arc<dyn StorefrontClient>, events: EventSender) -> Self {
        Self {
            client,
            events,
            last_checked: None,
            last_result: None,
        }
    }

    pub fn needs_check(&self, postal_code: &str) -> bool {
        self.last_checked.as_deref() != Some(postal_code)
    }

    /// Checks serviceability for the code, consulting the memo first.
    /// A failed network call resolves fail-closed: not serviceable, with a
    /// user-facing retry message.
    #[instrument(skip(self))]
    pub async fn check(&mut self, postal_code: &str) -> ServiceabilityResult {
        if !self.needs_check(postal_code) {
            if let Some(cached) = &self.last_result {
                return cached.clone();
            }
        }

        let result = match self.client.check_delivery(postal_code).await {
            Ok(result) => result,
            Err(e) => {
                warn!(%postal_code, error = %e, "serviceability check failed");
                ServiceabilityResult::unreachable(RETRY_MESSAGE)
            }
        };

        self.last_checked = Some(postal_code.to_string());
        self.last_result = Some(result.clone());

        self.events
            .send_or_log(Event::ServiceabilityChecked {
                postal_code: postal_code.to_string(),
                serviceable: result.serviceable,
                cod_available: result.cod_available,
            })
            .await;

        result
    }

    /// Forgets the last-checked code so the next check hits the backend.
    /// Called on every explicit address change or autocomplete selection.
    pub fn invalidate(&mut self) {
        self.last_checked = None;
        self.last_result = None;
    }

    pub fn last_result(&self) -> Option<&ServiceabilityResult> {
        self.last_result.as_ref()
    }

    /// COD is only blocked once a check has said so explicitly.
    pub fn cod_available(&self) -> bool {
        self.last_result
            .as_ref()
            .and_then(|r| r.cod_available)
            .unwrap_or(true)
    }
}
