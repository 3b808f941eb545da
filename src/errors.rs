use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::CheckoutPhase;

/// Field-keyed validation errors, so hosts can render each message inline
/// next to the offending input instead of as a toast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Ok when no field failed, otherwise the full error set.
    pub fn into_result(self) -> Result<(), CheckoutError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CheckoutError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Delivery unavailable for {postal_code}: {message}")]
    NotServiceable {
        postal_code: String,
        message: String,
    },

    #[error("Coupon rejected: {0}")]
    Coupon(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: CheckoutPhase,
        to: CheckoutPhase,
    },

    #[error("Cash on delivery unavailable: {0}")]
    CodUnavailable(String),

    #[error("Order creation failed: {0}")]
    OrderCreation(String),

    #[error("Gateway order failed: {0}")]
    GatewayOrder(String),

    #[error("Payment verification failed: {0}")]
    VerificationFailed(String),

    #[error("Payment cancelled")]
    Cancelled,

    #[error("A placement attempt is already in flight")]
    AlreadyInFlight,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl CheckoutError {
    /// Whether the user may simply retry the action that produced this error.
    ///
    /// Verification failures are deliberately excluded: the order may already
    /// exist server-side and a blind retry risks a duplicate charge.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::OrderCreation(_)
            | Self::GatewayOrder(_)
            | Self::Cancelled
            | Self::ExternalService(_)
            | Self::Http(_)
            | Self::NotServiceable { .. }
            | Self::Coupon(_)
            | Self::Validation(_) => true,
            Self::VerificationFailed(_)
            | Self::AlreadyInFlight
            | Self::Configuration(_)
            | Self::EmptyCart
            | Self::InvalidTransition { .. }
            | Self::CodUnavailable(_)
            | Self::Serialization(_)
            | Self::Other(_) => false,
        }
    }

    /// The message suitable for end users. Internal transport and
    /// serialization detail is collapsed into a generic retry notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) | Self::ExternalService(_) | Self::Serialization(_) | Self::Other(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            Self::Cancelled => "Payment cancelled.".to_string(),
            Self::VerificationFailed(msg) => msg.clone(),
            Self::NotServiceable { message, .. } => message.clone(),
            Self::AlreadyInFlight => "Your order is already being placed.".to_string(),
            _ => self.to_string(),
        }
    }
}
