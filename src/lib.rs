//! Checkout orchestration core.
//!
//! This crate turns a cart into a paid, serviceable order: a session-scoped
//! state machine sequences address capture, payment-method selection and
//! review; a serviceability gate, coupon ledger and price engine feed it;
//! and a payment orchestrator drives the gateway protocol (or the
//! cash-on-delivery path) under an at-most-once placement guard.
//!
//! The storefront backend and the payment widget are external collaborators
//! reached through the [`client::StorefrontClient`] and
//! [`payment::PaymentWidget`] traits.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod checkout;
pub mod client;
pub mod config;
pub mod coupons;
pub mod errors;
pub mod events;
pub mod models;
pub mod payment;
pub mod pricing;
pub mod serviceability;

pub use checkout::CheckoutSession;
pub use config::{init_tracing, load_config, CheckoutConfig};
pub use errors::{CheckoutError, FieldErrors};
pub use payment::PaymentOrchestrator;

pub mod prelude {
    pub use crate::checkout::CheckoutSession;
    pub use crate::client::{HttpStorefrontClient, StorefrontClient};
    pub use crate::config::{load_config, CheckoutConfig};
    pub use crate::coupons::CouponLedger;
    pub use crate::errors::{CheckoutError, FieldErrors};
    pub use crate::events::{Event, EventSender};
    pub use crate::models::*;
    pub use crate::payment::{
        PaymentOrchestrator, PaymentWidget, PlacementGuard, WidgetConfig, WidgetOutcome,
    };
    pub use crate::pricing::PriceBreakdown;
    pub use crate::serviceability::ServiceabilityGate;
}
