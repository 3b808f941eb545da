use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_EMI_INSTALLMENTS: u32 = 12;
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Checkout orchestration configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CheckoutConfig {
    /// Storefront backend base URL, e.g. "https://api.store.example/api/v1"
    #[validate(custom = "validate_base_url")]
    pub backend_base_url: String,

    /// Per-request timeout for backend calls (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// ISO currency code used for gateway orders
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Merchant display name shown in the payment widget
    #[serde(default = "default_merchant_name")]
    pub merchant_name: String,

    /// Widget theme color (hex)
    #[serde(default = "default_theme_color")]
    pub theme_color: String,

    /// Gateway publishable key. The backend's per-order key wins when
    /// present; placement fails hard when neither is configured.
    #[serde(default)]
    pub gateway_key_id: Option<String>,

    /// Order total at or above which the widget is offered the expanded
    /// installment/financing options
    #[serde(default = "default_high_value_threshold")]
    pub high_value_threshold: Decimal,

    /// Installment count used for the cosmetic per-month estimate
    #[serde(default = "default_emi_installment_count")]
    #[validate(custom = "validate_installment_count")]
    pub emi_installment_count: u32,

    /// Flat shipping charge when serviceability quotes none
    #[serde(default = "default_flat_shipping")]
    pub flat_shipping: Decimal,

    /// Subtotal at or above which shipping is free
    #[serde(default = "default_free_shipping_threshold")]
    pub free_shipping_threshold: Decimal,

    /// Clear referral attribution when an order completes
    #[serde(default = "default_true_bool")]
    pub clear_referral_on_completion: bool,

    /// Event channel capacity for async event processing
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,
}

impl CheckoutConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            backend_base_url: "http://localhost:8080/api/v1".to_string(),
            request_timeout_secs: default_request_timeout_secs(),
            currency: default_currency(),
            merchant_name: default_merchant_name(),
            theme_color: default_theme_color(),
            gateway_key_id: None,
            high_value_threshold: default_high_value_threshold(),
            emi_installment_count: default_emi_installment_count(),
            flat_shipping: default_flat_shipping(),
            free_shipping_threshold: default_free_shipping_threshold(),
            clear_referral_on_completion: default_true_bool(),
            event_channel_capacity: default_event_channel_capacity(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum CheckoutConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_merchant_name() -> String {
    "Storefront".to_string()
}

fn default_theme_color() -> String {
    "#0f766e".to_string()
}

fn default_high_value_threshold() -> Decimal {
    Decimal::from(50_000)
}

fn default_emi_installment_count() -> u32 {
    DEFAULT_EMI_INSTALLMENTS
}

fn default_flat_shipping() -> Decimal {
    Decimal::from(49)
}

fn default_free_shipping_threshold() -> Decimal {
    Decimal::from(499)
}

fn default_true_bool() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

fn validate_base_url(value: &str) -> Result<(), ValidationError> {
    match reqwest::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        _ => {
            let mut err = ValidationError::new("backend_base_url");
            err.message = Some("Must be a valid http(s) URL".into());
            Err(err)
        }
    }
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_installment_count(count: u32) -> Result<(), ValidationError> {
    if count == 0 {
        let mut err = ValidationError::new("emi_installment_count");
        err.message = Some("emi_installment_count must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("checkout_core={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads checkout configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (CHECKOUT__*)
pub fn load_config() -> Result<CheckoutConfig, CheckoutConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("backend_base_url", "http://localhost:8080/api/v1")?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("CHECKOUT").separator("__"))
        .build()?;

    let checkout_config: CheckoutConfig = config.try_deserialize()?;

    checkout_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        CheckoutConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(checkout_config)
}
