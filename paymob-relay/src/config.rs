//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables once at startup.
//! Blank values are treated the same as unset ones.

use std::env;
use std::fmt;

use tracing::warn;

use crate::callback::HmacSecret;
use crate::paymob::PaymobClient;

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Paymob HMAC secret for callback signature verification
    pub hmac_secret: Option<HmacSecret>,

    /// Paymob merchant API key, exchanged for auth tokens
    pub api_key: Option<String>,

    /// Card payment integration id (numeric, as issued by Paymob)
    pub card_integration_id: Option<String>,

    /// Hosted iframe id used to build the payment page URL
    pub iframe_id: Option<String>,

    /// Paymob API base URL
    pub paymob_base_url: String,

    /// HTTP request timeout in milliseconds for calls to Paymob
    pub request_timeout_ms: u64,
}

/// Settings needed to start a card checkout, validated.
#[derive(Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub api_key: String,
    pub integration_id: u64,
    pub iframe_id: String,
}

/// Configuration that is missing or unusable.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0}")]
    Missing(&'static str),

    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            hmac_secret: None,
            api_key: None,
            card_integration_id: None,
            iframe_id: None,
            paymob_base_url: PaymobClient::DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_or("PORT", defaults.port),

            hmac_secret: HmacSecret::from_env_value(env::var("PAYMOB_HMAC").ok()),

            api_key: non_blank("PAYMOB_API_KEY"),

            card_integration_id: non_blank("PAYMOB_CARD_INTEGRATION_ID"),

            iframe_id: non_blank("PAYMOB_IFRAME_ID"),

            paymob_base_url: non_blank("PAYMOB_BASE").unwrap_or(defaults.paymob_base_url),

            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),
        }
    }

    /// Validate the settings used by the checkout endpoint.
    pub fn checkout(&self) -> Result<CheckoutSettings, ConfigError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or(ConfigError::Missing("PAYMOB_API_KEY"))?;

        let raw_integration_id = self
            .card_integration_id
            .as_deref()
            .ok_or(ConfigError::Missing("PAYMOB_CARD_INTEGRATION_ID"))?;

        let integration_id = raw_integration_id
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::Invalid {
                name: "PAYMOB_CARD_INTEGRATION_ID",
                reason: e.to_string(),
            })?;

        let iframe_id = self
            .iframe_id
            .clone()
            .ok_or(ConfigError::Missing("PAYMOB_IFRAME_ID"))?;

        Ok(CheckoutSettings {
            api_key,
            integration_id,
            iframe_id,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("hmac_secret_set", &self.hmac_secret.is_some())
            .field("api_key_set", &self.api_key.is_some())
            .field("card_integration_id", &self.card_integration_id)
            .field("iframe_id", &self.iframe_id)
            .field("paymob_base_url", &self.paymob_base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl fmt::Debug for CheckoutSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutSettings")
            .field("integration_id", &self.integration_id)
            .field("iframe_id", &self.iframe_id)
            .finish_non_exhaustive()
    }
}

/// Read a variable, treating blank values as unset.
fn non_blank(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a variable, falling back to `default` when unset or malformed.
fn parse_or<T: std::str::FromStr + fmt::Display + Copy>(name: &str, default: T) -> T {
    let Some(raw) = non_blank(name) else {
        return default;
    };

    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, fallback = %default, "Invalid value, using default");
            default
        }
    }
}
