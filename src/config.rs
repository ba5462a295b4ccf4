//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PUSH_VAPID_PUBLIC_KEY` - Application server public key (base64url)
//! - `PUSH_VAPID_PRIVATE_KEY` - Application server private key (base64url)
//!
//! ## Optional
//! - `PUSH_VAPID_SUBJECT` - Contact URI sent with push messages (default: mailto:orders@localhost)
//! - `ORDERS_PREPARATION_SECS` - Time from placement to dispatch (default: 10)
//! - `ORDERS_DELIVERY_SECS` - Time from dispatch to delivery (default: 60)
//! - `ORDERS_ACTOR_BUFFER` - Channel capacity of every actor (default: 32)

use crate::status::DeliveryDurations;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Application server identification used when sending push messages.
///
/// Implements `Debug` manually to redact the private key.
#[derive(Clone)]
pub struct VapidKeys {
    pub subject: String,
    pub public_key: String,
    /// Signs the VAPID token of every push request. Only a transport that
    /// talks to a real push service reads it; [`TracingPushTransport`](crate::notify::TracingPushTransport)
    /// never does.
    pub private_key: SecretString,
}

impl std::fmt::Debug for VapidKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidKeys")
            .field("subject", &self.subject)
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub durations: DeliveryDurations,
    pub actor_buffer: usize,
    pub vapid: VapidKeys,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let preparation = parse_or_default(&lookup, "ORDERS_PREPARATION_SECS", 10u32)?;
        let delivery = parse_or_default(&lookup, "ORDERS_DELIVERY_SECS", 60u32)?;
        let actor_buffer = parse_or_default(&lookup, "ORDERS_ACTOR_BUFFER", 32usize)?;
        if actor_buffer == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ORDERS_ACTOR_BUFFER".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let vapid = VapidKeys {
            subject: lookup("PUSH_VAPID_SUBJECT").unwrap_or_else(|| "mailto:orders@localhost".to_string()),
            public_key: required(&lookup, "PUSH_VAPID_PUBLIC_KEY")?,
            private_key: SecretString::from(required(&lookup, "PUSH_VAPID_PRIVATE_KEY")?),
        };

        Ok(Self {
            durations: DeliveryDurations::from_secs(preparation, delivery),
            actor_buffer,
            vapid,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required, non-empty variable.
fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(key.to_string())),
    }
}

fn parse_or_default<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}
