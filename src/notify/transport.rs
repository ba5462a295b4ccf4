use crate::config::VapidKeys;
use crate::model::PushEndpoint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Body of every push message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub message: String,
    pub url: String,
}

/// Errors raised while handing a message to the push service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PushError {
    #[error("Push payload could not be built: {0}")]
    Payload(String),

    #[error("Push delivery failed: {0}")]
    Delivery(String),
}

/// Delivers one message to one subscribed browser.
///
/// Implementations own the application server keys and any timeout policy;
/// the scheduler adds none of its own. A transport for a real push service is
/// built from [`VapidKeys`] and signs each request with `private_key`, exposed
/// through `secrecy::ExposeSecret` only at signing time.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, endpoint: &PushEndpoint, payload: &[u8]) -> Result<(), PushError>;
}

/// Transport that records each hand-off in the log instead of calling a push service.
///
/// It holds the full [`VapidKeys`] so it can be swapped for a signing transport
/// without changing how it is constructed, but it never reads the private key.
#[derive(Debug, Clone)]
pub struct TracingPushTransport {
    vapid: VapidKeys,
}

impl TracingPushTransport {
    pub fn new(vapid: VapidKeys) -> Self {
        Self { vapid }
    }
}

#[async_trait]
impl PushTransport for TracingPushTransport {
    async fn send(&self, endpoint: &PushEndpoint, payload: &[u8]) -> Result<(), PushError> {
        let body = String::from_utf8_lossy(payload);
        info!(
            endpoint = %endpoint.url,
            vapid_subject = %self.vapid.subject,
            vapid_public_key = %self.vapid.public_key,
            %body,
            "Push message handed off"
        );
        Ok(())
    }
}
