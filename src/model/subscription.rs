use serde::{Deserialize, Serialize};

/// Where and how to deliver a push message to one browser.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEndpoint {
    pub url: String,
    pub p256dh: String,
    pub auth: String,
}

// Keys stay out of logs.
impl std::fmt::Debug for PushEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushEndpoint")
            .field("url", &self.url)
            .field("p256dh", &"[REDACTED]")
            .field("auth", &"[REDACTED]")
            .finish()
    }
}

/// A user's registered push endpoint. At most one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSubscription {
    pub id: u32,
    pub user_id: String,
    pub endpoint: PushEndpoint,
}

/// Payload for registering a subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionCreate {
    pub user_id: String,
    pub endpoint: PushEndpoint,
}
