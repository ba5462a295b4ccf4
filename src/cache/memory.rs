//! # In-Process Cache Actor
//!
//! One task owns the whole key space and handles requests in arrival order.
//! A multi-key set is applied inside a single message, so no reader can
//! observe half of it.

use crate::cache::{CacheError, CacheStore};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

type Reply<T> = oneshot::Sender<T>;

enum CacheRequest {
    Get {
        key: String,
        respond_to: Reply<Option<Vec<u8>>>,
    },
    Set {
        key: String,
        value: Vec<u8>,
        respond_to: Reply<()>,
    },
    SetMulti {
        entries: Vec<(String, Vec<u8>)>,
        respond_to: Reply<()>,
    },
}

/// The server half: owns the entries.
pub struct CacheActor {
    receiver: mpsc::Receiver<CacheRequest>,
    entries: HashMap<String, Vec<u8>>,
}

impl CacheActor {
    pub async fn run(mut self) {
        info!("Cache actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CacheRequest::Get { key, respond_to } => {
                    let value = self.entries.get(&key).cloned();
                    debug!(%key, hit = value.is_some(), "GET");
                    let _ = respond_to.send(value);
                }
                CacheRequest::Set { key, value, respond_to } => {
                    debug!(%key, bytes = value.len(), "SET");
                    self.entries.insert(key, value);
                    let _ = respond_to.send(());
                }
                CacheRequest::SetMulti { entries, respond_to } => {
                    debug!(keys = entries.len(), "MULTI SET");
                    self.entries.extend(entries);
                    let _ = respond_to.send(());
                }
            }
        }

        info!(size = self.entries.len(), "Cache actor shutdown");
    }
}

/// Cloneable handle to a [`CacheActor`].
#[derive(Clone)]
pub struct MemoryCache {
    sender: mpsc::Sender<CacheRequest>,
}

impl MemoryCache {
    /// Creates the actor and its handle. The actor must be spawned with `.run()`.
    pub fn new(buffer_size: usize) -> (CacheActor, MemoryCache) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = CacheActor {
            receiver,
            entries: HashMap::new(),
        };
        (actor, MemoryCache { sender })
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> CacheRequest) -> Result<T, CacheError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| CacheError::Unavailable("cache actor closed".to_string()))?;
        response
            .await
            .map_err(|_| CacheError::Unavailable("cache actor dropped response".to_string()))
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let key = key.to_string();
        self.request(|respond_to| CacheRequest::Get { key, respond_to }).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        let key = key.to_string();
        self.request(|respond_to| CacheRequest::Set { key, value, respond_to }).await
    }

    async fn set_multi_atomic(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), CacheError> {
        // A send that never reaches the actor leaves every key untouched.
        self.request(|respond_to| CacheRequest::SetMulti { entries, respond_to })
            .await
            .map_err(|e| CacheError::TransactionAborted(e.to_string()))
    }
}
