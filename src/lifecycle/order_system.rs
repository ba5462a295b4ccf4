use crate::cache::MemoryCache;
use crate::config::AppConfig;
use crate::coordinator::OrderCoordinator;
use crate::notify::{NotificationScheduler, PushTransport};
use crate::store::MemoryStore;
use std::sync::Arc;
use tracing::{error, info};

/// The running order backend: store tables, cache, notification supervisor and
/// the coordinator wired on top of them.
///
/// # Architecture
///
/// - **Store tables**: one actor each for orders, specials, toppings and subscriptions
/// - **Cache actor**: owns the key space
/// - **Notification supervisor**: owns every delayed notification sequence
///
/// # Example
///
/// ```ignore
/// let config = AppConfig::from_env()?;
/// let transport = Arc::new(TracingPushTransport::new(config.vapid.clone()));
/// let system = OrderSystem::new(&config, transport);
///
/// let id = system.coordinator.place("alice", request).await?;
/// let view = system.coordinator.order(id).await?;
///
/// system.shutdown().await?;
/// ```
pub struct OrderSystem {
    pub coordinator: OrderCoordinator,

    /// Direct store access, used for seeding the menu.
    pub store: MemoryStore,

    pub scheduler: NotificationScheduler,

    /// Task handles for every actor and the supervisor (joined on shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl OrderSystem {
    /// Spawns every actor on the current runtime and wires the coordinator.
    pub fn new(config: &AppConfig, transport: Arc<dyn PushTransport>) -> Self {
        let (store_actors, store) = MemoryStore::new(config.actor_buffer);
        let (cache_actor, cache) = MemoryCache::new(config.actor_buffer);
        let (supervisor, scheduler) = NotificationScheduler::new(transport, config.durations);

        let mut handles = store_actors.spawn();
        handles.push(tokio::spawn(cache_actor.run()));
        handles.push(tokio::spawn(supervisor.run()));

        let coordinator = OrderCoordinator::new(Arc::new(store.clone()), Arc::new(cache), scheduler.clone())
            .with_durations(config.durations);

        info!(
            preparation_secs = config.durations.preparation().num_seconds(),
            delivery_secs = config.durations.delivery().num_seconds(),
            "Order system started"
        );

        Self {
            coordinator,
            store,
            scheduler,
            handles,
        }
    }

    /// Shuts the system down.
    ///
    /// Dropping the handles closes every channel. Actors exit their loops once
    /// their channel is empty, and the supervisor first waits for the
    /// notification sequences still in flight, so this can take up to one full
    /// preparation plus delivery period.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if every task finished cleanly
    /// - `Err(String)` if any task panicked
    pub async fn shutdown(self) -> Result<(), String> {
        info!(in_flight = self.scheduler.in_flight(), "Shutting down system...");

        drop(self.coordinator);
        drop(self.store);
        drop(self.scheduler);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Task failed: {:?}", e);
                return Err(format!("Task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
