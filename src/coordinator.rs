//! # Order Cache Coordinator
//!
//! Reads are cache-aside: look up the key, return a hit exactly as stored, or
//! load from the store, stamp each order with its status at that moment, cache
//! the result and return it. Cached entries never expire, so a snapshot (and the
//! status frozen inside it) is served until a later write overwrites the key.
//!
//! Placing an order writes through:
//!
//! 1. Menu references that do not exist are zeroed.
//! 2. The order is committed to the store.
//! 3. It is read back fully resolved and stamped with its status.
//! 4. `order_{id}` and a freshly reloaded `orders_{user}` are written in one
//!    cache transaction.
//! 5. If the user has a push subscription, a notification sequence is scheduled.
//!
//! `orders_all` is never written by placement and goes stale until something
//! else repopulates it.

use crate::cache::{CacheCodec, CacheKey, CacheStore, JsonCodec};
use crate::clock::{Clock, SystemClock};
use crate::error::OrderError;
use crate::model::{
    NewOrder, NotificationSubscription, OrderId, PizzaRef, PizzaSpecial, PlaceOrder, PushEndpoint,
    SubscriptionCreate, Topping,
};
use crate::notify::{NotificationJob, NotificationScheduler};
use crate::status::{DeliveryDurations, OrderWithStatus};
use crate::store::OrderStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Entry point for order reads and placement.
///
/// Cheap to clone; every clone shares the same store, cache and scheduler.
#[derive(Clone)]
pub struct OrderCoordinator<C: CacheCodec = JsonCodec> {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn CacheStore>,
    codec: C,
    clock: Arc<dyn Clock>,
    durations: DeliveryDurations,
    scheduler: NotificationScheduler,
}

impl OrderCoordinator<JsonCodec> {
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<dyn CacheStore>, scheduler: NotificationScheduler) -> Self {
        Self {
            store,
            cache,
            codec: JsonCodec,
            clock: Arc::new(SystemClock),
            durations: DeliveryDurations::default(),
            scheduler,
        }
    }
}

impl<C: CacheCodec> OrderCoordinator<C> {
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_durations(mut self, durations: DeliveryDurations) -> Self {
        self.durations = durations;
        self
    }

    /// Replaces the value format used for every cache entry.
    pub fn with_codec<D: CacheCodec>(self, codec: D) -> OrderCoordinator<D> {
        OrderCoordinator {
            store: self.store,
            cache: self.cache,
            codec,
            clock: self.clock,
            durations: self.durations,
            scheduler: self.scheduler,
        }
    }

    /// Every order, newest first.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<OrderWithStatus>, OrderError> {
        self.read_through(CacheKey::AllOrders, self.load_orders(None)).await
    }

    /// The orders of one user, newest first.
    #[instrument(skip(self))]
    pub async fn orders_for_user(&self, user_id: &str) -> Result<Vec<OrderWithStatus>, OrderError> {
        self.read_through(CacheKey::UserOrders(user_id.to_string()), self.load_orders(Some(user_id)))
            .await
    }

    #[instrument(skip(self))]
    pub async fn order(&self, id: OrderId) -> Result<OrderWithStatus, OrderError> {
        self.read_through(CacheKey::Order(id), self.load_order(id, None)).await
    }

    /// One order, but only if it belongs to `user_id`.
    #[instrument(skip(self))]
    pub async fn order_for_user(&self, id: OrderId, user_id: &str) -> Result<OrderWithStatus, OrderError> {
        self.read_through(CacheKey::UserOrder(id, user_id.to_string()), self.load_order(id, Some(user_id)))
            .await
    }

    /// Places an order for `user_id` and returns the id the store assigned.
    ///
    /// # Errors
    ///
    /// - `OrderError::Store` if the store rejects the order (e.g. a non-finite
    ///   delivery location) or the commit fails; nothing is cached or scheduled.
    /// - `OrderError::CacheTransaction` if the order was committed but the cache
    ///   transaction failed. The order exists; no notifications are scheduled.
    #[instrument(skip(self, request), fields(pizzas = request.pizzas.len()))]
    pub async fn place(&self, user_id: &str, request: PlaceOrder) -> Result<OrderId, OrderError> {
        let mut pizzas = Vec::with_capacity(request.pizzas.len());
        for pizza in request.pizzas {
            pizzas.push(self.checked_line(pizza).await?);
        }

        let order_id = self
            .store
            .create_order(NewOrder {
                user_id: user_id.to_string(),
                created_at: self.clock.now(),
                delivery_location: request.delivery_location,
                pizzas,
            })
            .await?;
        info!(%order_id, "Order placed");

        let view = self.load_order(order_id, Some(user_id)).await?;
        let user_orders = self.load_orders(Some(user_id)).await?;
        let entries = vec![
            (CacheKey::Order(order_id).to_string(), self.codec.encode(&view)?),
            (CacheKey::UserOrders(user_id.to_string()).to_string(), self.codec.encode(&user_orders)?),
        ];

        if let Err(e) = self.cache.set_multi_atomic(entries).await {
            warn!(%order_id, error = %e, "Order stored but cache transaction failed");
            return Err(OrderError::CacheTransaction {
                order_id,
                reason: e.to_string(),
            });
        }
        debug!(%order_id, "Order views cached");

        self.schedule_notifications(order_id, user_id).await;
        Ok(order_id)
    }

    pub async fn specials(&self) -> Result<Vec<PizzaSpecial>, OrderError> {
        Ok(self.store.list_specials().await?)
    }

    /// Toppings ordered by name.
    pub async fn toppings(&self) -> Result<Vec<Topping>, OrderError> {
        Ok(self.store.list_toppings().await?)
    }

    /// Registers `endpoint` as the user's only push subscription.
    #[instrument(skip(self, endpoint))]
    pub async fn subscribe(&self, user_id: &str, endpoint: PushEndpoint) -> Result<NotificationSubscription, OrderError> {
        Ok(self
            .store
            .subscribe(SubscriptionCreate {
                user_id: user_id.to_string(),
                endpoint,
            })
            .await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn read_through<T, F>(&self, key: CacheKey, load: F) -> Result<T, OrderError>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T, OrderError>>,
    {
        let key = key.to_string();
        if let Some(bytes) = self.cache.get(&key).await? {
            debug!(%key, "Cache hit");
            return Ok(self.codec.decode(&bytes)?);
        }

        debug!(%key, "Cache miss");
        let value = load.await?;
        self.cache.set(&key, self.codec.encode(&value)?).await?;
        Ok(value)
    }

    async fn load_order(&self, id: OrderId, user_id: Option<&str>) -> Result<OrderWithStatus, OrderError> {
        let order = self.store.get_order(id, user_id).await?;
        Ok(OrderWithStatus::from_order(order, self.clock.now(), &self.durations))
    }

    async fn load_orders(&self, user_id: Option<&str>) -> Result<Vec<OrderWithStatus>, OrderError> {
        let orders = self.store.list_orders(user_id).await?;
        let now = self.clock.now();
        Ok(orders
            .into_iter()
            .map(|order| OrderWithStatus::from_order(order, now, &self.durations))
            .collect())
    }

    /// Keeps only references that exist in the store; unknown ids become 0.
    async fn checked_line(&self, pizza: PizzaRef) -> Result<PizzaRef, OrderError> {
        let special_id = match self.store.find_special(pizza.special_id).await? {
            Some(special) => special.id,
            None => {
                debug!(special_id = pizza.special_id, "Unknown special zeroed");
                0
            }
        };

        let mut topping_ids = Vec::with_capacity(pizza.topping_ids.len());
        for topping_id in pizza.topping_ids {
            match self.store.find_topping(topping_id).await? {
                Some(topping) => topping_ids.push(topping.id),
                None => {
                    debug!(topping_id, "Unknown topping zeroed");
                    topping_ids.push(0);
                }
            }
        }

        Ok(PizzaRef { special_id, topping_ids })
    }

    async fn schedule_notifications(&self, order_id: OrderId, user_id: &str) {
        let subscription = match self.store.find_subscription(user_id).await {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                debug!(%order_id, "No push subscription; nothing scheduled");
                return;
            }
            Err(e) => {
                warn!(%order_id, error = %e, "Subscription lookup failed; nothing scheduled");
                return;
            }
        };

        match self.scheduler.schedule(NotificationJob { order_id, subscription }) {
            Ok(()) => debug!(%order_id, in_flight = self.scheduler.in_flight(), "Notifications handed off"),
            Err(e) => warn!(%order_id, error = %e, "Notifications not scheduled"),
        }
    }
}
