#![allow(dead_code)]

use async_trait::async_trait;
use pizza_orders::cache::{CacheError, CacheStore, MemoryCache};
use pizza_orders::clock::Clock;
use pizza_orders::coordinator::OrderCoordinator;
use pizza_orders::model::{
    LatLong, NewOrder, NotificationSubscription, Order, OrderId, PizzaRef, PizzaSpecial, PlaceOrder,
    PushEndpoint, SpecialCreate, SubscriptionCreate, Topping, ToppingCreate,
};
use pizza_orders::notify::{NotificationScheduler, PushError, PushPayload, PushTransport};
use pizza_orders::status::DeliveryDurations;
use pizza_orders::store::{MemoryStore, OrderStore, StoreError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Store wrapper that counts every gateway call.
pub struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    get_scopes: Mutex<Vec<Option<String>>>,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            get_scopes: Mutex::new(Vec::new()),
        }
    }

    /// The user scope of every `get_order` call so far.
    pub fn get_scopes(&self) -> Vec<Option<String>> {
        self.get_scopes.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderStore for CountingStore {
    async fn list_orders(&self, user_id: Option<&str>) -> Result<Vec<Order>, StoreError> {
        self.hit();
        self.inner.list_orders(user_id).await
    }

    async fn get_order(&self, id: OrderId, user_id: Option<&str>) -> Result<Order, StoreError> {
        self.hit();
        self.get_scopes.lock().unwrap().push(user_id.map(str::to_string));
        self.inner.get_order(id, user_id).await
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderId, StoreError> {
        self.hit();
        self.inner.create_order(order).await
    }

    async fn find_special(&self, id: u32) -> Result<Option<PizzaSpecial>, StoreError> {
        self.hit();
        self.inner.find_special(id).await
    }

    async fn find_topping(&self, id: u32) -> Result<Option<Topping>, StoreError> {
        self.hit();
        self.inner.find_topping(id).await
    }

    async fn list_specials(&self) -> Result<Vec<PizzaSpecial>, StoreError> {
        self.hit();
        self.inner.list_specials().await
    }

    async fn list_toppings(&self) -> Result<Vec<Topping>, StoreError> {
        self.hit();
        self.inner.list_toppings().await
    }

    async fn find_subscription(&self, user_id: &str) -> Result<Option<NotificationSubscription>, StoreError> {
        self.hit();
        self.inner.find_subscription(user_id).await
    }

    async fn subscribe(&self, subscription: SubscriptionCreate) -> Result<NotificationSubscription, StoreError> {
        self.hit();
        self.inner.subscribe(subscription).await
    }
}

/// Cache whose multi-key transactions always abort. Plain get/set still work.
pub struct AbortingCache {
    pub inner: MemoryCache,
}

#[async_trait]
impl CacheStore for AbortingCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.inner.set(key, value).await
    }

    async fn set_multi_atomic(&self, _entries: Vec<(String, Vec<u8>)>) -> Result<(), CacheError> {
        Err(CacheError::TransactionAborted("EXEC returned nil".to_string()))
    }
}

/// Cache wrapper that counts writes.
pub struct CountingCache {
    inner: Arc<dyn CacheStore>,
    sets: AtomicUsize,
    multi_sets: AtomicUsize,
}

impl CountingCache {
    pub fn new(inner: Arc<dyn CacheStore>) -> Self {
        Self {
            inner,
            sets: AtomicUsize::new(0),
            multi_sets: AtomicUsize::new(0),
        }
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn multi_sets(&self) -> usize {
        self.multi_sets.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.sets.store(0, Ordering::SeqCst);
        self.multi_sets.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for CountingCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn set_multi_atomic(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), CacheError> {
        self.multi_sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set_multi_atomic(entries).await
    }
}

/// Transport that records what it was given and when.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(tokio::time::Instant, String, PushPayload)>>,
    fail_first: AtomicBool,
}

impl RecordingTransport {
    /// The first send returns an error; later ones succeed.
    pub fn failing_first() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_first: AtomicBool::new(true),
        }
    }

    pub fn sent(&self) -> Vec<(tokio::time::Instant, String, PushPayload)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn send(&self, endpoint: &PushEndpoint, payload: &[u8]) -> Result<(), PushError> {
        let payload: PushPayload = serde_json::from_slice(payload).unwrap();
        self.sent
            .lock()
            .unwrap()
            .push((tokio::time::Instant::now(), endpoint.url.clone(), payload));
        if self.fail_first.swap(false, Ordering::SeqCst) {
            return Err(PushError::Delivery("410 Gone".to_string()));
        }
        Ok(())
    }
}

/// A coordinator over fresh in-memory actors.
pub struct Harness {
    pub coordinator: OrderCoordinator,
    pub store: Arc<CountingStore>,
    pub memory: MemoryStore,
    pub cache: MemoryCache,
    pub cache_writes: Arc<CountingCache>,
    pub scheduler: NotificationScheduler,
    pub transport: Arc<RecordingTransport>,
}

pub struct HarnessBuilder {
    durations: DeliveryDurations,
    transport: Arc<RecordingTransport>,
    clock: Option<Arc<dyn Clock>>,
    aborting_cache: bool,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            durations: DeliveryDurations::from_secs(10, 60),
            transport: Arc::new(RecordingTransport::default()),
            clock: None,
            aborting_cache: false,
        }
    }

    pub fn durations(mut self, durations: DeliveryDurations) -> Self {
        self.durations = durations;
        self
    }

    pub fn transport(mut self, transport: RecordingTransport) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn aborting_cache(mut self) -> Self {
        self.aborting_cache = true;
        self
    }

    pub fn build(self) -> Harness {
        let (actors, memory) = MemoryStore::new(16);
        actors.spawn();
        let (cache_actor, cache) = MemoryCache::new(16);
        tokio::spawn(cache_actor.run());
        let (supervisor, scheduler) = NotificationScheduler::new(self.transport.clone(), self.durations);
        tokio::spawn(supervisor.run());

        let store = Arc::new(CountingStore::new(memory.clone()));
        let cache_store: Arc<dyn CacheStore> = if self.aborting_cache {
            Arc::new(AbortingCache { inner: cache.clone() })
        } else {
            Arc::new(cache.clone())
        };
        let cache_writes = Arc::new(CountingCache::new(cache_store));

        let mut coordinator = OrderCoordinator::new(store.clone(), cache_writes.clone(), scheduler.clone())
            .with_durations(self.durations);
        if let Some(clock) = self.clock {
            coordinator = coordinator.with_clock(clock);
        }

        Harness {
            coordinator,
            store,
            memory,
            cache,
            cache_writes,
            scheduler,
            transport: self.transport,
        }
    }
}

impl Harness {
    pub fn new() -> Self {
        HarnessBuilder::new().build()
    }

    /// Seeds one special and one topping, returning their ids.
    pub async fn seed_menu(&self) -> (u32, u32) {
        let special = self
            .memory
            .add_special(SpecialCreate {
                name: "Margherita".to_string(),
                description: "Tomato and mozzarella".to_string(),
                base_price: 9.99,
            })
            .await
            .unwrap();
        let topping = self
            .memory
            .add_topping(ToppingCreate {
                name: "Basil".to_string(),
                price: 0.5,
            })
            .await
            .unwrap();
        (special, topping)
    }

    pub async fn subscribe(&self, user_id: &str) {
        self.coordinator.subscribe(user_id, endpoint(user_id)).await.unwrap();
    }
}

pub fn endpoint(user_id: &str) -> PushEndpoint {
    PushEndpoint {
        url: format!("https://push.example.com/{user_id}"),
        p256dh: "p256dh-key".to_string(),
        auth: "auth-secret".to_string(),
    }
}

pub fn request(pizzas: Vec<PizzaRef>) -> PlaceOrder {
    PlaceOrder {
        delivery_location: LatLong::new(51.5001, -0.1239),
        pizzas,
    }
}
