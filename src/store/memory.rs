use crate::framework::{ResourceActor, ResourceClient, RowFilter};
use crate::model::{
    NewOrder, NotificationSubscription, Order, OrderId, PizzaLine, PizzaSpecial, PizzaTopping,
    SpecialCreate, SubscriptionCreate, Topping, ToppingCreate,
};
use crate::store::{new_table, OrderRow, OrderStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// The table actors behind a [`MemoryStore`], not yet running.
pub struct StoreActors {
    orders: ResourceActor<OrderRow>,
    specials: ResourceActor<PizzaSpecial>,
    toppings: ResourceActor<Topping>,
    subscriptions: ResourceActor<NotificationSubscription>,
}

impl StoreActors {
    /// Spawns every table on the current runtime.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        vec![
            tokio::spawn(self.orders.run()),
            tokio::spawn(self.specials.run()),
            tokio::spawn(self.toppings.run()),
            tokio::spawn(self.subscriptions.run()),
        ]
    }
}

/// In-process [`OrderStore`] made of one table actor per record type.
#[derive(Clone)]
pub struct MemoryStore {
    orders: ResourceClient<OrderRow>,
    specials: ResourceClient<PizzaSpecial>,
    toppings: ResourceClient<Topping>,
    subscriptions: ResourceClient<NotificationSubscription>,
}

struct Menu {
    specials: HashMap<u32, PizzaSpecial>,
    toppings: HashMap<u32, Topping>,
}

impl Menu {
    fn resolve(&self, row: OrderRow) -> Order {
        let pizzas = row
            .pizzas
            .into_iter()
            .map(|pizza| PizzaLine {
                special_id: pizza.special_id,
                special: self.specials.get(&pizza.special_id).cloned(),
                toppings: pizza
                    .topping_ids
                    .into_iter()
                    .map(|topping_id| PizzaTopping {
                        topping_id,
                        topping: self.toppings.get(&topping_id).cloned(),
                    })
                    .collect(),
            })
            .collect();

        Order {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            delivery_location: row.delivery_location,
            pizzas,
        }
    }
}

impl MemoryStore {
    pub fn new(buffer_size: usize) -> (StoreActors, MemoryStore) {
        let (orders_actor, orders) = new_table(buffer_size);
        let (specials_actor, specials) = new_table(buffer_size);
        let (toppings_actor, toppings) = new_table(buffer_size);
        let (subscriptions_actor, subscriptions) = new_table(buffer_size);

        let actors = StoreActors {
            orders: orders_actor,
            specials: specials_actor,
            toppings: toppings_actor,
            subscriptions: subscriptions_actor,
        };
        let store = MemoryStore {
            orders,
            specials,
            toppings,
            subscriptions,
        };
        (actors, store)
    }

    /// Builds a store over existing table clients (e.g. scripted mocks).
    pub fn from_clients(
        orders: ResourceClient<OrderRow>,
        specials: ResourceClient<PizzaSpecial>,
        toppings: ResourceClient<Topping>,
        subscriptions: ResourceClient<NotificationSubscription>,
    ) -> Self {
        Self {
            orders,
            specials,
            toppings,
            subscriptions,
        }
    }

    /// Adds a special to the menu.
    pub async fn add_special(&self, special: SpecialCreate) -> Result<u32, StoreError> {
        Ok(self.specials.create(special).await?)
    }

    /// Adds a topping to the menu.
    pub async fn add_topping(&self, topping: ToppingCreate) -> Result<u32, StoreError> {
        Ok(self.toppings.create(topping).await?)
    }

    async fn menu(&self) -> Result<Menu, StoreError> {
        let specials = self.specials.list(None).await?;
        let toppings = self.toppings.list(None).await?;
        Ok(Menu {
            specials: specials.into_iter().map(|s| (s.id, s)).collect(),
            toppings: toppings.into_iter().map(|t| (t.id, t)).collect(),
        })
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    #[instrument(skip(self))]
    async fn list_orders(&self, user_id: Option<&str>) -> Result<Vec<Order>, StoreError> {
        let filter = user_id.map(|user| {
            let user = user.to_string();
            Box::new(move |row: &OrderRow| row.user_id == user) as RowFilter<OrderRow>
        });
        let mut rows = self.orders.list(filter).await?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let menu = self.menu().await?;
        let orders: Vec<Order> = rows.into_iter().map(|row| menu.resolve(row)).collect();
        debug!(count = orders.len(), "Loaded orders");
        Ok(orders)
    }

    #[instrument(skip(self))]
    async fn get_order(&self, id: OrderId, user_id: Option<&str>) -> Result<Order, StoreError> {
        let row = self
            .orders
            .get(id)
            .await?
            .filter(|row| user_id.map_or(true, |user| row.user_id == user))
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;

        Ok(self.menu().await?.resolve(row))
    }

    #[instrument(skip(self, order), fields(user_id = %order.user_id))]
    async fn create_order(&self, order: NewOrder) -> Result<OrderId, StoreError> {
        let id = self.orders.create(order).await?;
        info!(order_id = %id, "Order committed");
        Ok(id)
    }

    async fn find_special(&self, id: u32) -> Result<Option<PizzaSpecial>, StoreError> {
        Ok(self.specials.get(id).await?)
    }

    async fn find_topping(&self, id: u32) -> Result<Option<Topping>, StoreError> {
        Ok(self.toppings.get(id).await?)
    }

    async fn list_specials(&self) -> Result<Vec<PizzaSpecial>, StoreError> {
        let mut specials = self.specials.list(None).await?;
        specials.sort_by_key(|s| s.id);
        Ok(specials)
    }

    async fn list_toppings(&self) -> Result<Vec<Topping>, StoreError> {
        let mut toppings = self.toppings.list(None).await?;
        toppings.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(toppings)
    }

    async fn find_subscription(&self, user_id: &str) -> Result<Option<NotificationSubscription>, StoreError> {
        let user = user_id.to_string();
        let mut matches = self
            .subscriptions
            .list(Some(Box::new(move |sub: &NotificationSubscription| sub.user_id == user)))
            .await?;
        // Newest registration wins should an older one ever survive.
        matches.sort_by_key(|sub| sub.id);
        Ok(matches.pop())
    }

    #[instrument(skip(self, subscription), fields(user_id = %subscription.user_id))]
    async fn subscribe(&self, subscription: SubscriptionCreate) -> Result<NotificationSubscription, StoreError> {
        let user = subscription.user_id.clone();
        let existing = self
            .subscriptions
            .list(Some(Box::new(move |sub: &NotificationSubscription| sub.user_id == user)))
            .await?;
        for old in existing {
            self.subscriptions.delete(old.id).await?;
        }

        let id = self.subscriptions.create(subscription).await?;
        let created = self
            .subscriptions
            .get(id)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("subscription {id} vanished after insert")))?;
        info!(subscription_id = id, "Subscription registered");
        Ok(created)
    }
}
