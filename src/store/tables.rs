//! Row types and [`ActorEntity`] implementations for the store tables.

use crate::framework::{ActorEntity, ResourceActor, ResourceClient};
use crate::model::{
    LatLong, NewOrder, NotificationSubscription, OrderId, PizzaRef, PizzaSpecial, SpecialCreate,
    SubscriptionCreate, Topping, ToppingCreate,
};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// The persisted shape of an order: ids only, no resolved menu objects.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub id: OrderId,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub delivery_location: LatLong,
    pub pizzas: Vec<PizzaRef>,
}

impl ActorEntity for OrderRow {
    type Id = OrderId;
    type CreateParams = NewOrder;

    fn from_create_params(id: OrderId, params: NewOrder) -> Result<Self, String> {
        if params.user_id.is_empty() {
            return Err("order has no owning user".to_string());
        }
        if !params.delivery_location.is_finite() {
            return Err(format!("delivery location is not a finite coordinate: {:?}", params.delivery_location));
        }
        Ok(Self {
            id,
            user_id: params.user_id,
            created_at: params.created_at,
            delivery_location: params.delivery_location,
            pizzas: params.pizzas,
        })
    }
}

impl ActorEntity for PizzaSpecial {
    type Id = u32;
    type CreateParams = SpecialCreate;

    fn from_create_params(id: u32, params: SpecialCreate) -> Result<Self, String> {
        Ok(Self {
            id,
            name: params.name,
            description: params.description,
            base_price: params.base_price,
        })
    }
}

impl ActorEntity for Topping {
    type Id = u32;
    type CreateParams = ToppingCreate;

    fn from_create_params(id: u32, params: ToppingCreate) -> Result<Self, String> {
        Ok(Self {
            id,
            name: params.name,
            price: params.price,
        })
    }
}

impl ActorEntity for NotificationSubscription {
    type Id = u32;
    type CreateParams = SubscriptionCreate;

    fn from_create_params(id: u32, params: SubscriptionCreate) -> Result<Self, String> {
        if params.endpoint.url.is_empty() {
            return Err("subscription has no endpoint url".to_string());
        }
        Ok(Self {
            id,
            user_id: params.user_id,
            endpoint: params.endpoint,
        })
    }
}

/// Creates a table actor whose ids count up from 1.
///
/// Id 0 is never assigned; placement uses it for unresolved menu references.
pub fn new_table<T>(buffer_size: usize) -> (ResourceActor<T>, ResourceClient<T>)
where
    T: ActorEntity,
    T::Id: From<u32>,
{
    let counter = Arc::new(AtomicU32::new(1));
    let next_id = move || T::Id::from(counter.fetch_add(1, Ordering::SeqCst));
    ResourceActor::new(buffer_size, next_id)
}
