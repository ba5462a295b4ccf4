//! # Pizza Orders Demo
//!
//! Starts the [`OrderSystem`], seeds a small menu, registers a push
//! subscription, places one order and reads it back through the cache.
//!
//! Shutdown waits for the order's two push notifications, so with the default
//! durations the run takes a little over a minute. Set
//! `ORDERS_PREPARATION_SECS` / `ORDERS_DELIVERY_SECS` to shorten it.

use pizza_orders::config::AppConfig;
use pizza_orders::lifecycle::{setup_tracing, OrderSystem};
use pizza_orders::model::{LatLong, PizzaRef, PlaceOrder, PushEndpoint, SpecialCreate, ToppingCreate};
use pizza_orders::notify::TracingPushTransport;
use std::sync::Arc;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = AppConfig::from_env().map_err(|e| e.to_string())?;
    info!("Starting application with complete order system");

    let transport = Arc::new(TracingPushTransport::new(config.vapid.clone()));
    let system = OrderSystem::new(&config, transport);

    let span = tracing::info_span!("menu_seeding");
    let (special_id, topping_id) = async {
        let special_id = system
            .store
            .add_special(SpecialCreate {
                name: "Margherita".to_string(),
                description: "Tomato, mozzarella and basil".to_string(),
                base_price: 9.99,
            })
            .await
            .map_err(|e| e.to_string())?;
        let topping_id = system
            .store
            .add_topping(ToppingCreate {
                name: "Extra cheese".to_string(),
                price: 2.5,
            })
            .await
            .map_err(|e| e.to_string())?;
        Ok::<_, String>((special_id, topping_id))
    }
    .instrument(span)
    .await?;

    info!(special_id, topping_id, "Menu seeded");

    system
        .coordinator
        .subscribe(
            "alice",
            PushEndpoint {
                url: "https://push.example.com/send/alice".to_string(),
                p256dh: "demo-p256dh".to_string(),
                auth: "demo-auth".to_string(),
            },
        )
        .await
        .map_err(|e| e.to_string())?;

    let request = PlaceOrder {
        delivery_location: LatLong::new(51.5001, -0.1239),
        pizzas: vec![PizzaRef {
            special_id,
            topping_ids: vec![topping_id],
        }],
    };

    let span = tracing::info_span!("order_processing");
    let placed = async {
        info!("Placing order");
        system.coordinator.place("alice", request).await
    }
    .instrument(span)
    .await;

    match placed {
        Ok(order_id) => {
            info!(%order_id, "Order placed successfully");
            match system.coordinator.order_for_user(order_id, "alice").await {
                Ok(view) => info!(%order_id, status = %view.status.status_text, "Order read back"),
                Err(e) => error!(error = %e, "Order read back failed"),
            }
        }
        Err(e) => error!(error = %e, "Order placement failed"),
    }

    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
