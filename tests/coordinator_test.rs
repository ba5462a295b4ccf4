mod common;

use chrono::{TimeDelta, TimeZone, Utc};
use common::{request, Harness, HarnessBuilder};
use pizza_orders::cache::{CacheCodec, CacheStore, JsonCodec};
use pizza_orders::clock::ManualClock;
use pizza_orders::error::OrderError;
use pizza_orders::model::{LatLong, NewOrder, OrderId, PizzaRef};
use pizza_orders::status::{DeliveryPhase, OrderWithStatus};
use pizza_orders::store::OrderStore;
use std::sync::Arc;

/// A cache miss loads from the store once; the next read is served from the
/// cache with exactly the bytes that were written.
#[tokio::test]
async fn test_cache_aside_read_is_idempotent() {
    let harness = Harness::new();
    let id = harness
        .memory
        .create_order(NewOrder {
            user_id: "alice".to_string(),
            created_at: Utc::now(),
            delivery_location: LatLong::new(51.5, -0.12),
            pizzas: vec![],
        })
        .await
        .unwrap();

    let first = harness.coordinator.order(id).await.unwrap();
    assert_eq!(harness.store.calls(), 1, "miss should load once from the store");
    assert_eq!(harness.cache_writes.sets(), 1, "miss should populate the cache once");

    let second = harness.coordinator.order(id).await.unwrap();
    assert_eq!(harness.store.calls(), 1, "hit must not touch the store");
    assert_eq!(harness.cache_writes.sets(), 1, "hit must not rewrite the cache");
    assert_eq!(first, second);

    let cached = harness.cache.get(&format!("order_{id}")).await.unwrap().unwrap();
    assert_eq!(JsonCodec.encode(&second).unwrap(), cached);
}

#[tokio::test]
async fn test_place_writes_through_both_views() {
    let harness = Harness::new();
    let (special, topping) = harness.seed_menu().await;

    let id = harness
        .coordinator
        .place("alice", request(vec![PizzaRef { special_id: special, topping_ids: vec![topping] }]))
        .await
        .unwrap();

    assert_eq!(harness.cache_writes.multi_sets(), 1);
    assert_eq!(harness.cache_writes.sets(), 0);
    assert_eq!(harness.store.get_scopes(), vec![Some("alice".to_string())], "reload is scoped to the caller");

    harness.store.reset();
    harness.cache_writes.reset();
    let view = harness.coordinator.order(id).await.unwrap();
    let mine = harness.coordinator.orders_for_user("alice").await.unwrap();
    assert_eq!(harness.store.calls(), 0, "both reads should come from the cache");
    assert_eq!(harness.cache_writes.sets(), 0);

    assert_eq!(view.order.id, id);
    assert_eq!(view.order.pizzas[0].special.as_ref().unwrap().name, "Margherita");
    assert_eq!(view.order.pizzas[0].toppings[0].topping.as_ref().unwrap().name, "Basil");
    assert_eq!(mine.iter().map(|v| v.order.id).collect::<Vec<_>>(), vec![id]);
}

#[tokio::test]
async fn test_user_list_is_reloaded_not_appended() {
    let harness = Harness::new();

    let first = harness.coordinator.place("alice", request(vec![])).await.unwrap();
    // An order written behind the coordinator's back shows up on the next placement.
    let side = harness
        .memory
        .create_order(NewOrder {
            user_id: "alice".to_string(),
            created_at: Utc::now() - TimeDelta::seconds(5),
            delivery_location: LatLong::new(0.0, 0.0),
            pizzas: vec![],
        })
        .await
        .unwrap();
    let second = harness.coordinator.place("alice", request(vec![])).await.unwrap();

    let mut ids: Vec<OrderId> = harness
        .coordinator
        .orders_for_user("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.order.id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec![first, side, second]);
}

#[tokio::test]
async fn test_global_list_stays_stale_after_place() {
    let harness = Harness::new();

    let before = harness.coordinator.all_orders().await.unwrap();
    assert!(before.is_empty());

    harness.coordinator.place("alice", request(vec![])).await.unwrap();

    let after = harness.coordinator.all_orders().await.unwrap();
    assert!(after.is_empty(), "orders_all keeps the pre-write snapshot");
    assert_eq!(harness.memory.list_orders(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cache_transaction_failure_is_distinguishable() {
    let harness = HarnessBuilder::new().aborting_cache().build();
    harness.subscribe("alice").await;

    let err = harness.coordinator.place("alice", request(vec![])).await.unwrap_err();

    let OrderError::CacheTransaction { order_id, .. } = err else {
        panic!("expected a cache transaction failure, got {err:?}");
    };
    let stored = harness.memory.get_order(order_id, None).await.unwrap();
    assert_eq!(stored.user_id, "alice");
    assert_eq!(harness.cache.get(&format!("order_{order_id}")).await.unwrap(), None);

    // The caller was told it failed, so nothing is announced.
    assert_eq!(harness.scheduler.in_flight(), 0);
    assert!(harness.scheduler.drain().await.unwrap().is_empty());
    assert!(harness.transport.sent().is_empty());
}

#[tokio::test]
async fn test_user_scoped_read_of_foreign_order_is_not_found() {
    let harness = Harness::new();
    let id = harness.coordinator.place("alice", request(vec![])).await.unwrap();

    let err = harness.coordinator.order_for_user(id, "mallory").await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));
    assert_eq!(harness.cache.get(&format!("order_{id}_mallory")).await.unwrap(), None);

    assert_eq!(harness.coordinator.order_for_user(id, "alice").await.unwrap().order.id, id);
    assert!(matches!(
        harness.coordinator.order(OrderId(999)).await,
        Err(OrderError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_unknown_menu_ids_are_zeroed() {
    let harness = Harness::new();
    let (special, topping) = harness.seed_menu().await;

    let id = harness
        .coordinator
        .place(
            "alice",
            request(vec![
                PizzaRef { special_id: 77, topping_ids: vec![topping, 88] },
                PizzaRef { special_id: special, topping_ids: vec![] },
            ]),
        )
        .await
        .unwrap();

    let order = harness.memory.get_order(id, None).await.unwrap();
    assert_eq!(order.pizzas[0].special_id, 0);
    assert_eq!(order.pizzas[0].special, None);
    assert_eq!(
        order.pizzas[0].toppings.iter().map(|t| t.topping_id).collect::<Vec<_>>(),
        vec![topping, 0]
    );
    assert_eq!(order.pizzas[1].special_id, special);
}

/// A cached view keeps the status it was written with; a key populated later
/// reflects the later moment.
#[tokio::test]
async fn test_cached_status_is_frozen() {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let harness = HarnessBuilder::new().clock(clock.clone()).build();

    let id = harness.coordinator.place("alice", request(vec![])).await.unwrap();
    clock.advance(TimeDelta::seconds(100));

    let cached: OrderWithStatus = harness.coordinator.order(id).await.unwrap();
    assert_eq!(cached.status.phase, DeliveryPhase::Preparing);
    assert_eq!(cached.status.dispatch_time, start + TimeDelta::seconds(10));

    let fresh = harness.coordinator.order_for_user(id, "alice").await.unwrap();
    assert_eq!(fresh.status.phase, DeliveryPhase::Delivered);
    assert_eq!(fresh.status.estimated_delivery_time, start + TimeDelta::seconds(70));
}

#[tokio::test]
async fn test_menu_and_subscription_pass_through() {
    let harness = Harness::new();
    harness.seed_menu().await;

    assert_eq!(harness.coordinator.specials().await.unwrap().len(), 1);
    assert_eq!(harness.coordinator.toppings().await.unwrap()[0].name, "Basil");

    let sub = harness.coordinator.subscribe("alice", common::endpoint("alice")).await.unwrap();
    assert_eq!(sub.user_id, "alice");
    assert_eq!(
        harness.memory.find_subscription("alice").await.unwrap().unwrap().endpoint.url,
        "https://push.example.com/alice"
    );
}

#[tokio::test]
async fn test_aborted_transaction_leaves_existing_entries() {
    let harness = HarnessBuilder::new().aborting_cache().build();

    let before = harness.coordinator.orders_for_user("alice").await.unwrap();
    assert!(before.is_empty());
    let cached_before = harness.cache.get("orders_alice").await.unwrap().unwrap();

    let err = harness.coordinator.place("alice", request(vec![])).await.unwrap_err();
    assert!(matches!(err, OrderError::CacheTransaction { .. }));

    assert_eq!(harness.cache.get("orders_alice").await.unwrap().unwrap(), cached_before);
    assert!(harness.coordinator.orders_for_user("alice").await.unwrap().is_empty());
    assert_eq!(harness.memory.list_orders(Some("alice")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_finite_location_is_rejected_before_caching() {
    let harness = Harness::new();

    for at in [LatLong::new(f64::NAN, 0.0), LatLong::new(0.0, f64::INFINITY)] {
        let mut bad = request(vec![]);
        bad.delivery_location = at;
        let err = harness.coordinator.place("alice", bad).await.unwrap_err();
        assert!(matches!(err, OrderError::Store(_)), "{err:?}");
    }

    assert_eq!(harness.cache_writes.multi_sets(), 0);
    assert!(harness.memory.list_orders(None).await.unwrap().is_empty());
    assert!(harness.scheduler.drain().await.unwrap().is_empty());

    // The user's list still reads and decodes.
    assert!(harness.coordinator.orders_for_user("alice").await.unwrap().is_empty());
    let id = harness.coordinator.place("alice", request(vec![])).await.unwrap();
    assert_eq!(harness.coordinator.order(id).await.unwrap().order.id, id);
}
