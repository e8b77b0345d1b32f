//! End-to-end tests against live PostgreSQL and Redis.
//!
//! Run explicitly with `cargo test -- --ignored`; `DATABASE_URL` and `REDIS_URL`
//! point at the services.

use rust_decimal::Decimal;

use domain::{ARABICA_PRODUCT_SLUG, COFFEE_CATEGORY_ID};
use storefront_harness::config::Config;
use storefront_harness::infra::cache::CacheService;
use storefront_harness::infra::db::{LifecycleState, Table};
use storefront_harness::services::{ServiceContainer, Services};

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn test_postgres_session_round_trip() {
    let config = Config::from_env();
    let services = Services::from_config(&config).unwrap();

    let store = services.global_setup().await.unwrap();
    assert_eq!(store.count(Table::Categories).await.unwrap(), 2);
    assert_eq!(store.count(Table::Products).await.unwrap(), 2);
    assert_eq!(store.count(Table::Orders).await.unwrap(), 0);

    let arabica = store
        .find_product_by_slug(ARABICA_PRODUCT_SLUG)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(arabica.base_price, Decimal::new(2599, 2));
    assert_eq!(arabica.category_id, COFFEE_CATEGORY_ID);

    services.global_teardown().await;
    assert_eq!(services.lifecycle().state().await, LifecycleState::Closed);

    let store = services.global_setup().await.unwrap();
    assert_eq!(store.count(Table::Products).await.unwrap(), 2);
    services.global_teardown().await;
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_redis_round_trip() {
    let config = Config::from_env();
    let services = Services::from_config(&config).unwrap();
    let cache = services.cache();

    assert!(cache.ping().await);
    assert!(cache.is_connected());

    let client = cache.get_client().await;
    client.set_json("harness:e2e", &vec![1, 2, 3], 30).await.unwrap();
    let value: Option<Vec<i32>> = client.get_json("harness:e2e").await.unwrap();
    assert_eq!(value, Some(vec![1, 2, 3]));
    assert!(client.delete("harness:e2e").await.unwrap());

    cache.close_connection().await;
    assert!(!cache.is_connected());
}
