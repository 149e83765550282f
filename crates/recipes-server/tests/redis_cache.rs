//! Listing cache against a real Redis. Requires Docker; run with
//! `cargo test -- --ignored`.

use recipes_core::{RecipeDraft, RecipeId, now_utc};
use recipes_db_memory::InMemoryStorage;
use recipes_server::cache::{LISTING_KEY, create_cache_backend};
use recipes_server::config::RedisConfig;
use recipes_server::{CacheLookup, RecipeListingCache};
use recipes_storage::RecipeStorage;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::Redis;
use tokio::sync::OnceCell;

static SHARED_REDIS: OnceCell<(ContainerAsync<Redis>, String)> = OnceCell::const_new();

async fn get_redis_url() -> String {
    let (_, url) = SHARED_REDIS
        .get_or_init(|| async {
            let container = Redis::default()
                .start()
                .await
                .expect("start redis container");
            let host_port = container.get_host_port_ipv4(6379).await.expect("get port");
            let url = format!("redis://127.0.0.1:{host_port}");
            (container, url)
        })
        .await;
    url.clone()
}

fn redis_config(url: String) -> RedisConfig {
    RedisConfig {
        enabled: true,
        url,
        pool_size: 4,
        timeout_ms: 2000,
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_redis_get_set_delete() {
    let cache = create_cache_backend(&redis_config(get_redis_url().await))
        .await
        .expect("connect to redis");
    assert_eq!(cache.mode(), "redis");

    cache.delete("redis-test-key").await.unwrap();
    assert!(matches!(cache.get("redis-test-key").await, CacheLookup::Miss));

    cache
        .set("redis-test-key", b"value".to_vec())
        .await
        .unwrap();
    match cache.get("redis-test-key").await {
        CacheLookup::Hit(data) => assert_eq!(data.as_slice(), b"value"),
        other => panic!("expected hit, got {other:?}"),
    }

    cache.delete("redis-test-key").await.unwrap();
    assert!(matches!(cache.get("redis-test-key").await, CacheLookup::Miss));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_invalidation_is_visible_to_other_instances() {
    let url = get_redis_url().await;
    let first = RecipeListingCache::new(create_cache_backend(&redis_config(url.clone())).await.unwrap());
    let second = RecipeListingCache::new(create_cache_backend(&redis_config(url)).await.unwrap());
    first.invalidate().await.unwrap();

    let storage = InMemoryStorage::new();
    let tea = RecipeDraft {
        name: "Tea".into(),
        tags: vec!["drink".into()],
        ingredients: vec![],
        instructions: vec![],
    };
    storage
        .insert(&tea.clone().into_recipe(RecipeId::generate(), now_utc()))
        .await
        .unwrap();

    assert_eq!(first.listing(&storage).await.unwrap().len(), 1);
    assert!(matches!(second.backend().get(LISTING_KEY).await, CacheLookup::Hit(_)));

    storage
        .insert(&tea.into_recipe(RecipeId::generate(), now_utc()))
        .await
        .unwrap();
    second.invalidate().await.unwrap();

    assert_eq!(first.listing(&storage).await.unwrap().len(), 2);
}
