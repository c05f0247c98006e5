//! Live Redis tests, gated behind `--ignored`.
//!
//! Point `REDIS_URL` at a throwaway instance and run
//! `cargo test -p sesam-store -- --ignored`.

use std::time::Duration;

use sesam_store::{KvBackend, KvConfig, RedisKv, connect_kv};

async fn setup() -> RedisKv {
    let mut config = KvConfig::default();
    if let Ok(url) = std::env::var("REDIS_URL") {
        config.url = url;
    }
    let manager = connect_kv(&config).await.unwrap();
    RedisKv::new(manager)
}

fn unique_key(tag: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("sesam-test:{tag}:{nanos}")
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn set_get_del_round_trips() {
    let kv = setup().await;
    let key = unique_key("roundtrip");

    kv.set(&key, "value", 60_000).await.unwrap();
    assert_eq!(kv.get(&key).await.unwrap().as_deref(), Some("value"));

    kv.del(&key).await.unwrap();
    kv.del(&key).await.unwrap();
    assert_eq!(kv.get(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn ttl_expires_the_key() {
    let kv = setup().await;
    let key = unique_key("ttl");

    kv.set(&key, "value", 500).await.unwrap();
    assert!(kv.get(&key).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(kv.get(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn keys_scans_the_prefix() {
    let kv = setup().await;
    let prefix = unique_key("scan");
    let key_a = format!("{prefix}:a");
    let key_b = format!("{prefix}:b");

    kv.set(&key_a, "1", 60_000).await.unwrap();
    kv.set(&key_b, "2", 60_000).await.unwrap();

    let mut keys = kv.keys(&format!("{prefix}:*")).await.unwrap();
    keys.sort();
    assert_eq!(keys, [key_a.clone(), key_b.clone()]);

    kv.del(&key_a).await.unwrap();
    kv.del(&key_b).await.unwrap();
}
