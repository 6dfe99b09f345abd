use super::*;

#[tokio::test]
async fn memory_store_returns_value() -> Result<()> {
    let store = MemoryKeyValue::with_entries([("openweathermap.org", "Weather API knowledge")]);

    assert_eq!(
        store.get("openweathermap.org").await?,
        Some("Weather API knowledge".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn memory_store_absent_key_is_none() -> Result<()> {
    let store = MemoryKeyValue::new();
    assert_eq!(store.get("missing").await?, None);
    Ok(())
}

#[tokio::test]
async fn memory_store_insert_overwrites() -> Result<()> {
    let store = MemoryKeyValue::new();
    store.insert("k", "first")?;
    store.insert("k", "second")?;
    assert_eq!(store.get("k").await?, Some("second".to_string()));
    Ok(())
}

#[test]
fn redis_backend_builds_from_config() {
    let config = RedisConfig {
        password: Some("secret".to_string()),
        ..RedisConfig::default()
    };
    assert!(RedisKeyValue::new(&config).is_ok());
}

#[tokio::test]
async fn unreachable_redis_is_connection_failure() {
    let config = RedisConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..RedisConfig::default()
    };
    let store = RedisKeyValue::new(&config).expect("client should build");

    let result = store.get("anything").await;
    assert!(matches!(result, Err(AdapterError::Connection(_))));
}
