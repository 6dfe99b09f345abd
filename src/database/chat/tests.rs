use super::*;

#[test]
fn entries_use_langchain_layout() -> Result<()> {
    let encoded = encode_entry(&ChatMessage::user("hi there"))?;
    let value: serde_json::Value =
        serde_json::from_str(&encoded).expect("encoded entry should be JSON");

    assert_eq!(value["type"], "human");
    assert_eq!(value["data"]["content"], "hi there");
    Ok(())
}

#[test]
fn ai_entries_round_trip_sender() -> Result<()> {
    let encoded = encode_entry(&ChatMessage::ai("hello"))?;
    assert_eq!(decode_entry(&encoded), Some(ChatMessage::ai("hello")));
    Ok(())
}

#[test]
fn unreadable_entries_are_skipped() {
    assert_eq!(decode_entry("not json"), None);
    assert_eq!(decode_entry(r#"{"type": "system", "data": {"content": "x"}}"#), None);
}

#[test]
fn session_keys_are_prefixed() {
    assert_eq!(session_key("abc"), "message_store:abc");
}

#[test]
fn sender_labels() {
    assert_eq!(Sender::User.label(), "User");
    assert_eq!(Sender::Ai.to_string(), "AI");
}

#[tokio::test]
async fn memory_history_is_chronological() -> Result<()> {
    let store = MemoryChatHistory::new();
    store.append("s1", &ChatMessage::user("question")).await?;
    store.append("s1", &ChatMessage::ai("answer")).await?;
    store.append("s2", &ChatMessage::user("other session")).await?;

    let history = store.history("s1").await?;
    assert_eq!(
        history,
        vec![ChatMessage::user("question"), ChatMessage::ai("answer")]
    );
    Ok(())
}

#[tokio::test]
async fn unknown_session_is_empty() -> Result<()> {
    let store = MemoryChatHistory::new();
    assert!(store.history("nobody").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn raw_entries_from_other_writers_are_read() -> Result<()> {
    let store = MemoryChatHistory::new();
    store.push_raw("s", r#"{"type": "human", "data": {"content": "from python", "extra": 1}}"#)?;
    store.push_raw("s", "garbage")?;

    assert_eq!(
        store.history("s").await?,
        vec![ChatMessage::user("from python")]
    );
    Ok(())
}

#[tokio::test]
async fn unreachable_redis_is_connection_failure() {
    let config = RedisConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..RedisConfig::default()
    };
    let store = RedisChatHistory::new(&config).expect("client should build");

    assert!(matches!(
        store.history("s").await,
        Err(AdapterError::Connection(_))
    ));
    assert!(matches!(
        store.append("s", &ChatMessage::user("x")).await,
        Err(AdapterError::Connection(_))
    ));
}
