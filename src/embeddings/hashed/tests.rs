use super::*;

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn zero_dimension_is_rejected() {
    assert!(matches!(
        HashedEmbedder::new(0),
        Err(AdapterError::Config(_))
    ));
}

#[test]
fn vectors_have_configured_dimension() {
    let embedder = HashedEmbedder::new(64).expect("embedder should build");
    assert_eq!(embedder.embed("hello world").len(), 64);
    assert_eq!(embedder.embed("").len(), 64);
    assert_eq!(embedder.model_name(), "hashed-64d");
}

#[test]
fn embedding_is_deterministic() {
    let embedder = HashedEmbedder::new(128).expect("embedder should build");
    assert_eq!(embedder.embed("redis connection"), embedder.embed("redis connection"));
}

#[test]
fn case_and_punctuation_are_ignored() {
    let embedder = HashedEmbedder::new(128).expect("embedder should build");
    assert_eq!(embedder.embed("Weather API!"), embedder.embed("weather, api"));
}

#[test]
fn non_empty_vectors_are_unit_length() {
    let embedder = HashedEmbedder::new(32).expect("embedder should build");
    let vector = embedder.embed("some text to embed");
    let norm = cosine(&vector, &vector).sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
}

#[test]
fn shared_vocabulary_is_closer() {
    let embedder = HashedEmbedder::new(256).expect("embedder should build");
    let query = embedder.embed("python code examples");
    let related = embedder.embed("Title: python examples | Code: print(1)");
    let unrelated = embedder.embed("weather forecast for tomorrow");

    assert!(cosine(&query, &related) > cosine(&query, &unrelated));
}

#[test]
fn provider_trait_matches_direct_embedding() {
    let embedder = HashedEmbedder::new(16).expect("embedder should build");
    let texts = vec!["alpha".to_string(), "beta".to_string()];
    let batch = embedder.embed_documents(&texts).expect("batch should embed");

    assert_eq!(batch[0], embedder.embed("alpha"));
    assert_eq!(
        embedder.embed_query("beta").expect("query should embed"),
        batch[1]
    );
}
