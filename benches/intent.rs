use criterion::{Criterion, criterion_group, criterion_main};
use flow_adapters::embeddings::HashedEmbedder;
use flow_adapters::intent::{Intent, detect_intent, extract_content};
use std::hint::black_box;

const PAYLOAD: &str = r#"{
    "title": "OpenWeatherMap current weather",
    "description": "Returns the current weather for a city, including temperature and wind",
    "code": "GET /data/2.5/weather?q={city}&appid={key}",
    "language": "http",
    "tags": ["weather", "api", "rest"]
}"#;

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("detect_intent", |b| b.iter(|| detect_intent(black_box(PAYLOAD))));

    let Intent::Store(payload) = detect_intent(PAYLOAD) else {
        panic!("benchmark payload must be a JSON object");
    };
    c.bench_function("extract_content", |b| {
        b.iter(|| extract_content(black_box(&payload)))
    });

    let embedder = HashedEmbedder::new(384).expect("embedder should build");
    let content = extract_content(&payload);
    c.bench_function("hashed_embedding", |b| {
        b.iter(|| embedder.embed(black_box(&content)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
