//! Codec benchmarks for roomcast-protocol.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use roomcast_protocol::{codec, PublishRequest, RoomMessage, ServerEvent};

fn bench_encode_message(c: &mut Criterion) {
    let event = ServerEvent::PublishEvent(RoomMessage {
        user_name: "Alice".to_string(),
        content: "x".repeat(64),
        room_id: "team-a".to_string(),
        timestamp: 1_700_000_000_000,
        extra: serde_json::Map::new(),
    });

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(64));
    group.bench_function("publish_64B", |b| b.iter(|| codec::encode(black_box(&event))));
    group.finish();
}

fn bench_decode_message(c: &mut Criterion) {
    let frame = codec::encode_client(&roomcast_protocol::ClientEvent::Publish(PublishRequest {
        user_name: "Alice".to_string(),
        content: "x".repeat(64),
        extra: serde_json::Map::new(),
    }))
    .unwrap();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("publish_64B", |b| b.iter(|| codec::decode(black_box(&frame))));
    group.finish();
}

fn bench_roundtrip(c: &mut Criterion) {
    let frame = r#"{"event": "joinRoom", "data": {"roomId": "team-a", "userName": "Alice"}}"#;

    c.bench_function("roundtrip_join", |b| {
        b.iter(|| codec::decode(black_box(frame)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_encode_message,
    bench_decode_message,
    bench_roundtrip
);
criterion_main!(benches);
