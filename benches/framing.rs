//! Line framing benchmark suite.
//!
//! Measures the per-line cost of both bridge directions:
//! - Parsing an inbound line into a packet
//! - Serializing a delivered event into an outbound line
//! - Encoding the Socket.IO frame for an emit
//!
//! Run with: cargo bench --bench framing
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use packet_bridge::Packet;
use packet_bridge::protocol::{EnginePacket, SocketPacket};
use serde_json::{Value, json};

// ============================================================================
// Benchmark Parameters
// ============================================================================

/// Board edge lengths used to scale the payload.
const BOARD_SIZES: &[usize] = &[3, 15, 60];

fn board(size: usize) -> Value {
    let rows: Vec<Value> = (0..size)
        .map(|y| (0..size).map(|x| json!((x * y) % 4)).collect())
        .collect();
    json!({ "map": rows, "turn": 12, "cool_score": 3, "hot_score": 5 })
}

// ============================================================================
// Benchmark: Inbound Parse
// ============================================================================

fn bench_parse_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_line");

    for &size in BOARD_SIZES {
        let line = Packet::new("move", board(size))
            .to_line()
            .expect("serializable");
        let line = line.trim_end().to_string();

        group.bench_with_input(BenchmarkId::from_parameter(size), &line, |b, line| {
            b.iter(|| Packet::from_line(black_box(line)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Outbound Serialize
// ============================================================================

fn bench_to_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_line");

    for &size in BOARD_SIZES {
        let packet = Packet::new("updata_board", board(size));

        group.bench_with_input(BenchmarkId::from_parameter(size), &packet, |b, packet| {
            b.iter(|| black_box(packet).to_line());
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Emit Frame
// ============================================================================

fn bench_emit_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_frame");

    for &size in BOARD_SIZES {
        let payload = board(size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| {
                let packet = SocketPacket::event("/", "put", black_box(payload).clone());
                let body = packet.encode().ok();
                body.map(|body| EnginePacket::Message(body).encode())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_line, bench_to_line, bench_emit_frame);
criterion_main!(benches);
