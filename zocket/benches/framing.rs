//! Framing benchmarks over the inproc engine
//!
//! Measures the cost the socket layer adds per frame: scratch buffers,
//! flag validation, handle checks and multipart assembly.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;
use zocket::prelude::*;

const MESSAGE_SIZES: &[usize] = &[64, 1024, 16 * 1024];
const PARTS: usize = 4;

fn connected_pair(ctx: &Context, endpoint: &str) -> (Socket, Socket) {
    let server = ctx.socket(SocketType::Pair).unwrap();
    let client = ctx.socket(SocketType::Pair).unwrap();
    server.bind(endpoint).unwrap();
    client.connect(endpoint).unwrap();
    (server, client)
}

/// Single-frame send + receive
fn single_frame(c: &mut Criterion) {
    zocket::dev_tracing::init_tracing();

    let mut group = c.benchmark_group("framing/single");
    group.measurement_time(Duration::from_secs(5));

    let ctx = Context::new();
    let (server, client) = connected_pair(&ctx, "inproc://bench-single");

    for &size in MESSAGE_SIZES {
        let payload = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            BenchmarkId::new("round_trip", format!("{size}B")),
            &size,
            |b, &size| {
                b.iter(|| {
                    client.send(black_box(&payload), false).unwrap();
                    black_box(server.recv(size, Flags::NONE).unwrap());
                });
            },
        );
    }
    group.finish();
}

/// Multipart send + receive
fn multipart(c: &mut Criterion) {
    let mut group = c.benchmark_group("framing/multipart");
    group.measurement_time(Duration::from_secs(5));

    let ctx = Context::new();
    let (server, client) = connected_pair(&ctx, "inproc://bench-multipart");

    for &size in MESSAGE_SIZES {
        let parts: Vec<Vec<u8>> = (0..PARTS).map(|_| vec![0u8; size]).collect();
        group.throughput(Throughput::Bytes((size * PARTS) as u64));
        group.bench_with_input(
            BenchmarkId::new("round_trip", format!("{PARTS}x{size}B")),
            &size,
            |b, _| {
                b.iter(|| {
                    client.send_multipart(black_box(&parts)).unwrap();
                    black_box(server.recv_multipart(Flags::NONE).unwrap());
                });
            },
        );
    }
    group.finish();
}

/// Typed option read/write
fn options(c: &mut Criterion) {
    let ctx = Context::new();
    let socket = ctx.socket(SocketType::Dealer).unwrap();

    c.bench_function("options/linger_set_get", |b| {
        b.iter(|| {
            socket.set_linger(black_box(100)).unwrap();
            black_box(socket.linger().unwrap());
        });
    });
}

criterion_group!(benches, single_frame, multipart, options);
criterion_main!(benches);
