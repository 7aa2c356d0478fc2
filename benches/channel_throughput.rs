// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use swmr_shm_channel::{ChannelConfig, DaemonHandle, ShellHandle};

fn bench_publish_read(c: &mut Criterion) {
    let name = format!("swmr_bench_publish_{}", std::process::id());
    let daemon = DaemonHandle::create(&name, ChannelConfig::default()).unwrap();
    let shell = ShellHandle::connect(&name).unwrap();

    let payload = vec![0xABu8; 256];
    let mut buf = vec![0u8; 256];

    c.bench_function("publish_then_read", |b| {
        b.iter(|| {
            daemon.write_data(black_box(&payload));
            let n = shell.read_data(&mut buf);
            black_box(n);
        })
    });
}

fn bench_command_round_trip(c: &mut Criterion) {
    let name = format!("swmr_bench_cmd_{}", std::process::id());
    let daemon = DaemonHandle::create(&name, ChannelConfig::default()).unwrap();
    let shell = ShellHandle::connect(&name).unwrap();

    let msg = vec![0x5Au8; 32];
    let mut buf = vec![0u8; daemon.max_command_payload()];

    c.bench_function("send_then_recv", |b| {
        b.iter(|| {
            shell.try_send_command(black_box(&msg));
            black_box(daemon.try_recv_command(&mut buf));
        })
    });
}

criterion_group!(benches, bench_publish_read, bench_command_round_trip);
criterion_main!(benches);
