// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Minimal daemon-side exerciser: creates a channel, republishes a counter
// every tick, and prints any commands shells send in.

use std::thread::sleep;
use std::time::Duration;

use clap::Parser;
use swmr_shm_channel::{ChannelConfig, DaemonHandle};

#[derive(Parser)]
struct Args {
    /// Channel name shells will connect to.
    #[arg(long, default_value = "swmr-demo")]
    name: String,

    /// Milliseconds between publications.
    #[arg(long, default_value_t = 200)]
    interval_ms: u64,
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let daemon = DaemonHandle::create(&args.name, ChannelConfig::default())
        .expect("failed to create channel");
    println!("daemon: channel '{}' ready", args.name);

    let mut tick: u64 = 0;
    let mut cmd_buf = vec![0u8; daemon.max_command_payload()];
    loop {
        let payload = format!("tick {tick}");
        daemon.write_data(payload.as_bytes());

        while let Some((client_id, len)) = daemon.try_recv_command(&mut cmd_buf) {
            let text = String::from_utf8_lossy(&cmd_buf[..len]);
            println!("daemon: command from client {client_id}: {text}");
        }

        tick += 1;
        sleep(Duration::from_millis(args.interval_ms));
    }
}
