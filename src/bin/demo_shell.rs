// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Minimal shell-side exerciser: attaches to a channel, prints whatever the
// daemon is publishing, and sends a ping command once on startup.

use std::thread::sleep;
use std::time::Duration;

use clap::Parser;
use swmr_shm_channel::ShellHandle;

#[derive(Parser)]
struct Args {
    /// Channel name to attach to.
    #[arg(long, default_value = "swmr-demo")]
    name: String,

    /// Milliseconds between reads.
    #[arg(long, default_value_t = 200)]
    interval_ms: u64,
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let shell = ShellHandle::connect(&args.name).expect("failed to attach to channel");
    println!("shell: attached as client {}", shell.client_id());

    let greeting = format!("hello from client {}", shell.client_id());
    let accepted = shell.try_send_command(greeting.as_bytes());
    println!("shell: sent greeting, accepted = {accepted}");

    let mut buf = vec![0u8; 256];
    loop {
        let n = shell.read_data(&mut buf);
        let text = String::from_utf8_lossy(&buf[..n]);
        println!("shell {}: saw '{text}'", shell.client_id());
        sleep(Duration::from_millis(args.interval_ms));
    }
}
