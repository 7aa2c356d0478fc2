// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Property-based checks for the two invariants a public-API-only test can
// actually observe: a reader never sees a torn mix of two publications,
// and the command ring never loses, duplicates, or reorders an accepted
// message relative to another sender's accepted messages.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use swmr_shm_channel::{ChannelConfig, DaemonHandle, ShellHandle};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every publication writes a uniform byte-fill; a torn read would show
    /// up as two different fill values within one observed buffer.
    #[test]
    fn readers_never_observe_a_torn_publication(fills in proptest::collection::vec(1u8..=250, 40)) {
        let name = common::unique_channel_name("torn");
        let cfg = ChannelConfig { data_size: 256, ..ChannelConfig::default() };
        let daemon = DaemonHandle::create(&name, cfg).unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let readers: Vec<_> = (0..3)
            .map(|_| {
                let stop = stop.clone();
                let name = name.clone();
                thread::spawn(move || {
                    let shell = ShellHandle::connect(&name).unwrap();
                    let mut buf = [0u8; 256];
                    while !stop.load(Ordering::Relaxed) {
                        let n = shell.read_data(&mut buf);
                        if n == 0 {
                            continue;
                        }
                        let first = buf[0];
                        assert!(
                            buf[..n].iter().all(|&b| b == first),
                            "torn read: expected all bytes == {first}, got {:?}",
                            &buf[..n]
                        );
                    }
                })
            })
            .collect();

        for fill in &fills {
            let len = 1 + (*fill as usize % 256);
            let payload = vec![*fill; len];
            daemon.write_data(&payload);
        }

        stop.store(true, Ordering::Relaxed);
        for r in readers {
            r.join().unwrap();
        }
    }

    /// Messages accepted from a single sender are delivered to the daemon
    /// in the order they were sent, regardless of how many other senders
    /// are interleaving concurrently.
    #[test]
    fn per_sender_commands_are_delivered_in_fifo_order(count in 1usize..40) {
        let name = common::unique_channel_name("fifo");
        let mut cfg = ChannelConfig::default();
        cfg.cmd_slots = 64;
        let daemon = DaemonHandle::create(&name, cfg).unwrap();

        let senders: Vec<_> = (0..3)
            .map(|_| {
                let name = name.clone();
                thread::spawn(move || {
                    let shell = ShellHandle::connect(&name).unwrap();
                    let mut accepted = Vec::new();
                    for i in 0..count {
                        let msg = (i as u32).to_le_bytes();
                        while !shell.try_send_command(&msg) {
                            std::thread::yield_now();
                        }
                        accepted.push(i as u32);
                    }
                    (shell.client_id(), accepted)
                })
            })
            .collect();

        let mut last_seen: std::collections::HashMap<u32, i64> = std::collections::HashMap::new();
        let mut drained = 0usize;
        let expected = senders.len() * count;
        let mut buf = vec![0u8; daemon.max_command_payload()];
        while drained < expected {
            if let Some((client_id, n)) = daemon.try_recv_command(&mut buf) {
                let value = u32::from_le_bytes(buf[..n].try_into().unwrap()) as i64;
                let last = last_seen.entry(client_id).or_insert(-1);
                assert!(value > *last, "out-of-order command from client {client_id}: {value} after {last}");
                *last = value;
                drained += 1;
            } else {
                std::thread::yield_now();
            }
        }

        for s in senders {
            s.join().unwrap();
        }
    }
}
