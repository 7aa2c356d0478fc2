// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// End-to-end exercise of the public DaemonHandle/ShellHandle API across a
// real OS-backed shared memory mapping.

mod common;

use swmr_shm_channel::{ChannelConfig, ChannelError, DaemonHandle, ShellHandle};

#[test]
fn shell_reads_what_daemon_publishes() {
    let name = common::unique_channel_name("read_write");
    let daemon = DaemonHandle::create(&name, ChannelConfig::default()).unwrap();
    let shell = ShellHandle::connect(&name).unwrap();

    daemon.write_data(b"hello shell");
    let mut buf = [0u8; 64];
    let n = shell.read_data(&mut buf);
    assert_eq!(&buf[..n], b"hello shell");
}

#[test]
fn each_shell_gets_a_distinct_client_id() {
    let name = common::unique_channel_name("client_ids");
    let _daemon = DaemonHandle::create(&name, ChannelConfig::default()).unwrap();

    let a = ShellHandle::connect(&name).unwrap();
    let b = ShellHandle::connect(&name).unwrap();
    let c = ShellHandle::connect(&name).unwrap();

    assert_ne!(a.client_id(), b.client_id());
    assert_ne!(b.client_id(), c.client_id());
    assert_ne!(a.client_id(), c.client_id());
}

#[test]
fn daemon_receives_commands_in_order_with_sender_identity() {
    let name = common::unique_channel_name("commands");
    let daemon = DaemonHandle::create(&name, ChannelConfig::default()).unwrap();
    let shell_a = ShellHandle::connect(&name).unwrap();
    let shell_b = ShellHandle::connect(&name).unwrap();

    assert!(shell_a.try_send_command(b"first"));
    assert!(shell_b.try_send_command(b"second"));

    let mut buf = vec![0u8; daemon.max_command_payload()];
    let (id1, n1) = daemon.try_recv_command(&mut buf).unwrap();
    assert_eq!(id1, shell_a.client_id());
    assert_eq!(&buf[..n1], b"first");

    let (id2, n2) = daemon.try_recv_command(&mut buf).unwrap();
    assert_eq!(id2, shell_b.client_id());
    assert_eq!(&buf[..n2], b"second");

    assert!(daemon.try_recv_command(&mut buf).is_none());
}

#[test]
fn connect_to_missing_channel_fails() {
    let name = common::unique_channel_name("missing");
    let result = ShellHandle::connect(&name);
    assert!(matches!(result, Err(ChannelError::NotFound { .. })));
}

#[test]
fn command_ring_reports_full_once_at_capacity() {
    let name = common::unique_channel_name("ring_full");
    let mut cfg = ChannelConfig::default();
    cfg.cmd_slots = 2;
    let daemon = DaemonHandle::create(&name, cfg).unwrap();
    let shell = ShellHandle::connect(&name).unwrap();

    assert!(shell.try_send_command(b"a"));
    assert!(shell.try_send_command(b"b"));
    assert!(!shell.try_send_command(b"c"));
    assert_eq!(daemon.pending_commands(), 2);
}

#[test]
fn oversized_command_is_rejected() {
    let name = common::unique_channel_name("oversized");
    let daemon = DaemonHandle::create(&name, ChannelConfig::default()).unwrap();
    let shell = ShellHandle::connect(&name).unwrap();

    let huge = vec![0u8; daemon.max_command_payload() + 1];
    assert!(!shell.try_send_command(&huge));
}

#[test]
fn dropping_daemon_unlinks_channel_for_new_connects() {
    let name = common::unique_channel_name("teardown");
    let daemon = DaemonHandle::create(&name, ChannelConfig::default()).unwrap();
    drop(daemon);

    let result = ShellHandle::connect(&name);
    assert!(result.is_err());
}

#[test]
fn shell_outlives_a_dropped_daemon_handle() {
    // The shell already attached keeps its mapping valid even after the
    // daemon drops and unlinks the name — only *new* connects are affected.
    let name = common::unique_channel_name("outlive");
    let daemon = DaemonHandle::create(&name, ChannelConfig::default()).unwrap();
    let shell = ShellHandle::connect(&name).unwrap();
    daemon.write_data(b"still here");

    drop(daemon);

    let mut buf = [0u8; 32];
    let n = shell.read_data(&mut buf);
    assert_eq!(&buf[..n], b"still here");
}
