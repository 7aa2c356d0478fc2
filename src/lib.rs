// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Lock-free single-writer/multi-reader shared-memory IPC channel: a
// seqlock-guarded data blob a daemon publishes and any number of shells
// read, plus a bounded MPSC command ring shells use to talk back.

pub mod error;
pub mod layout;
mod platform;
mod ring;
mod seqlock;
pub mod shm_name;

mod daemon;
mod shell;

pub use daemon::DaemonHandle;
pub use error::{ChannelError, SendOutcome};
pub use layout::ChannelConfig;
pub use shell::ShellHandle;
