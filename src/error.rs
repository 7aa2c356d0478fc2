// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Typed errors for the channel's constructor paths (create/attach).
// Hot-path operations never return this type — they encode failure as
// `0`, `false`, or `None`, per the channel's error handling design.

use std::io;

/// Errors surfaced by `DaemonHandle::create` and `ShellHandle::connect`.
///
/// Steady-state operations (`write_data`, `read_data`, `try_recv_command`,
/// `try_send_command`) never return this — see each method's docs.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// `create` found an existing object at the same name that could not be
    /// cleanly removed first.
    #[error("channel '{name}' already exists")]
    NameExists { name: String },

    /// `attach` found no channel of that name.
    #[error("channel '{name}' not found")]
    NotFound { name: String },

    /// The OS refused to create, size, or map the shared memory segment.
    #[error("failed to map channel '{name}': {source}")]
    MappingFailed { name: String, source: io::Error },

    /// Magic, version, or size fields did not match at attach time.
    #[error("channel '{name}' has an incompatible layout: {reason}")]
    InvalidLayout { name: String, reason: String },
}

impl ChannelError {
    pub(crate) fn mapping_failed(name: &str, source: io::Error) -> Self {
        Self::MappingFailed { name: name.to_owned(), source }
    }

    pub(crate) fn invalid_layout(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidLayout { name: name.to_owned(), reason: reason.into() }
    }
}

/// Outcome of the command ring's internal `try_send`. `ShellHandle::
/// try_send_command` collapses this down to a plain `bool`, per the
/// channel's external interface; this richer type stays visible for
/// callers (tests, diagnostics) that want to tell `Full` apart from
/// `TooLarge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message was written into a slot and committed.
    Accepted,
    /// The ring is at capacity; caller may retry or drop.
    Full,
    /// The message exceeds `slot_payload`; no slot was consumed.
    TooLarge,
}
