// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// The shell side of a channel: attaches to a segment a daemon already
// created, reads published data, and enqueues commands. Many shells may
// attach to the same channel concurrently; each claims a distinct id off
// the header's atomic counter at connect time.

use std::sync::atomic::Ordering;

use tracing::{debug, info};

use crate::error::{ChannelError, SendOutcome};
use crate::layout::{Layout, CHANNEL_HEADER_SIZE};
use crate::platform::PlatformMapping;
use crate::{ring, seqlock};

/// A connected reader/command-sender. Dropping it only unmaps the shared
/// memory segment — it never unlinks the underlying object (see
/// `DaemonHandle`, which owns that).
pub struct ShellHandle {
    mapping: PlatformMapping,
    layout: Layout,
    client_id: u32,
}

impl ShellHandle {
    /// Attach to an existing channel named `name`. Fails if no such channel
    /// exists or its on-disk layout does not match this build's wire
    /// format.
    pub fn connect(name: &str) -> Result<Self, ChannelError> {
        let mapping = PlatformMapping::attach(name, CHANNEL_HEADER_SIZE as usize).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ChannelError::NotFound { name: name.to_owned() }
            } else {
                ChannelError::mapping_failed(name, e)
            }
        })?;

        let layout = unsafe { Layout::validate(name, mapping.as_ptr(), mapping.size() as u64)? };

        let client_id = unsafe {
            Layout::next_client_id(mapping.as_mut_ptr()).fetch_add(1, Ordering::Relaxed)
        };
        info!(channel = name, client_id, "shell attached");

        Ok(Self { mapping, layout, client_id })
    }

    /// The id this shell claimed at connect time. Stable for the lifetime
    /// of the handle, unique among concurrently-attached shells.
    pub fn client_id(&self) -> u32 {
        self.client_id
    }

    /// Read the channel's current data payload into `buf`. Returns the
    /// number of bytes copied, capped at `buf.len()`.
    pub fn read_data(&self, buf: &mut [u8]) -> usize {
        unsafe { seqlock::read(self.mapping.as_ptr(), &self.layout, buf) }
    }

    /// Enqueue a command tagged with this shell's client id. Never blocks.
    /// Returns `true` if the message was accepted, `false` if the ring was
    /// full or the message was too large for a slot — callers that need to
    /// tell those two cases apart should inspect `max_command_payload`
    /// before sending.
    pub fn try_send_command(&self, bytes: &[u8]) -> bool {
        let outcome =
            unsafe { ring::try_send(self.mapping.as_mut_ptr(), &self.layout, self.client_id, bytes) };
        if outcome != SendOutcome::Accepted {
            debug!(client_id = self.client_id, ?outcome, "command rejected");
        }
        outcome == SendOutcome::Accepted
    }

    /// Maximum payload a single command may carry.
    pub fn max_command_payload(&self) -> usize {
        crate::layout::SLOT_PAYLOAD
    }
}
