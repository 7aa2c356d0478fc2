// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// The daemon side of a channel: owns creation and teardown of the shared
// memory segment, publishes data, and drains the command ring. Mirrors the
// teacher's split between a connection-owning type and the platform
// mapping it wraps (see `platform::posix::PlatformMapping`).

use tracing::{debug, info};

use crate::error::ChannelError;
use crate::layout::{ChannelConfig, Layout};
use crate::platform::PlatformMapping;
use crate::{ring, seqlock};

/// Owns a freshly created channel. Dropping it unlinks the backing shared
/// memory object — the daemon is the only side allowed to do so (see
/// `platform::posix` module docs).
pub struct DaemonHandle {
    name: String,
    mapping: PlatformMapping,
    layout: Layout,
}

impl DaemonHandle {
    /// Create a new channel named `name` with the given sizing. Fails if an
    /// existing object under that name could not be mapped — see
    /// `PlatformMapping::create` for the unlink-and-retry policy that
    /// precedes this.
    pub fn create(name: &str, config: ChannelConfig) -> Result<Self, ChannelError> {
        let layout = Layout::compute(&config);
        info!(
            channel = name,
            data_size = layout.data_size,
            cmd_slots = layout.cmd_slots,
            total_size = layout.total_size,
            "creating channel"
        );

        let mapping = PlatformMapping::create(name, layout.total_size as usize).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                ChannelError::NameExists { name: name.to_owned() }
            } else {
                ChannelError::mapping_failed(name, e)
            }
        })?;

        unsafe {
            layout.write_header(mapping.as_mut_ptr());
            ring::init(mapping.as_mut_ptr(), &layout);
        }

        Ok(Self { name: name.to_owned(), mapping, layout })
    }

    /// Publish `bytes` as the channel's current data payload. Overwrites
    /// any prior publication; readers racing this call see either the old
    /// or the new payload in full, never a mix (see `crate::seqlock`).
    ///
    /// # Panics
    /// Panics if `bytes.len()` exceeds the configured `data_size`.
    pub fn write_data(&self, bytes: &[u8]) {
        unsafe { seqlock::publish(self.mapping.as_mut_ptr(), &self.layout, bytes) };
    }

    /// Drain the oldest pending command, if any. Returns the sending
    /// shell's client id and the number of bytes copied into `buf`.
    ///
    /// Must only be called from one thread — the ring has a single logical
    /// consumer.
    pub fn try_recv_command(&self, buf: &mut [u8]) -> Option<(u32, usize)> {
        let result = unsafe { ring::try_recv(self.mapping.as_mut_ptr(), &self.layout, buf) };
        if let Some((client_id, len)) = result {
            debug!(client_id, len, "received command");
        }
        result
    }

    /// Number of commands currently queued in the ring.
    pub fn pending_commands(&self) -> u64 {
        unsafe { ring::len(self.mapping.as_ptr(), &self.layout) }
    }

    /// Name this channel was created under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum payload a single command may carry.
    pub fn max_command_payload(&self) -> usize {
        crate::layout::SLOT_PAYLOAD
    }

    /// Base address of the mapped segment, for diagnostics and tooling
    /// (e.g. attaching a debugger to inspect the raw header). Callers must
    /// not write through this pointer outside of the seqlock/ring
    /// protocols, and must not outlive this handle.
    pub fn raw_ptr(&self) -> *const u8 {
        self.mapping.as_ptr()
    }
}

impl Drop for DaemonHandle {
    fn drop(&mut self) {
        info!(channel = self.name, "tearing down channel");
        PlatformMapping::remove(&self.name);
    }
}
