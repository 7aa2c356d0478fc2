// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Channel header and region-offset geometry.
//
// The header is a fixed-size prefix written once by the creating daemon and
// read-only thereafter except for `next_client_id`, which every attaching
// shell increments atomically to claim a unique id. Offsets are computed
// deterministically from `ChannelConfig` so that a shell compiled
// independently of the daemon can discover the concrete geometry at attach
// time rather than assuming a hard-coded layout.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::ChannelError;

/// Four ASCII bytes ("MONV") identifying this layout family.
pub const MAGIC: u32 = 0x4D4F4E56;
pub const VERSION: u32 = 1;

/// Every region (seqlock state, command ring) starts on a 64-byte boundary
/// to keep `sequence`/`data_len` and `head`/`tail` each on their own cache
/// line.
const ALIGN: u64 = 64;

pub const SEQLOCK_HEADER_SIZE: u64 = 64;
pub const RING_HEADER_SIZE: u64 = 64;

/// Total bytes per command slot, chosen so slot + metadata is one cache line.
pub const SLOT_SIZE: u64 = 64;
/// `state` (u32) + `client_id` (u32) + `len` (u32).
pub const SLOT_META_SIZE: u64 = 12;
/// Bytes of message payload that fit in a single slot.
pub const SLOT_PAYLOAD: usize = (SLOT_SIZE - SLOT_META_SIZE) as usize;

const fn round_up(x: u64, align: u64) -> u64 {
    (x + align - 1) & !(align - 1)
}

/// Fixed-size prefix of the shared memory segment. Binary layout per the
/// channel's external wire format: little-endian, natural alignment, fixed
/// across versions.
#[repr(C)]
pub(crate) struct RawChannelHeader {
    pub magic: u32,
    pub version: u32,
    pub data_size: u64,
    pub seqlock_offset: u64,
    pub cmd_ring_offset: u64,
    pub cmd_slots: u64,
    pub slot_size: u64,
    pub next_client_id: AtomicU32,
    pub reserved: [u8; 28],
}

pub const CHANNEL_HEADER_SIZE: u64 = std::mem::size_of::<RawChannelHeader>() as u64;

const _: () = assert!(std::mem::size_of::<RawChannelHeader>() == 80);

/// Caller-chosen sizing for a new channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Payload capacity of the seqlock data region, in bytes.
    pub data_size: u64,
    /// Requested command-ring slot count; rounded up to a power of two.
    pub cmd_slots: u64,
    /// Upper bound on expected attachers. Informational only — the ring and
    /// client-id counter have no fixed per-client storage, so this does not
    /// change the layout. Kept because `shell_connect` callers and
    /// deployment tooling size their own client-side buffers off of it.
    pub max_clients: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { data_size: 4096, cmd_slots: 256, max_clients: 64 }
    }
}

/// Computed region geometry for a channel, either freshly derived from a
/// [`ChannelConfig`] (create) or read back from an existing header (attach).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub data_size: u64,
    pub cmd_slots: u64,
    pub seqlock_offset: u64,
    pub cmd_ring_offset: u64,
    pub total_size: u64,
}

impl Layout {
    /// Derive geometry for a new channel from caller config.
    pub fn compute(cfg: &ChannelConfig) -> Self {
        let cmd_slots = cfg.cmd_slots.max(1).next_power_of_two();
        let seqlock_offset = round_up(CHANNEL_HEADER_SIZE, ALIGN);
        let cmd_ring_offset =
            round_up(seqlock_offset + SEQLOCK_HEADER_SIZE + cfg.data_size, ALIGN);
        let total_size =
            round_up(cmd_ring_offset + RING_HEADER_SIZE + cmd_slots * SLOT_SIZE, ALIGN);
        Self { data_size: cfg.data_size, cmd_slots, seqlock_offset, cmd_ring_offset, total_size }
    }

    /// Write magic/version/offsets into a freshly zero-filled mapping and
    /// initialize `next_client_id = 1`. Called exactly once, by the creator.
    ///
    /// # Safety
    /// `base` must point to a writable mapping of at least `self.total_size`
    /// bytes, already zero-filled.
    pub unsafe fn write_header(&self, base: *mut u8) {
        let hdr = base as *mut RawChannelHeader;
        std::ptr::write(std::ptr::addr_of_mut!((*hdr).magic), MAGIC);
        std::ptr::write(std::ptr::addr_of_mut!((*hdr).version), VERSION);
        std::ptr::write(std::ptr::addr_of_mut!((*hdr).data_size), self.data_size);
        std::ptr::write(std::ptr::addr_of_mut!((*hdr).seqlock_offset), self.seqlock_offset);
        std::ptr::write(std::ptr::addr_of_mut!((*hdr).cmd_ring_offset), self.cmd_ring_offset);
        std::ptr::write(std::ptr::addr_of_mut!((*hdr).cmd_slots), self.cmd_slots);
        std::ptr::write(std::ptr::addr_of_mut!((*hdr).slot_size), SLOT_SIZE);
        (*hdr).next_client_id.store(1, Ordering::Relaxed);
    }

    /// Read and validate an existing header. Rejects any magic/version/size
    /// mismatch with a typed error rather than guessing at the geometry.
    ///
    /// # Safety
    /// `base` must point to a readable mapping of at least `mapped_size`
    /// bytes.
    pub unsafe fn validate(
        name: &str,
        base: *const u8,
        mapped_size: u64,
    ) -> Result<Self, ChannelError> {
        if mapped_size < CHANNEL_HEADER_SIZE {
            return Err(ChannelError::invalid_layout(
                name,
                format!("mapped size {mapped_size} smaller than channel header"),
            ));
        }
        let hdr = &*(base as *const RawChannelHeader);
        if hdr.magic != MAGIC {
            return Err(ChannelError::invalid_layout(
                name,
                format!("bad magic {:#010x}, expected {:#010x}", hdr.magic, MAGIC),
            ));
        }
        if hdr.version != VERSION {
            return Err(ChannelError::invalid_layout(
                name,
                format!("unsupported version {}, expected {}", hdr.version, VERSION),
            ));
        }
        if hdr.slot_size != SLOT_SIZE {
            return Err(ChannelError::invalid_layout(
                name,
                format!("slot_size {} does not match {}", hdr.slot_size, SLOT_SIZE),
            ));
        }
        let layout = Self {
            data_size: hdr.data_size,
            cmd_slots: hdr.cmd_slots,
            seqlock_offset: hdr.seqlock_offset,
            cmd_ring_offset: hdr.cmd_ring_offset,
            total_size: mapped_size,
        };
        let needed = layout.cmd_ring_offset + RING_HEADER_SIZE + layout.cmd_slots * SLOT_SIZE;
        if needed > mapped_size
            || layout.seqlock_offset + SEQLOCK_HEADER_SIZE + layout.data_size
                > layout.cmd_ring_offset
            || !layout.cmd_slots.is_power_of_two()
        {
            return Err(ChannelError::invalid_layout(
                name,
                "region offsets/sizes inconsistent with mapped size",
            ));
        }
        Ok(layout)
    }

    #[inline]
    pub fn seqlock_ptr(&self, base: *mut u8) -> *mut u8 {
        unsafe { base.add(self.seqlock_offset as usize) }
    }

    #[inline]
    pub fn seqlock_ptr_const(&self, base: *const u8) -> *const u8 {
        unsafe { base.add(self.seqlock_offset as usize) }
    }

    #[inline]
    pub fn cmd_ring_ptr(&self, base: *mut u8) -> *mut u8 {
        unsafe { base.add(self.cmd_ring_offset as usize) }
    }

    #[inline]
    pub fn cmd_ring_ptr_const(&self, base: *const u8) -> *const u8 {
        unsafe { base.add(self.cmd_ring_offset as usize) }
    }

    /// Reference to the atomic client-id counter embedded in the header.
    ///
    /// # Safety
    /// `base` must point to a mapping validated against this layout.
    pub unsafe fn next_client_id<'a>(base: *mut u8) -> &'a AtomicU32 {
        &(*(base as *const RawChannelHeader)).next_client_id
    }
}
