// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// The SWMR data path: one daemon publishes a byte-blob, any number of
// shells read it without blocking the writer and without ever observing a
// torn mix of two publications. Ordering discipline follows the same
// acquire/release pairing as the teacher's `proto::shm_ring` SPSC cursors,
// adapted to a single odd/even version counter instead of a head/tail pair
// since there is one mutable region, not a queue of them.

use std::sync::atomic::{fence, AtomicU64, Ordering};

use crate::layout::{Layout, SEQLOCK_HEADER_SIZE};

#[repr(C)]
struct SeqlockHeader {
    sequence: AtomicU64,
    data_len: AtomicU64,
    _pad: [u8; 48],
}

const _: () = assert!(std::mem::size_of::<SeqlockHeader>() == SEQLOCK_HEADER_SIZE as usize);

#[inline]
unsafe fn header<'a>(base: *const u8, layout: &Layout) -> &'a SeqlockHeader {
    &*(layout.seqlock_ptr_const(base) as *const SeqlockHeader)
}

#[inline]
unsafe fn payload_ptr(base: *const u8, layout: &Layout) -> *const u8 {
    layout.seqlock_ptr_const(base).add(SEQLOCK_HEADER_SIZE as usize)
}

/// Publish `bytes` as the new payload. Daemon-only, single-threaded with
/// respect to this region — no concurrent publishers are supported.
///
/// # Safety
/// `base` must point to a mapping validated against `layout`, and the
/// caller must be the sole publisher for this channel.
///
/// # Panics
/// Panics if `bytes.len()` exceeds the configured `data_size` — this is a
/// programmer error, not a runtime condition callers are expected to
/// recover from.
pub(crate) unsafe fn publish(base: *mut u8, layout: &Layout, bytes: &[u8]) {
    assert!(
        bytes.len() as u64 <= layout.data_size,
        "publish: {} bytes exceeds data_size {}",
        bytes.len(),
        layout.data_size
    );

    let hdr = header(base, layout);
    let payload = layout.seqlock_ptr(base).add(SEQLOCK_HEADER_SIZE as usize);

    let s = hdr.sequence.load(Ordering::Relaxed);
    let s_odd = s.wrapping_add(1);
    hdr.sequence.store(s_odd, Ordering::Release);
    fence(Ordering::Release);

    std::ptr::copy_nonoverlapping(bytes.as_ptr(), payload, bytes.len());
    hdr.data_len.store(bytes.len() as u64, Ordering::Relaxed);

    hdr.sequence.store(s_odd.wrapping_add(1), Ordering::Release);
}

/// Read the most recently completed publication into `buf`, retrying across
/// any publish caught mid-flight. Returns the number of bytes copied,
/// capped at `buf.len()` if the payload was longer.
///
/// # Safety
/// `base` must point to a mapping validated against `layout`.
pub(crate) unsafe fn read(base: *const u8, layout: &Layout, buf: &mut [u8]) -> usize {
    let hdr = header(base, layout);
    let payload = payload_ptr(base, layout);

    loop {
        let s1 = hdr.sequence.load(Ordering::Acquire);
        if s1 & 1 != 0 {
            std::hint::spin_loop();
            continue;
        }

        let n = hdr.data_len.load(Ordering::Relaxed) as usize;
        let copy_len = n.min(buf.len());
        std::ptr::copy_nonoverlapping(payload, buf.as_mut_ptr(), copy_len);
        fence(Ordering::Acquire);

        let s2 = hdr.sequence.load(Ordering::Acquire);
        if s1 == s2 {
            return copy_len;
        }
        std::hint::spin_loop();
    }
}
