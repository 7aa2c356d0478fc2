// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Bounded MPSC command ring: any number of shells call `try_send`
// concurrently, the daemon alone calls `try_recv`. Slot ownership is
// tracked with an explicit state tag per slot rather than the
// sequence-delta trick some lock-free queues use, because the wire format
// fixes that tag's meaning across compilation units. Producers claim a
// slot by CAS-advancing a shared tail counter, matching the retry-with-
// backoff shape of the teacher's `circ::BroadcastConnHead::connect`.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::error::SendOutcome;
use crate::layout::{Layout, RING_HEADER_SIZE, SLOT_META_SIZE, SLOT_PAYLOAD};

const STATE_EMPTY: u32 = 0;
const STATE_RESERVED: u32 = 1;
const STATE_READY: u32 = 2;
const STATE_CONSUMING: u32 = 3;

#[repr(C)]
struct RingHeader {
    head: AtomicU64,
    tail: AtomicU64,
    _pad: [u8; 48],
}

const _: () = assert!(std::mem::size_of::<RingHeader>() == RING_HEADER_SIZE as usize);

#[repr(C)]
struct Slot {
    state: AtomicU32,
    client_id: u32,
    len: u32,
    payload: [u8; SLOT_PAYLOAD],
}

const _: () = assert!(std::mem::size_of::<Slot>() as u64 == crate::layout::SLOT_SIZE);
const _: () = assert!(SLOT_META_SIZE == 12);

#[inline]
unsafe fn header<'a>(base: *mut u8, layout: &Layout) -> &'a RingHeader {
    &*(layout.cmd_ring_ptr(base) as *const RingHeader)
}

#[inline]
unsafe fn header_const<'a>(base: *const u8, layout: &Layout) -> &'a RingHeader {
    &*(layout.cmd_ring_ptr_const(base) as *const RingHeader)
}

#[inline]
unsafe fn slot<'a>(base: *mut u8, layout: &Layout, idx: u64) -> &'a Slot {
    let slots = layout.cmd_ring_ptr(base).add(RING_HEADER_SIZE as usize) as *const Slot;
    &*slots.add((idx & (layout.cmd_slots - 1)) as usize)
}

/// Initialize the ring region of a freshly created channel: head = tail = 0
/// and every slot tagged `EMPTY`. The mapping is already zero-filled by
/// `PlatformMapping::create`, so this only documents that reliance rather
/// than repeating the zeroing.
///
/// # Safety
/// `base` must point to a writable mapping of at least
/// `layout.cmd_ring_offset + RING_HEADER_SIZE + layout.cmd_slots * SLOT_SIZE`
/// bytes, already zero-filled.
pub(crate) unsafe fn init(_base: *mut u8, _layout: &Layout) {
    // Zero bytes already encode head=0, tail=0, state=EMPTY for every slot.
}

/// Attempt to enqueue `bytes` tagged with `client_id`. Never blocks.
///
/// # Safety
/// `base` must point to a mapping validated against `layout`.
pub(crate) unsafe fn try_send(
    base: *mut u8,
    layout: &Layout,
    client_id: u32,
    bytes: &[u8],
) -> SendOutcome {
    if bytes.len() > SLOT_PAYLOAD {
        return SendOutcome::TooLarge;
    }

    let hdr = header(base, layout);
    let capacity = layout.cmd_slots;

    loop {
        let tail = hdr.tail.load(Ordering::Relaxed);
        let head = hdr.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) >= capacity {
            return SendOutcome::Full;
        }

        if hdr
            .tail
            .compare_exchange_weak(tail, tail.wrapping_add(1), Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
            continue;
        }

        // This producer now exclusively owns slot `tail`.
        let s = slot(base, layout, tail);
        let prev = s.state.swap(STATE_RESERVED, Ordering::AcqRel);
        debug_assert_eq!(prev, STATE_EMPTY, "claimed slot was not empty");

        let payload_ptr = std::ptr::addr_of!(s.payload) as *mut u8;
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), payload_ptr, bytes.len());
        std::ptr::write(std::ptr::addr_of!(s.client_id) as *mut u32, client_id);
        std::ptr::write(std::ptr::addr_of!(s.len) as *mut u32, bytes.len() as u32);

        s.state.store(STATE_READY, Ordering::Release);
        return SendOutcome::Accepted;
    }
}

/// Dequeue the oldest ready command, copying its payload into `buf`.
/// Returns `Some((client_id, len))` on success. Single-consumer only — the
/// daemon must not call this from more than one thread concurrently.
///
/// # Safety
/// `base` must point to a mapping validated against `layout`.
pub(crate) unsafe fn try_recv(
    base: *mut u8,
    layout: &Layout,
    buf: &mut [u8],
) -> Option<(u32, usize)> {
    let hdr = header(base, layout);
    let head = hdr.head.load(Ordering::Relaxed);
    let tail = hdr.tail.load(Ordering::Acquire);
    if head == tail {
        return None;
    }

    let s = slot(base, layout, head);
    if s.state.load(Ordering::Acquire) != STATE_READY {
        // A producer has claimed this slot (RESERVED) but not yet published
        // it. From the single consumer's view this is indistinguishable
        // from empty: nothing to deliver yet.
        return None;
    }

    s.state.store(STATE_CONSUMING, Ordering::Release);

    let len = std::ptr::read(std::ptr::addr_of!(s.len)) as usize;
    let client_id = std::ptr::read(std::ptr::addr_of!(s.client_id));
    let copy_len = len.min(buf.len());
    let payload_ptr = std::ptr::addr_of!(s.payload) as *const u8;
    std::ptr::copy_nonoverlapping(payload_ptr, buf.as_mut_ptr(), copy_len);

    s.state.store(STATE_EMPTY, Ordering::Release);
    hdr.head.store(head.wrapping_add(1), Ordering::Release);

    Some((client_id, copy_len))
}

/// Number of commands currently occupying the ring. Racy with concurrent
/// producers/consumer by construction — an instantaneous snapshot, not a
/// synchronization point.
///
/// # Safety
/// `base` must point to a mapping validated against `layout`.
pub(crate) unsafe fn len(base: *const u8, layout: &Layout) -> u64 {
    let hdr = header_const(base, layout);
    let tail = hdr.tail.load(Ordering::Acquire);
    let head = hdr.head.load(Ordering::Acquire);
    tail.wrapping_sub(head)
}
