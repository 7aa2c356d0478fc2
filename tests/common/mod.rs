// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors

use std::sync::atomic::{AtomicUsize, Ordering};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A channel name unique to this test process and call site, so parallel
/// `cargo test` runs never collide on the same shared memory object.
pub fn unique_channel_name(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("swmr_it_{prefix}_{}_{n}", std::process::id())
}
