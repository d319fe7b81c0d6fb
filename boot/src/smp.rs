//! Multi-core rendezvous: the ready counter and the release flag.
//!
//! Additional cores announce arrival by incrementing the ready counter,
//! then spin on the release flag. The bootstrap core opens the flag exactly
//! once, after its last write to any shared state; the Release store paired
//! with the spinners' Acquire loads makes every earlier write visible
//! before any additional core proceeds.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use helios_lib::cpu;

static ENTRY_BARRIER: AtomicBool = AtomicBool::new(false);
static READY_COUNT: AtomicU16 = AtomicU16::new(0);

/// Called exactly once by each additional core when its own setup is done.
pub fn signal_ready() {
    READY_COUNT.fetch_add(1, Ordering::AcqRel);
}

/// How many additional cores have finished their own setup.
pub fn ready_count() -> u16 {
    READY_COUNT.load(Ordering::Acquire)
}

/// Open the release flag. Must be the bootstrap core's last shared-state
/// write before entering the kernel.
pub fn open_release() {
    ENTRY_BARRIER.store(true, Ordering::Release);
}

pub fn is_released() -> bool {
    ENTRY_BARRIER.load(Ordering::Acquire)
}

/// Spin until the bootstrap core opens the release flag.
pub fn wait_for_release() {
    while !is_released() {
        cpu::pause();
    }
}

/// Spin until `expected` additional cores have signalled ready.
pub fn wait_for_ready(expected: u16) {
    while ready_count() < expected {
        cpu::pause();
    }
}

/// Reset both primitives to their boot-time state. Only the built-in test
/// runner uses this; a real boot never rewinds the rendezvous.
pub(crate) fn reset() {
    ENTRY_BARRIER.store(false, Ordering::Release);
    READY_COUNT.store(0, Ordering::Release);
}
