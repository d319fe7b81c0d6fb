//! Thin wrappers over the CPU instructions the loader needs.

use x86_64::instructions::{hlt, interrupts};

/// Spin-loop hint for busy-wait loops.
#[inline(always)]
pub fn pause() {
    core::hint::spin_loop();
}

#[inline]
pub fn enable_interrupts() {
    interrupts::enable();
}

#[inline]
pub fn disable_interrupts() {
    interrupts::disable();
}

/// Run `f` with interrupts disabled, restoring the previous state after.
#[inline]
pub fn without_interrupts<F: FnOnce() -> R, R>(f: F) -> R {
    interrupts::without_interrupts(f)
}

/// Stop this core permanently. Interrupts stay off, so the halt never
/// returns.
pub fn halt_loop() -> ! {
    interrupts::disable();
    loop {
        hlt();
    }
}
