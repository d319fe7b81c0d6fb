//! Shared primitives for the Helios loader: logging, CPU and port access,
//! MMIO windows, the interrupt-vector seam and the built-in test harness.

#![no_std]

pub mod cpu;
pub mod irq;
pub mod klog;
pub mod mmio;
pub mod ports;
pub mod testing;

pub mod tsc {
    use core::arch::asm;

    #[inline(always)]
    pub fn rdtsc() -> u64 {
        let lo: u32;
        let hi: u32;
        unsafe {
            asm!(
                "rdtsc",
                out("eax") lo,
                out("edx") hi,
                options(nomem, nostack, preserves_flags)
            );
        }
        ((hi as u64) << 32) | (lo as u64)
    }
}

#[doc(hidden)]
pub use paste;

pub use irq::{IrqHandler, ScopedVector, register_swap_gate, swap_gate};
pub use klog::{KlogLevel, klog_init, klog_register_backend, klog_set_level};
pub use mmio::MmioRegion;
pub use ports::COM1_BASE;
