//! Identity-mapped MMIO windows.
//!
//! The loader runs with physical memory identity mapped, so a window is just
//! a base address and a size; no page-table work is involved. Register
//! accesses are volatile and bounds-checked against the window.

use core::ptr::{read_volatile, write_volatile};

#[derive(Clone, Copy, Debug)]
pub struct MmioRegion {
    base: u64,
    size: usize,
}

impl MmioRegion {
    /// Describe an identity-mapped device window.
    ///
    /// # Safety
    ///
    /// `phys..phys + size` must be an identity-mapped MMIO range owned by
    /// the caller's device for the lifetime of the region.
    pub const unsafe fn identity(phys: u64, size: usize) -> Self {
        Self { base: phys, size }
    }

    #[inline]
    pub const fn phys_base(&self) -> u64 {
        self.base
    }

    #[inline]
    pub fn read_u32(&self, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= self.size);
        unsafe { read_volatile((self.base as usize + offset) as *const u32) }
    }

    #[inline]
    pub fn write_u32(&self, offset: usize, value: u32) {
        debug_assert!(offset + 4 <= self.size);
        unsafe { write_volatile((self.base as usize + offset) as *mut u32, value) }
    }
}
