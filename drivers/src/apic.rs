//! Local APIC driver.
//!
//! Register access is direct offset addressing into the per-core MMIO
//! window. No locking: every core programs only its own controller, and the
//! window address is the same physical page on each of them.

use spin::Once;

use helios_lib::{MmioRegion, klog_debug};

pub mod timer;

pub(crate) mod regs;
use regs::*;

/// The local APIC register window, discovered from the MADT and mapped once
/// on the bootstrap core. The same identity window serves every core.
static LAPIC_REGS: Once<MmioRegion> = Once::new();

/// Record the controller's MMIO window. Called once with the physical
/// address the MADT reported, before any other driver call.
pub fn init(lapic_paddr: u64) {
    LAPIC_REGS.call_once(|| {
        klog_debug!("APIC: local APIC window at 0x{:x}", lapic_paddr);
        // SAFETY: the MADT-reported LAPIC page is identity mapped and owned
        // by this driver.
        unsafe { MmioRegion::identity(lapic_paddr, LAPIC_WINDOW_SIZE) }
    });
}

pub fn read_register(offset: usize) -> u32 {
    LAPIC_REGS.get().map(|r| r.read_u32(offset)).unwrap_or(0)
}

pub fn write_register(offset: usize, value: u32) {
    if let Some(regs) = LAPIC_REGS.get() {
        regs.write_u32(offset, value);
    }
}

/// Configure the calling core's controller for loader mode.
///
/// The timer is masked and cleared first: a previous configuration may
/// still have a countdown running, and its interrupt must not fire into a
/// half-configured controller. Only then are the remaining local vector
/// entries, the logical destination and the spurious vector written.
pub fn setup() {
    timer::program(0xFFFF_FFFF, 0, true, false);

    write_register(LAPIC_TPR, LAPIC_TPR_ACCEPT_ALL);
    write_register(LAPIC_LVT_PERFCNT, LAPIC_LVT_MASKED);
    write_register(LAPIC_LVT_LINT0, LAPIC_LVT_MASKED);
    write_register(LAPIC_LVT_LINT1, LAPIC_LVT_MASKED);
    write_register(LAPIC_LVT_ERROR, LAPIC_LVT_MASKED);
    write_register(LAPIC_LDR, LAPIC_LDR_FLAT);
    write_register(LAPIC_SPURIOUS, LAPIC_SPURIOUS_ENABLE | LAPIC_SPURIOUS_VECTOR);
}

/// Hardware id of the calling core's controller.
pub fn current_id() -> u8 {
    (read_register(LAPIC_ID) >> 24) as u8
}

pub fn send_eoi() {
    write_register(LAPIC_EOI, 0);
}

/// The ordered register writes that issue one inter-processor interrupt.
///
/// The destination (high) half must land before the command (low) half:
/// writing the low half is what triggers delivery.
pub fn ipi_write_sequence(icr: u64) -> [(usize, u32); 2] {
    [
        (LAPIC_ICR_HIGH, (icr >> 32) as u32),
        (LAPIC_ICR_LOW, icr as u32),
    ]
}

/// Issue an inter-processor interrupt from the 64-bit command value.
pub fn send_ipi(icr: u64) {
    for (offset, value) in ipi_write_sequence(icr) {
        write_register(offset, value);
    }
}
