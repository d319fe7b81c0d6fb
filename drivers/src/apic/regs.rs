//! Local APIC MMIO register offsets and control flags.
//!
//! Device-level definitions for programming the local APIC through its
//! memory-mapped window; internal to the APIC driver.

pub(crate) const LAPIC_ID: usize = 0x020;
pub(crate) const LAPIC_TPR: usize = 0x080;
pub(crate) const LAPIC_EOI: usize = 0x0B0;
pub(crate) const LAPIC_LDR: usize = 0x0D0;
pub(crate) const LAPIC_SPURIOUS: usize = 0x0F0;
pub(crate) const LAPIC_ICR_LOW: usize = 0x300;
pub(crate) const LAPIC_ICR_HIGH: usize = 0x310;
pub(crate) const LAPIC_LVT_TIMER: usize = 0x320;
pub(crate) const LAPIC_LVT_PERFCNT: usize = 0x340;
pub(crate) const LAPIC_LVT_LINT0: usize = 0x350;
pub(crate) const LAPIC_LVT_LINT1: usize = 0x360;
pub(crate) const LAPIC_LVT_ERROR: usize = 0x370;
pub(crate) const LAPIC_TIMER_ICR: usize = 0x380;
pub(crate) const LAPIC_TIMER_CCR: usize = 0x390;
pub(crate) const LAPIC_TIMER_DCR: usize = 0x3E0;

pub(crate) const LAPIC_LVT_MASKED: u32 = 1 << 16;
pub(crate) const LAPIC_TIMER_PERIODIC: u32 = 1 << 17;
pub(crate) const LAPIC_SPURIOUS_ENABLE: u32 = 1 << 8;

/// Spurious interrupts land on the highest vector.
pub(crate) const LAPIC_SPURIOUS_VECTOR: u32 = 0xFF;

/// Timer divisor: count bus clocks directly (divide by 1).
pub(crate) const LAPIC_TIMER_DIV_1: u32 = 0xB;

/// Accept every priority class.
pub(crate) const LAPIC_TPR_ACCEPT_ALL: u32 = 0;

/// Flat logical destination: every core is a member.
pub(crate) const LAPIC_LDR_FLAT: u32 = 0xFF << 24;

/// The size of the local APIC register window.
pub(crate) const LAPIC_WINDOW_SIZE: usize = 0x1000;
