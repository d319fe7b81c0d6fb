//! Local APIC timer: programming, PIT-referenced calibration and timed
//! waits.
//!
//! Calibration runs once per core during bring-up and stores the measured
//! bus frequency in that core's CPU slot, so later waits never need the PIT
//! again.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use helios_abi::InfoTables;
use helios_lib::{ScopedVector, cpu, klog_debug, klog_warn};

use super::regs::*;
use super::{current_id, read_register, send_eoi, write_register};
use crate::pit;

/// Vector borrowed for the PIT reference interrupt during calibration.
const PIT_VECTOR: u8 = 0x20;

/// Vector borrowed for the one-shot expiry interrupt in [`wait`].
const TIMER_WAIT_VECTOR: u8 = 0x40;

/// PIT reference rate used for calibration. 100 Hz keeps a full tick long
/// enough that the counter delta dwarfs interrupt latency jitter.
const CALIBRATE_PIT_HZ: u32 = 100;

/// The ordered register writes that configure the timer.
///
/// Divisor first, then the local vector entry, and the initial count last:
/// writing the count is what arms the countdown, so every other field must
/// already hold its final value.
pub fn program_sequence(
    initial_count: u32,
    vector: u8,
    masked: bool,
    periodic: bool,
) -> [(usize, u32); 3] {
    let mut lvt = vector as u32;
    if masked {
        lvt |= LAPIC_LVT_MASKED;
    }
    if periodic {
        lvt |= LAPIC_TIMER_PERIODIC;
    }
    [
        (LAPIC_TIMER_DCR, LAPIC_TIMER_DIV_1),
        (LAPIC_LVT_TIMER, lvt),
        (LAPIC_TIMER_ICR, initial_count),
    ]
}

/// Program the calling core's timer.
pub fn program(initial_count: u32, vector: u8, masked: bool, periodic: bool) {
    for (offset, value) in program_sequence(initial_count, vector, masked, periodic) {
        write_register(offset, value);
    }
}

/// Timer ticks for `micros` microseconds at `freq_hz` ticks per second.
/// Truncates toward zero.
pub fn ticks_for(freq_hz: u32, micros: u64) -> u64 {
    (freq_hz as u64) * micros / 1_000_000
}

static PIT_TICKS: AtomicU32 = AtomicU32::new(0);

extern "C" fn pit_reference_handler() {
    PIT_TICKS.fetch_add(1, Ordering::Relaxed);
    pit::eoi();
}

/// Measure the calling core's timer frequency against the PIT and record it
/// in that core's CPU slot. Returns the measured frequency in Hz.
///
/// The timer free-runs masked at maximum count while the PIT fires at a
/// known rate; the current-count delta across exactly one full PIT period
/// gives ticks per period.
pub fn calibrate(info: &mut InfoTables<'_>) -> u32 {
    let _vector = ScopedVector::install(PIT_VECTOR, pit_reference_handler);

    pit::set_frequency(CALIBRATE_PIT_HZ);
    pit::route_irq0();

    // Free-run masked from the top so the countdown never expires during
    // the measurement.
    program(0xFFFF_FFFF, 0, true, false);

    PIT_TICKS.store(0, Ordering::Relaxed);
    cpu::enable_interrupts();

    // The first tick only aligns us to a period boundary; the delta is
    // taken across the second.
    while PIT_TICKS.load(Ordering::Relaxed) < 1 {
        cpu::pause();
    }
    let start = read_register(LAPIC_TIMER_CCR);
    while PIT_TICKS.load(Ordering::Relaxed) < 2 {
        cpu::pause();
    }
    let end = read_register(LAPIC_TIMER_CCR);

    cpu::disable_interrupts();
    pit::mask_irq0();

    let elapsed = start.wrapping_sub(end);
    let freq_hz = elapsed.saturating_mul(CALIBRATE_PIT_HZ);

    let apic_id = current_id();
    if let Some(cpu_slot) = info.cpus.get_mut(apic_id as usize) {
        cpu_slot.lapic_timer_freq = freq_hz;
    }
    klog_debug!("APIC: cpu {} timer at {} Hz", apic_id, freq_hz);

    freq_hz
}

static WAIT_COMPLETE: AtomicBool = AtomicBool::new(false);

extern "C" fn wait_expiry_handler() {
    WAIT_COMPLETE.store(true, Ordering::Release);
    send_eoi();
}

/// Block the calling core for `micros` microseconds using its timer.
///
/// Requires a prior [`calibrate`] on this core; without one the wait is
/// skipped with a warning rather than spinning on a dead countdown.
pub fn wait(info: &InfoTables<'_>, micros: u64) {
    let apic_id = current_id();
    let freq_hz = info
        .cpus
        .get(apic_id as usize)
        .map(|cpu_slot| cpu_slot.lapic_timer_freq)
        .unwrap_or(0);
    if freq_hz == 0 {
        klog_warn!("APIC: cpu {} timer not calibrated, skipping wait", apic_id);
        return;
    }

    let ticks = ticks_for(freq_hz, micros).min(u32::MAX as u64) as u32;
    if ticks == 0 {
        return;
    }

    let _vector = ScopedVector::install(TIMER_WAIT_VECTOR, wait_expiry_handler);

    WAIT_COMPLETE.store(false, Ordering::Relaxed);
    program(ticks, TIMER_WAIT_VECTOR, false, false);

    cpu::enable_interrupts();
    while !WAIT_COMPLETE.load(Ordering::Acquire) {
        cpu::pause();
    }
    cpu::disable_interrupts();
}
