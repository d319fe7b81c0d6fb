//! 8254 programmable interval timer.
//!
//! Used only as the known-rate reference for local APIC timer calibration;
//! once every core is calibrated the PIT is masked and never touched again.

use x86_64::instructions::port::Port;

use helios_lib::ports::{
    PIC1_COMMAND, PIC1_DATA, PIT_BASE_FREQUENCY_HZ, PIT_CHANNEL0, PIT_COMMAND,
};

/// Channel 0, lobyte/hibyte access, rate generator (mode 2).
const PIT_CMD_RATE_GEN: u8 = 0x34;

const PIC_EOI: u8 = 0x20;
const PIC_IRQ0_MASK: u8 = 1 << 0;

/// Program channel 0 to fire at `hz`. The reload value truncates, so the
/// actual rate is the nearest divisor of the base oscillator.
pub fn set_frequency(hz: u32) {
    let reload = (PIT_BASE_FREQUENCY_HZ / hz.max(1)).min(0xFFFF) as u16;

    let mut command: Port<u8> = Port::new(PIT_COMMAND);
    let mut channel0: Port<u8> = Port::new(PIT_CHANNEL0);
    unsafe {
        command.write(PIT_CMD_RATE_GEN);
        channel0.write(reload as u8);
        channel0.write((reload >> 8) as u8);
    }
}

/// Unmask IRQ 0 on the legacy PIC so the channel 0 tick reaches the CPU.
pub fn route_irq0() {
    let mut data: Port<u8> = Port::new(PIC1_DATA);
    unsafe {
        let mask = data.read();
        data.write(mask & !PIC_IRQ0_MASK);
    }
}

/// Mask IRQ 0 again once calibration is done.
pub fn mask_irq0() {
    let mut data: Port<u8> = Port::new(PIC1_DATA);
    unsafe {
        let mask = data.read();
        data.write(mask | PIC_IRQ0_MASK);
    }
}

/// Acknowledge the tick at the legacy PIC.
pub fn eoi() {
    let mut command: Port<u8> = Port::new(PIC1_COMMAND);
    unsafe {
        command.write(PIC_EOI);
    }
}
