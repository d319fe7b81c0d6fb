//! Well-known I/O port numbers.

/// COM1 UART base port, used by the early klog backend.
pub const COM1_BASE: u16 = 0x3F8;

pub const PIT_CHANNEL0: u16 = 0x40;
pub const PIT_COMMAND: u16 = 0x43;

/// Base oscillator frequency of the 8254 PIT.
pub const PIT_BASE_FREQUENCY_HZ: u32 = 1_193_182;

/// Legacy PIC command/data ports, used only to route the calibration tick.
pub const PIC1_COMMAND: u16 = 0x20;
pub const PIC1_DATA: u16 = 0x21;
