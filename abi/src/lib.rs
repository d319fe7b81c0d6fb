//! Helios loader ABI (version 1).
//!
//! The memory contract between the loader and the kernel image: the info
//! tables the loader writes at fixed physical locations, and the header the
//! kernel embeds to configure how it wants to be entered. Both sides include
//! this crate; every struct layout here is binary, byte for byte.
//!
//! The info tables are single-writer (the bootstrap core, during discovery
//! and setup) and become read-only for everyone — including the kernel —
//! once the loader opens its entry barrier.

#![no_std]

pub mod header;
pub mod info;

/// Magic value identifying both the info-table root and the kernel header
/// ("HELI" in little-endian byte order).
pub const LOADER_MAGIC: u32 = 0x494C_4548;

pub use header::{HEADER_SYMBOL, HeaderFlags, HeaderIrq, HeaderIrqFlags, KernelHeader};
pub use info::{
    CpuFlags, InfoCpu, InfoIoapic, InfoMmap, InfoModule, InfoRoot, InfoTables, IrqFlags, IrqLine,
    MAX_CPUS, MAX_IOAPICS, RootFlags,
};
