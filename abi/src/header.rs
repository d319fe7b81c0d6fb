//! Kernel header layout.
//!
//! The kernel image embeds one [`KernelHeader`] and exports it under the
//! well-known symbol name [`HEADER_SYMBOL`]. The loader locates it after
//! loading the image and follows its mapping and entry-point requests.

use bitflags::bitflags;

use crate::LOADER_MAGIC;
use crate::info::IRQ_LINES;

/// Symbol name the kernel header is exported under.
pub const HEADER_SYMBOL: &str = "helios_header";

bitflags! {
    /// Flags in [`KernelHeader::flags`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct HeaderFlags: u32 {
        /// Route all global interrupts to the bootstrap core instead of
        /// lowest-priority delivery.
        const IOAPIC_BSP = 1 << 0;
    }

    /// Flags in [`HeaderIrq::flags`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct HeaderIrqFlags: u8 {
        /// Leave the IRQ line masked when the kernel is entered.
        const MASKED = 1 << 0;
    }
}

/// Per legacy IRQ line configuration in the kernel header.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct HeaderIrq {
    /// [`HeaderIrqFlags`] bits.
    pub flags: u8,
    /// Interrupt vector to route the line to.
    pub vector: u8,
}

/// Root structure of the kernel header. Length: 96 bytes.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct KernelHeader {
    /// Magic value ([`LOADER_MAGIC`]).
    pub magic: u32,
    /// [`HeaderFlags`] bits.
    pub flags: u32,
    /// Requested virtual address of the per-core stack mapping (or zero).
    pub stack_vaddr: u64,
    /// Requested virtual address of the info tables (or zero).
    pub info_vaddr: u64,
    /// Requested virtual address of the IDT mapping (or zero).
    pub idt_vaddr: u64,
    /// Requested virtual address of the GDT mapping (or zero).
    pub gdt_vaddr: u64,
    /// Entry point for additional cores (or zero to halt them).
    pub ap_entry: u64,
    /// Entry point for fast syscalls (or zero).
    pub syscall_entry: u64,
    /// Interrupt-dispatch entry table pointer (or zero).
    pub isr_entry_table: u64,
    /// Per legacy IRQ line configuration.
    pub irqs: [HeaderIrq; IRQ_LINES],
}

impl KernelHeader {
    #[inline]
    pub fn magic_ok(&self) -> bool {
        self.magic == LOADER_MAGIC
    }

    #[inline]
    pub fn has_flags(&self, flags: HeaderFlags) -> bool {
        HeaderFlags::from_bits_truncate(self.flags).contains(flags)
    }
}

const _: () = assert!(core::mem::size_of::<HeaderIrq>() == 2);
const _: () = assert!(core::mem::size_of::<KernelHeader>() == 96);
