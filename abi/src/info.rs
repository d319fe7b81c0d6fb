//! Info-table layout.
//!
//! Six fixed physical locations below 2 MiB hold the root summary, the
//! per-CPU array, the IO-APIC array, the memory map, the module list and the
//! string table. The loader writes them during discovery; the kernel reads
//! them after handoff. Offsets and packing are part of the contract.

use bitflags::bitflags;

use crate::LOADER_MAGIC;

/// Physical address of the [`InfoRoot`] record.
pub const INFO_ROOT_PADDR: u64 = 0x10_B000;
/// Physical address of the [`InfoCpu`] array.
pub const INFO_CPU_PADDR: u64 = 0x10_C000;
/// Physical address of the [`InfoIoapic`] array.
pub const INFO_IOAPIC_PADDR: u64 = 0x10_D000;
/// Physical address of the [`InfoMmap`] array.
pub const INFO_MMAP_PADDR: u64 = 0x10_E000;
/// Physical address of the [`InfoModule`] array.
pub const INFO_MODULE_PADDR: u64 = 0x10_F000;
/// Physical address of the module-name string table.
pub const INFO_STRING_PADDR: u64 = 0x11_0000;

/// Capacity of the CPU array. The hardware id is an 8-bit LAPIC id, so 256
/// slots cover the whole id space and an index can never exceed capacity.
pub const MAX_CPUS: usize = 256;

/// Capacity of the IO-APIC array (one 4 KiB page of 16-byte entries).
pub const MAX_IOAPICS: usize = 256;

/// Number of legacy ISA IRQ lines tracked in the remap arrays.
pub const IRQ_LINES: usize = 16;

bitflags! {
    /// Flags in [`InfoRoot::flags`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RootFlags: u32 {
        /// The system also has a legacy 8259 PIC pair.
        const PCAT_COMPAT = 1 << 0;
    }

    /// Flags in [`InfoCpu::flags`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CpuFlags: u16 {
        /// The entry describes a present, enabled CPU.
        const PRESENT = 1 << 0;
        /// The entry describes the bootstrap core.
        const BSP = 1 << 1;
    }

    /// Flags in [`InfoRoot::irq_flags`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct IrqFlags: u8 {
        /// Interrupt line is active low (default: active high).
        const ACTIVE_LOW = 1 << 0;
        /// Interrupt line is level triggered (default: edge).
        const LEVEL = 1 << 1;
    }
}

/// Legacy IRQ line number, guaranteed to be below [`IRQ_LINES`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IrqLine(u8);

impl IrqLine {
    pub const fn new(line: u8) -> Option<Self> {
        if (line as usize) < IRQ_LINES {
            Some(Self(line))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Root summary record. Length: 146 bytes.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct InfoRoot {
    /// Magic value ([`LOADER_MAGIC`]); consumers must check it first.
    pub magic: u32,
    /// [`RootFlags`] bits.
    pub flags: u32,
    /// Physical address of the local APIC MMIO window.
    pub lapic_paddr: u64,
    /// Physical address of the ACPI root pointer structure.
    pub rsdp_paddr: u64,
    /// Physical address of the IDT.
    pub idt_paddr: u64,
    /// Physical address of the GDT.
    pub gdt_paddr: u64,
    /// Physical address of the TSS entries.
    pub tss_paddr: u64,
    /// First physical byte not used by the loader or its tables.
    pub free_paddr: u64,
    /// Per legacy IRQ line: the global interrupt number it is routed to.
    pub irq_to_gsi: [u32; IRQ_LINES],
    /// Per legacy IRQ line: [`IrqFlags`] bits.
    pub irq_flags: [u8; IRQ_LINES],
    /// Number of present CPUs.
    pub cpu_count_active: u16,
    /// Number of valid entries in the CPU array (max apic id + 1).
    pub cpu_count: u16,
    /// Number of valid entries in the IO-APIC array.
    pub ioapic_count: u16,
    /// Number of valid entries in the memory map.
    pub mmap_count: u16,
    /// Number of valid entries in the module list.
    pub module_count: u16,
}

impl InfoRoot {
    pub const fn empty() -> Self {
        Self {
            magic: LOADER_MAGIC,
            flags: 0,
            lapic_paddr: 0,
            rsdp_paddr: 0,
            idt_paddr: 0,
            gdt_paddr: 0,
            tss_paddr: 0,
            free_paddr: 0,
            irq_to_gsi: identity_gsi_map(),
            irq_flags: [0; IRQ_LINES],
            cpu_count_active: 0,
            cpu_count: 0,
            ioapic_count: 0,
            mmap_count: 0,
            module_count: 0,
        }
    }

    #[inline]
    pub fn magic_ok(&self) -> bool {
        self.magic == LOADER_MAGIC
    }

    #[inline]
    pub fn insert_flags(&mut self, flags: RootFlags) {
        self.flags |= flags.bits();
    }

    #[inline]
    pub fn has_flags(&self, flags: RootFlags) -> bool {
        RootFlags::from_bits_truncate(self.flags).contains(flags)
    }
}

/// Without an override record, each ISA IRQ line maps to the GSI of the same
/// number.
const fn identity_gsi_map() -> [u32; IRQ_LINES] {
    let mut map = [0u32; IRQ_LINES];
    let mut i = 0;
    while i < IRQ_LINES {
        map[i] = i as u32;
        i += 1;
    }
    map
}

/// Entry in the CPU array, indexed by LAPIC id (array position == id).
/// Meaningless unless [`CpuFlags::PRESENT`] is set. Length: 8 bytes.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct InfoCpu {
    /// Id of the CPU's local APIC.
    pub apic_id: u8,
    /// Firmware (ACPI) processor id.
    pub acpi_id: u8,
    /// [`CpuFlags`] bits.
    pub flags: u16,
    /// Calibrated LAPIC timer frequency in ticks per second.
    pub lapic_timer_freq: u32,
}

impl InfoCpu {
    pub const fn empty() -> Self {
        Self {
            apic_id: 0,
            acpi_id: 0,
            flags: 0,
            lapic_timer_freq: 0,
        }
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        CpuFlags::from_bits_truncate(self.flags).contains(CpuFlags::PRESENT)
    }

    #[inline]
    pub fn insert_flags(&mut self, flags: CpuFlags) {
        self.flags |= flags.bits();
    }
}

/// Entry in the IO-APIC array, appended in discovery order.
/// Length: 16 bytes.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct InfoIoapic {
    /// Id of the IO-APIC.
    pub apic_id: u8,
    /// IO-APIC version register value.
    pub version: u8,
    /// Lowest global interrupt number served by this IO-APIC.
    pub gsi_base: u32,
    /// Number of global interrupts served.
    pub gsi_count: u16,
    /// Physical address of the IO-APIC's MMIO window.
    pub mmio_paddr: u64,
}

impl InfoIoapic {
    pub const fn empty() -> Self {
        Self {
            apic_id: 0,
            version: 0,
            gsi_base: 0,
            gsi_count: 0,
            mmio_paddr: 0,
        }
    }
}

/// Memory-map entry, filled by the multiboot collaborator.
/// Length: 32 bytes.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct InfoMmap {
    pub address: u64,
    pub length: u64,
    /// One if the region is free to use, zero otherwise.
    pub available: u64,
    pub padding: u64,
}

/// Module-list entry, filled by the multiboot collaborator.
/// Length: 16 bytes.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct InfoModule {
    /// Offset of the module name in the string table.
    pub name: u16,
    pub padding: u16,
    /// Length of the module in bytes.
    pub length: u32,
    /// Physical address of the module.
    pub address: u64,
}

const _: () = assert!(core::mem::size_of::<InfoRoot>() == 146);
const _: () = assert!(core::mem::size_of::<InfoCpu>() == 8);
const _: () = assert!(core::mem::size_of::<InfoIoapic>() == 16);
const _: () = assert!(core::mem::size_of::<InfoMmap>() == 32);
const _: () = assert!(core::mem::size_of::<InfoModule>() == 16);

/// Mutable view over the info tables.
///
/// The loader's bootstrap core is the only writer; it borrows the view for
/// the discovery and setup phases and drops it before the entry barrier
/// opens. Tests borrow ordinary arrays instead of the fixed locations.
pub struct InfoTables<'a> {
    pub root: &'a mut InfoRoot,
    pub cpus: &'a mut [InfoCpu],
    pub ioapics: &'a mut [InfoIoapic],
}

impl<'a> InfoTables<'a> {
    pub fn new(
        root: &'a mut InfoRoot,
        cpus: &'a mut [InfoCpu],
        ioapics: &'a mut [InfoIoapic],
    ) -> Self {
        Self {
            root,
            cpus,
            ioapics,
        }
    }

    /// Build the view over the fixed physical locations and reset it to the
    /// empty state. Bootstrap-core use only.
    ///
    /// # Safety
    ///
    /// The fixed pages must be identity mapped and not in use by anything
    /// else, and at most one such view may exist at a time.
    pub unsafe fn from_fixed_layout() -> InfoTables<'static> {
        let mut tables = unsafe { Self::attach_fixed_layout() };
        tables.reset();
        tables
    }

    /// Build the view over the fixed physical locations without touching
    /// their contents. Additional cores use this to reach their own CPU
    /// slot after the bootstrap core has populated the tables.
    ///
    /// # Safety
    ///
    /// Same as [`from_fixed_layout`](Self::from_fixed_layout), plus: each
    /// core may write only the CPU record at its own hardware id.
    pub unsafe fn attach_fixed_layout() -> InfoTables<'static> {
        let root = unsafe { &mut *(INFO_ROOT_PADDR as *mut InfoRoot) };
        let cpus =
            unsafe { core::slice::from_raw_parts_mut(INFO_CPU_PADDR as *mut InfoCpu, MAX_CPUS) };
        let ioapics = unsafe {
            core::slice::from_raw_parts_mut(INFO_IOAPIC_PADDR as *mut InfoIoapic, MAX_IOAPICS)
        };

        InfoTables {
            root,
            cpus,
            ioapics,
        }
    }

    /// Reset the view to the empty, magic-stamped state.
    pub fn reset(&mut self) {
        *self.root = InfoRoot::empty();
        self.cpus.fill(InfoCpu::empty());
        self.ioapics.fill(InfoIoapic::empty());
    }
}
