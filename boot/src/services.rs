//! Collaborator seams.
//!
//! Subsystems that live outside this workspace (multiboot parsing, the ELF
//! loader, the IO-APIC driver, AP wakeup plumbing, the table builders) are
//! reached through a table of function pointers the embedding loader fills
//! in before handing control to the orchestrator. The orchestrator never
//! calls a collaborator directly.

use helios_abi::{InfoTables, KernelHeader};

/// Everything the orchestrator needs from outside this workspace.
///
/// All pointers must be valid for the whole boot; the table is built once
/// and never mutated afterwards.
pub struct LoaderServices {
    /// Install the loader's bootstrap IDT on the calling core.
    pub idt_load: fn(),
    /// Point the loader-mode IDT gates at the loader's own handlers.
    pub idt_setup_loader: fn(),
    /// Repoint IDT gates at the kernel's dispatch stubs per its header.
    pub idt_setup_kernel: fn(&KernelHeader),

    /// Parse the multiboot tables into the memory-map and module arrays.
    pub multiboot_parse: fn(&mut InfoTables<'static>),
    /// Initialize the bump-pointer heap.
    pub heap_init: fn(),
    /// First byte above everything the heap handed out.
    pub heap_top: fn() -> u64,

    /// Inspect discovered IO-APICs (version, GSI count) after discovery.
    pub ioapic_analyze: fn(&mut InfoTables<'static>),
    /// Program IO-APICs and the legacy PIC for loader mode.
    pub ioapic_setup_loader: fn(&InfoTables<'static>),
    /// Reprogram IO-APICs according to the kernel header's IRQ table.
    pub ioapic_setup_kernel: fn(&InfoTables<'static>, &KernelHeader),
    /// Mask or remap the legacy PIC out of the way.
    pub pic_setup: fn(),

    /// Locate the kernel image among the boot modules.
    pub kernel_find: fn(&InfoTables<'static>) -> Option<u64>,
    /// Load the ELF image found at `paddr` into its runtime placement.
    pub kernel_load: fn(u64) -> bool,
    /// Find and validate the kernel's header by its well-known symbol.
    pub kernel_analyze: fn() -> Option<&'static KernelHeader>,

    /// Fast-syscall MSR setup for the calling core.
    pub syscall_init: fn(&KernelHeader),
    /// Establish the kernel-requested virtual mappings.
    pub map_info: fn(&KernelHeader),
    pub map_stack: fn(&KernelHeader),
    pub map_idt: fn(&KernelHeader),
    pub map_gdt: fn(&KernelHeader),

    /// Wake every additional core; each arrives in the AP entry path.
    pub smp_wake: fn(&InfoTables<'static>),

    /// Jump into the kernel on the bootstrap core.
    pub kernel_enter_bsp: fn(&KernelHeader) -> !,
    /// Jump into the kernel on an additional core.
    pub kernel_enter_ap: fn(&KernelHeader) -> !,
}
