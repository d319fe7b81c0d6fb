//! Boot phase sequencing.
//!
//! One strict, non-retrying sequence on the bootstrap core, a reduced one
//! on every additional core. Any failed phase halts the machine; there is
//! no fallback path for a loader.

use helios_abi::{CpuFlags, InfoTables, KernelHeader};
use helios_acpi as acpi;
use helios_drivers::apic;
use helios_drivers::apic::timer;
use helios_lib::{cpu, klog_error, klog_info, klog_init};

use crate::services::LoaderServices;
use crate::smp;

const PAGE_MASK: u64 = 0xFFF;

/// Diagnostic, then an interrupt-off halt loop. No retry, no reboot.
pub fn fatal(msg: &str) -> ! {
    klog_error!("BOOT: fatal: {}", msg);
    cpu::halt_loop();
}

fn analyzed_header(services: &LoaderServices) -> &'static KernelHeader {
    match (services.kernel_analyze)() {
        Some(header) if header.magic_ok() => header,
        Some(_) => fatal("kernel header magic mismatch"),
        None => fatal("kernel header not found"),
    }
}

/// Bootstrap-core sequence. Entered exactly once, on the first core, with
/// interrupts disabled and the collaborator table fully populated.
pub fn run_bsp(services: &'static LoaderServices) -> ! {
    klog_init();
    klog_info!("Helios loader starting on bootstrap core");

    (services.idt_load)();
    (services.idt_setup_loader)();

    // SAFETY: the fixed info pages are identity mapped and reserved for the
    // loader; this is the only writing view until the barrier opens.
    let mut info = unsafe { InfoTables::from_fixed_layout() };
    (services.multiboot_parse)(&mut info);
    (services.heap_init)();

    if let Err(err) = acpi::discover(&mut info) {
        klog_error!("ACPI: discovery failed: {}", err);
        fatal("hardware discovery failed");
    }
    (services.ioapic_analyze)(&mut info);

    let Some(kernel_paddr) = (services.kernel_find)(&info) else {
        fatal("no kernel module found");
    };
    if !(services.kernel_load)(kernel_paddr) {
        fatal("kernel image rejected by the loader");
    }
    let header = analyzed_header(services);

    let lapic_paddr = info.root.lapic_paddr;
    apic::init(lapic_paddr);
    apic::setup();
    (services.ioapic_setup_loader)(&info);
    (services.pic_setup)();

    timer::calibrate(&mut info);

    let bsp_id = apic::current_id();
    if let Some(bsp_slot) = info.cpus.get_mut(bsp_id as usize) {
        bsp_slot.insert_flags(CpuFlags::BSP);
    }

    let cpu_count_active = info.root.cpu_count_active;
    let additional = cpu_count_active.saturating_sub(1);
    if additional > 0 {
        klog_info!("SMP: waking {} additional cores", additional);
        (services.smp_wake)(&info);
        smp::wait_for_ready(additional);
        klog_info!("SMP: all {} additional cores ready", additional);
    }

    (services.idt_setup_kernel)(header);
    (services.ioapic_setup_kernel)(&info, header);
    (services.syscall_init)(header);

    (services.map_info)(header);
    (services.map_stack)(header);
    (services.map_idt)(header);
    (services.map_gdt)(header);

    info.root.free_paddr = ((services.heap_top)() + PAGE_MASK) & !PAGE_MASK;

    // Last shared-state write. Everything above must be visible to the
    // additional cores before they observe the open flag.
    drop(info);
    smp::open_release();

    klog_info!("BOOT: entering kernel on bootstrap core");
    (services.kernel_enter_bsp)(header)
}

/// Additional-core sequence. Entered once per woken core, with interrupts
/// disabled, after the bootstrap core has populated the info tables.
pub fn run_ap(services: &'static LoaderServices) -> ! {
    (services.idt_load)();

    apic::setup();

    // SAFETY: the bootstrap core built the tables before waking this core;
    // calibration touches only this core's own CPU slot.
    let mut info = unsafe { InfoTables::attach_fixed_layout() };
    timer::calibrate(&mut info);

    let header = analyzed_header(services);
    (services.map_stack)(header);
    (services.syscall_init)(header);

    drop(info);
    smp::signal_ready();
    smp::wait_for_release();

    let ap_entry = header.ap_entry;
    if ap_entry == 0 {
        cpu::halt_loop();
    }
    (services.kernel_enter_ap)(header)
}
