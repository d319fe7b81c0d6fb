//! Top-level discovery driver.
//!
//! Locates the RSDP, walks the root table, and folds every valid MADT into
//! the info tables. Individual tables with bad checksums are skipped;
//! a missing RSDP, an invalid root table, or an empty result is fatal.

use helios_abi::{CpuFlags, InfoTables, IrqLine, RootFlags};
use helios_lib::{klog_debug, klog_info, klog_warn};

use crate::AcpiError;
use crate::madt::{ISO_BUS_ISA, MADT_SIGNATURE, Madt, MadtEntry};
use crate::tables::{RootTable, Rsdp, checksum_ok, find_rsdp, root_entry_stride, table_bytes};

/// Discover CPUs, IO-APICs and IRQ routing and record them in `info`.
///
/// Dereferences firmware tables through the identity mapping; the caller
/// guarantees physical memory is identity mapped (always true in the
/// loader's address space).
pub fn discover(info: &mut InfoTables<'_>) -> Result<(), AcpiError> {
    let (rsdp_paddr, rsdp) = unsafe { find_rsdp() }.ok_or(AcpiError::RsdpNotFound)?;
    info.root.rsdp_paddr = rsdp_paddr;
    klog_debug!("ACPI: RSDP at 0x{:x}, revision {}", rsdp_paddr, rsdp.revision);

    walk_root_table(&rsdp, info)?;
    verify_discovery(info)?;

    let cpu_count = info.root.cpu_count;
    let active = info.root.cpu_count_active;
    let ioapic_count = info.root.ioapic_count;
    klog_info!(
        "ACPI: {} CPUs ({} active), {} IO-APICs",
        cpu_count,
        active,
        ioapic_count
    );
    Ok(())
}

/// Both a CPU and an IO-APIC are mandatory preconditions for every later
/// boot phase.
pub fn verify_discovery(info: &InfoTables<'_>) -> Result<(), AcpiError> {
    if info.root.cpu_count == 0 {
        return Err(AcpiError::NoCpus);
    }
    if info.root.ioapic_count == 0 {
        return Err(AcpiError::NoIoapics);
    }
    Ok(())
}

fn walk_root_table(rsdp: &Rsdp, info: &mut InfoTables<'_>) -> Result<(), AcpiError> {
    let root_paddr = if rsdp.revision == 0 {
        rsdp.rsdt_address as u64
    } else {
        rsdp.xsdt_address
    };

    let bytes = unsafe { table_bytes(root_paddr) }.ok_or(AcpiError::RootTableInvalid)?;
    let root = RootTable::parse(bytes, root_entry_stride(rsdp.revision))?;

    for entry_paddr in root.entries() {
        let Some(table) = (unsafe { table_bytes(entry_paddr) }) else {
            continue;
        };
        dispatch_table(table, info);
    }
    Ok(())
}

/// Validate one pointed-to table and, when it is the MADT, fold it in.
/// Dispatch matches on the exact MADT signature; anything else is ignored.
fn dispatch_table(table: &[u8], info: &mut InfoTables<'_>) {
    if !checksum_ok(table) {
        klog_warn!("ACPI: table with invalid checksum, skipping");
        return;
    }
    if table[..4] != *MADT_SIGNATURE {
        return;
    }
    if let Some(madt) = Madt::from_bytes(table) {
        apply_madt(&madt, info);
    }
}

/// Fold one MADT into the info tables.
pub fn apply_madt(madt: &Madt<'_>, info: &mut InfoTables<'_>) {
    info.root.lapic_paddr = madt.lapic_address() as u64;
    if madt.pcat_compat() {
        info.root.insert_flags(RootFlags::PCAT_COMPAT);
    }

    for entry in madt.entries() {
        match entry {
            MadtEntry::LocalApic(cpu) => apply_local_apic(cpu.apic_id, cpu.acpi_id, info),
            MadtEntry::Ioapic(ioapic) => apply_ioapic(ioapic.id, ioapic.address, ioapic.gsi_base, info),
            MadtEntry::InterruptOverride(iso) => apply_override(&iso, info),
            MadtEntry::Unknown { entry_type } => {
                klog_debug!("ACPI: ignoring MADT entry type {}", entry_type);
            }
        }
    }
}

fn apply_local_apic(apic_id: u8, acpi_id: u8, info: &mut InfoTables<'_>) {
    let Some(slot) = info.cpus.get_mut(apic_id as usize) else {
        klog_warn!("ACPI: CPU apic id {} exceeds table capacity, skipping", apic_id);
        return;
    };

    slot.apic_id = apic_id;
    slot.acpi_id = acpi_id;
    slot.insert_flags(CpuFlags::PRESENT);

    info.root.cpu_count_active += 1;
    let new_count = apic_id as u16 + 1;
    if info.root.cpu_count < new_count {
        info.root.cpu_count = new_count;
    }
}

fn apply_ioapic(id: u8, address: u32, gsi_base: u32, info: &mut InfoTables<'_>) {
    let index = info.root.ioapic_count as usize;
    let Some(slot) = info.ioapics.get_mut(index) else {
        klog_warn!("ACPI: IO-APIC table full, skipping apic id {}", id);
        return;
    };

    slot.apic_id = id;
    slot.mmio_paddr = address as u64;
    slot.gsi_base = gsi_base;
    info.root.ioapic_count += 1;
}

fn apply_override(iso: &crate::madt::InterruptOverride, info: &mut InfoTables<'_>) {
    if iso.bus_source != ISO_BUS_ISA {
        return;
    }
    let Some(line) = IrqLine::new(iso.irq_source) else {
        return;
    };

    info.root.irq_to_gsi[line.index()] = iso.gsi;

    // Flags merge with whatever earlier overrides set; they never clear.
    use helios_abi::IrqFlags;
    let mut flags = IrqFlags::empty();
    if iso.active_low() {
        flags |= IrqFlags::ACTIVE_LOW;
    }
    if iso.level_triggered() {
        flags |= IrqFlags::LEVEL;
    }
    info.root.irq_flags[line.index()] |= flags.bits();
}
