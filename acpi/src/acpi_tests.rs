//! Discovery tests over synthetic firmware tables.
//!
//! Every table here is built in a plain byte buffer, so the parser is
//! exercised exactly the way firmware-supplied memory would, minus the
//! hardware.

use helios_abi::{InfoCpu, InfoIoapic, InfoRoot, InfoTables, IrqFlags};
use helios_lib::testing::TestResult;
use helios_lib::{define_test_suite, klog_info};

use crate::AcpiError;
use crate::madt::{Madt, MadtEntry};
use crate::tables::{RootTable, checksum_ok, root_entry_stride, scan_for_rsdp};
use crate::{apply_madt, verify_discovery};

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Set `table[checksum_at]` so the whole buffer sums to zero mod 256.
fn seal(table: &mut [u8], checksum_at: usize) {
    table[checksum_at] = 0;
    let sum = table.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    table[checksum_at] = 0u8.wrapping_sub(sum);
}

/// Write a revision-0 RSDP at `offset`.
fn put_rsdp_v1(region: &mut [u8], offset: usize, rsdt_address: u32) {
    let rsdp = &mut region[offset..offset + 20];
    rsdp[..8].copy_from_slice(b"RSD PTR ");
    rsdp[9..15].copy_from_slice(b"HELIOS");
    rsdp[15] = 0; // revision
    rsdp[16..20].copy_from_slice(&rsdt_address.to_le_bytes());
    seal(rsdp, 8);
}

/// Write an SDT header with the given signature and total length, sealing
/// the checksum over `table[..length]` afterwards is the caller's job.
fn put_sdt_header(table: &mut [u8], signature: &[u8; 4]) {
    let length = table.len() as u32;
    table[..4].copy_from_slice(signature);
    table[4..8].copy_from_slice(&length.to_le_bytes());
    table[8] = 1; // revision
    table[10..16].copy_from_slice(b"HELIOS");
}

/// Synthetic MADT: header with `lapic_address`/`pcat` plus raw entry bytes.
fn build_madt(buffer: &mut [u8], lapic_address: u32, pcat: bool, entries: &[u8]) -> usize {
    let total = 44 + entries.len();
    put_sdt_header(&mut buffer[..total], b"APIC");
    buffer[36..40].copy_from_slice(&lapic_address.to_le_bytes());
    buffer[40..44].copy_from_slice(&u32::from(pcat).to_le_bytes());
    buffer[44..total].copy_from_slice(entries);
    seal(&mut buffer[..total], 9);
    total
}

fn local_apic_entry(acpi_id: u8, apic_id: u8) -> [u8; 8] {
    [0, 8, acpi_id, apic_id, 1, 0, 0, 0]
}

fn ioapic_entry(id: u8, address: u32, gsi_base: u32) -> [u8; 12] {
    let a = address.to_le_bytes();
    let g = gsi_base.to_le_bytes();
    [1, 12, id, 0, a[0], a[1], a[2], a[3], g[0], g[1], g[2], g[3]]
}

fn override_entry(bus: u8, irq: u8, gsi: u32, flags: u16) -> [u8; 10] {
    let g = gsi.to_le_bytes();
    let f = flags.to_le_bytes();
    [2, 10, bus, irq, g[0], g[1], g[2], g[3], f[0], f[1]]
}

/// Polarity active-low | trigger level, as encoded in ISO flags.
const ISO_LOW_LEVEL: u16 = 0b11 | (0b11 << 2);

fn with_info_tables<R>(f: impl FnOnce(&mut InfoTables<'_>) -> R) -> R {
    let mut root = InfoRoot::empty();
    let mut cpus = [InfoCpu::empty(); 16];
    let mut ioapics = [InfoIoapic::empty(); 4];
    let mut info = InfoTables::new(&mut root, &mut cpus, &mut ioapics);
    f(&mut info)
}

// ---------------------------------------------------------------------------
// Checksum validation
// ---------------------------------------------------------------------------

pub fn test_checksum_accepts_zero_sum() -> TestResult {
    let mut table = [7u8, 1, 2, 3, 4, 5];
    seal(&mut table, 0);
    if !checksum_ok(&table) {
        return TestResult::Fail;
    }
    TestResult::Pass
}

/// Flipping any single byte must flip the verdict.
pub fn test_checksum_rejects_any_single_byte_flip() -> TestResult {
    let mut table = [0x12u8, 0x34, 0x56, 0x78, 0x9A, 0];
    seal(&mut table, 5);

    for i in 0..table.len() {
        let mut corrupted = table;
        corrupted[i] ^= 0x40;
        if checksum_ok(&corrupted) {
            klog_info!("ACPI_TEST: BUG - checksum accepted flip at byte {}", i);
            return TestResult::Fail;
        }
    }
    TestResult::Pass
}

pub fn test_checksum_empty_is_valid() -> TestResult {
    if !checksum_ok(&[]) {
        return TestResult::Fail;
    }
    TestResult::Pass
}

// ---------------------------------------------------------------------------
// RSDP scan
// ---------------------------------------------------------------------------

pub fn test_rsdp_found_on_aligned_boundary() -> TestResult {
    let mut region = [0u8; 1024];
    put_rsdp_v1(&mut region, 64, 0x1234);
    match scan_for_rsdp(&region) {
        Some(64) => TestResult::Pass,
        other => {
            klog_info!("ACPI_TEST: BUG - scan returned {:?}", other);
            TestResult::Fail
        }
    }
}

pub fn test_rsdp_ignored_off_alignment() -> TestResult {
    let mut region = [0u8; 1024];
    // Same bytes, but 8 past a 16-byte boundary.
    put_rsdp_v1(&mut region, 72, 0x1234);
    if scan_for_rsdp(&region).is_some() {
        return TestResult::Fail;
    }
    TestResult::Pass
}

pub fn test_rsdp_bad_checksum_skipped() -> TestResult {
    let mut region = [0u8; 1024];
    put_rsdp_v1(&mut region, 0, 0x1234);
    region[16] ^= 0xFF; // corrupt the rsdt address without resealing
    put_rsdp_v1(&mut region, 256, 0x5678);

    // The corrupt candidate at 0 is skipped, the valid one at 256 wins.
    match scan_for_rsdp(&region) {
        Some(256) => TestResult::Pass,
        other => {
            klog_info!("ACPI_TEST: BUG - scan returned {:?}", other);
            TestResult::Fail
        }
    }
}

// ---------------------------------------------------------------------------
// Root table stride
// ---------------------------------------------------------------------------

pub fn test_root_stride_by_revision() -> TestResult {
    if root_entry_stride(0) != 4 || root_entry_stride(1) != 8 || root_entry_stride(2) != 8 {
        return TestResult::Fail;
    }
    TestResult::Pass
}

pub fn test_rsdt_entries_read_with_4_byte_stride() -> TestResult {
    let mut table = [0u8; 44]; // header + two 32-bit pointers
    put_sdt_header(&mut table, b"RSDT");
    table[36..40].copy_from_slice(&0x1111_2222u32.to_le_bytes());
    table[40..44].copy_from_slice(&0x3333_4444u32.to_le_bytes());
    seal(&mut table, 9);

    let root = match RootTable::parse(&table, root_entry_stride(0)) {
        Ok(root) => root,
        Err(_) => return TestResult::Fail,
    };
    let mut entries = root.entries();
    if entries.next() != Some(0x1111_2222)
        || entries.next() != Some(0x3333_4444)
        || entries.next().is_some()
    {
        return TestResult::Fail;
    }
    TestResult::Pass
}

pub fn test_xsdt_entries_read_with_8_byte_stride() -> TestResult {
    let mut table = [0u8; 52]; // header + two 64-bit pointers
    put_sdt_header(&mut table, b"XSDT");
    table[36..44].copy_from_slice(&0xAAAA_0000_1111u64.to_le_bytes());
    table[44..52].copy_from_slice(&0xBBBB_0000_2222u64.to_le_bytes());
    seal(&mut table, 9);

    let root = match RootTable::parse(&table, root_entry_stride(1)) {
        Ok(root) => root,
        Err(_) => return TestResult::Fail,
    };
    let mut entries = root.entries();
    if entries.next() != Some(0xAAAA_0000_1111)
        || entries.next() != Some(0xBBBB_0000_2222)
        || entries.next().is_some()
    {
        return TestResult::Fail;
    }
    TestResult::Pass
}

pub fn test_root_table_bad_checksum_is_fatal() -> TestResult {
    let mut table = [0u8; 40];
    put_sdt_header(&mut table, b"RSDT");
    // no seal - checksum stays wrong
    match RootTable::parse(&table, 4) {
        Err(AcpiError::RootTableInvalid) => TestResult::Pass,
        _ => TestResult::Fail,
    }
}

// ---------------------------------------------------------------------------
// MADT walk
// ---------------------------------------------------------------------------

pub fn test_madt_sparse_cpu_ids() -> TestResult {
    let mut entries = [0u8; 16];
    entries[..8].copy_from_slice(&local_apic_entry(1, 0));
    entries[8..].copy_from_slice(&local_apic_entry(2, 5));

    let mut buffer = [0u8; 128];
    let len = build_madt(&mut buffer, 0xFEE0_0000, false, &entries);
    let madt = Madt::from_bytes(&buffer[..len]).unwrap();

    with_info_tables(|info| {
        apply_madt(&madt, info);

        let cpu_count = info.root.cpu_count;
        let active = info.root.cpu_count_active;
        if cpu_count != 6 || active != 2 {
            klog_info!("ACPI_TEST: BUG - counts {}/{}", cpu_count, active);
            return TestResult::Fail;
        }
        for (id, cpu) in info.cpus.iter().enumerate() {
            let expect_present = id == 0 || id == 5;
            if cpu.is_present() != expect_present {
                klog_info!("ACPI_TEST: BUG - present flag wrong at slot {}", id);
                return TestResult::Fail;
            }
        }
        if info.cpus[5].acpi_id != 2 || info.cpus[5].apic_id != 5 {
            return TestResult::Fail;
        }
        TestResult::Pass
    })
}

pub fn test_madt_override_filtering() -> TestResult {
    let mut entries = [0u8; 20];
    // Wrong bus, and an out-of-range source line: both ignored.
    entries[..10].copy_from_slice(&override_entry(0, 3, 9, ISO_LOW_LEVEL));
    entries[10..].copy_from_slice(&override_entry(1, 16, 40, ISO_LOW_LEVEL));

    let mut buffer = [0u8; 128];
    let len = build_madt(&mut buffer, 0xFEE0_0000, false, &entries);
    let madt = Madt::from_bytes(&buffer[..len]).unwrap();

    with_info_tables(|info| {
        apply_madt(&madt, info);

        let untouched = InfoRoot::empty();
        for line in 0..16 {
            let gsi = info.root.irq_to_gsi[line];
            let flags = info.root.irq_flags[line];
            if gsi != untouched.irq_to_gsi[line] || flags != 0 {
                klog_info!("ACPI_TEST: BUG - line {} was modified", line);
                return TestResult::Fail;
            }
        }
        TestResult::Pass
    })
}

pub fn test_madt_override_flags_merge_without_clearing() -> TestResult {
    // First override sets level-trigger only, second sets active-low only;
    // the merged result must carry both.
    const ISO_LEVEL_ONLY: u16 = 0b11 << 2;
    const ISO_LOW_ONLY: u16 = 0b11;

    let mut entries = [0u8; 20];
    entries[..10].copy_from_slice(&override_entry(1, 4, 20, ISO_LEVEL_ONLY));
    entries[10..].copy_from_slice(&override_entry(1, 4, 21, ISO_LOW_ONLY));

    let mut buffer = [0u8; 128];
    let len = build_madt(&mut buffer, 0xFEE0_0000, false, &entries);
    let madt = Madt::from_bytes(&buffer[..len]).unwrap();

    with_info_tables(|info| {
        apply_madt(&madt, info);

        let gsi = info.root.irq_to_gsi[4];
        let flags = info.root.irq_flags[4];
        if gsi != 21 {
            return TestResult::Fail;
        }
        if flags != (IrqFlags::ACTIVE_LOW | IrqFlags::LEVEL).bits() {
            klog_info!("ACPI_TEST: BUG - merged flags 0x{:x}", flags);
            return TestResult::Fail;
        }
        TestResult::Pass
    })
}

pub fn test_madt_end_to_end() -> TestResult {
    let mut entries = [0u8; 38];
    entries[..8].copy_from_slice(&local_apic_entry(0, 0));
    entries[8..16].copy_from_slice(&local_apic_entry(1, 1));
    entries[16..28].copy_from_slice(&ioapic_entry(2, 0xFEC0_0000, 0));
    entries[28..].copy_from_slice(&override_entry(1, 0, 2, ISO_LOW_LEVEL));

    let mut buffer = [0u8; 128];
    let len = build_madt(&mut buffer, 0xFEE0_0000, true, &entries);
    let madt = Madt::from_bytes(&buffer[..len]).unwrap();

    with_info_tables(|info| {
        apply_madt(&madt, info);

        let root = *info.root;
        if root.cpu_count != 2 || root.cpu_count_active != 2 || root.ioapic_count != 1 {
            return TestResult::Fail;
        }
        if root.lapic_paddr != 0xFEE0_0000 || !root.has_flags(helios_abi::RootFlags::PCAT_COMPAT) {
            return TestResult::Fail;
        }
        if root.irq_to_gsi[0] != 2
            || root.irq_flags[0] != (IrqFlags::ACTIVE_LOW | IrqFlags::LEVEL).bits()
        {
            return TestResult::Fail;
        }
        let ioapic_mmio = info.ioapics[0].mmio_paddr;
        let ioapic_gsi_base = info.ioapics[0].gsi_base;
        if ioapic_mmio != 0xFEC0_0000 || ioapic_gsi_base != 0 {
            return TestResult::Fail;
        }
        if verify_discovery(info).is_err() {
            return TestResult::Fail;
        }
        TestResult::Pass
    })
}

pub fn test_madt_without_cpus_fails_verification() -> TestResult {
    let entries = ioapic_entry(0, 0xFEC0_0000, 0);

    let mut buffer = [0u8; 128];
    let len = build_madt(&mut buffer, 0xFEE0_0000, false, &entries);
    let madt = Madt::from_bytes(&buffer[..len]).unwrap();

    with_info_tables(|info| {
        apply_madt(&madt, info);
        match verify_discovery(info) {
            Err(AcpiError::NoCpus) => TestResult::Pass,
            other => {
                klog_info!("ACPI_TEST: BUG - verification returned {:?}", other);
                TestResult::Fail
            }
        }
    })
}

pub fn test_madt_without_ioapic_fails_verification() -> TestResult {
    let entries = local_apic_entry(0, 0);

    let mut buffer = [0u8; 128];
    let len = build_madt(&mut buffer, 0xFEE0_0000, false, &entries);
    let madt = Madt::from_bytes(&buffer[..len]).unwrap();

    with_info_tables(|info| {
        apply_madt(&madt, info);
        match verify_discovery(info) {
            Err(AcpiError::NoIoapics) => TestResult::Pass,
            _ => TestResult::Fail,
        }
    })
}

pub fn test_madt_overrunning_entry_length_stops_walk() -> TestResult {
    // A record declaring more bytes than remain must end the iteration.
    let mut entries = [0u8; 16];
    entries[..8].copy_from_slice(&local_apic_entry(0, 0));
    entries[8] = 1; // IO-APIC entry type
    entries[9] = 64; // declared length overruns the table

    let mut buffer = [0u8; 128];
    let len = build_madt(&mut buffer, 0xFEE0_0000, false, &entries);
    let madt = Madt::from_bytes(&buffer[..len]).unwrap();

    let mut seen = 0;
    for entry in madt.entries() {
        seen += 1;
        if !matches!(entry, MadtEntry::LocalApic(_)) {
            return TestResult::Fail;
        }
    }
    if seen != 1 {
        klog_info!("ACPI_TEST: BUG - walked {} entries", seen);
        return TestResult::Fail;
    }
    TestResult::Pass
}

define_test_suite!(
    acpi,
    [
        test_checksum_accepts_zero_sum,
        test_checksum_rejects_any_single_byte_flip,
        test_checksum_empty_is_valid,
        test_rsdp_found_on_aligned_boundary,
        test_rsdp_ignored_off_alignment,
        test_rsdp_bad_checksum_skipped,
        test_root_stride_by_revision,
        test_rsdt_entries_read_with_4_byte_stride,
        test_xsdt_entries_read_with_8_byte_stride,
        test_root_table_bad_checksum_is_fatal,
        test_madt_sparse_cpu_ids,
        test_madt_override_filtering,
        test_madt_override_flags_merge_without_clearing,
        test_madt_end_to_end,
        test_madt_without_cpus_fails_verification,
        test_madt_without_ioapic_fails_verification,
        test_madt_overrunning_entry_length_stops_walk,
    ]
);
