//! MADT (multi-APIC description table) entry iteration.
//!
//! The MADT is a fixed header followed by a chain of variable-length,
//! self-describing records. The iterator bounds every declared record
//! length against the remaining buffer; a zero or overrunning length ends
//! the walk instead of running off the table.

use crate::tables::SdtHeader;

pub const MADT_SIGNATURE: &[u8; 4] = b"APIC";

/// MADT header flag: the system also has a legacy 8259 PIC pair.
const MADT_PCAT_COMPAT: u32 = 1 << 0;

/// MADT fixed header: SDT header + local APIC address + flags.
const MADT_HEADER_LEN: usize = SdtHeader::SIZE + 8;

const ENTRY_LOCAL_APIC: u8 = 0;
const ENTRY_IOAPIC: u8 = 1;
const ENTRY_INTERRUPT_OVERRIDE: u8 = 2;

const ENTRY_HEADER_LEN: usize = 2;
const LOCAL_APIC_ENTRY_LEN: usize = 8;
const IOAPIC_ENTRY_LEN: usize = 12;
const ISO_ENTRY_LEN: usize = 10;

/// The ISA bus, the only bus interrupt-source overrides apply to.
pub const ISO_BUS_ISA: u8 = 1;

const ISO_POLARITY_ACTIVE_LOW: u16 = 0b11;
const ISO_TRIGGER_LEVEL: u16 = 0b11;
const ISO_TRIGGER_SHIFT: u16 = 2;

/// Processor local-APIC record (type 0).
#[derive(Clone, Copy, Debug)]
pub struct LocalApicInfo {
    pub acpi_id: u8,
    pub apic_id: u8,
    pub flags: u32,
}

/// IO-APIC record (type 1).
#[derive(Clone, Copy, Debug)]
pub struct IoapicInfo {
    pub id: u8,
    pub address: u32,
    pub gsi_base: u32,
}

/// Interrupt-source-override record (type 2).
#[derive(Clone, Copy, Debug)]
pub struct InterruptOverride {
    pub bus_source: u8,
    pub irq_source: u8,
    pub gsi: u32,
    pub flags: u16,
}

impl InterruptOverride {
    /// The line is active low (polarity field set to the active-low value).
    #[inline]
    pub fn active_low(&self) -> bool {
        self.flags & 0b11 == ISO_POLARITY_ACTIVE_LOW
    }

    /// The line is level triggered.
    #[inline]
    pub fn level_triggered(&self) -> bool {
        (self.flags >> ISO_TRIGGER_SHIFT) & 0b11 == ISO_TRIGGER_LEVEL
    }
}

#[derive(Clone, Copy, Debug)]
pub enum MadtEntry {
    LocalApic(LocalApicInfo),
    Ioapic(IoapicInfo),
    InterruptOverride(InterruptOverride),
    Unknown { entry_type: u8 },
}

/// Parsed handle to a MADT, supporting iteration over its entries.
pub struct Madt<'a> {
    bytes: &'a [u8],
}

impl<'a> Madt<'a> {
    /// Wrap a checksum-validated table whose signature is already known to
    /// be [`MADT_SIGNATURE`]. Returns `None` when the buffer is too short
    /// to carry the MADT header.
    pub fn from_bytes(bytes: &'a [u8]) -> Option<Self> {
        if bytes.len() < MADT_HEADER_LEN {
            return None;
        }
        Some(Self { bytes })
    }

    /// Physical address of the local APIC MMIO window.
    pub fn lapic_address(&self) -> u32 {
        read_u32(self.bytes, SdtHeader::SIZE)
    }

    /// Whether the system also carries a legacy PIC pair.
    pub fn pcat_compat(&self) -> bool {
        read_u32(self.bytes, SdtHeader::SIZE + 4) & MADT_PCAT_COMPAT != 0
    }

    pub fn entries(&self) -> MadtEntries<'a> {
        MadtEntries {
            remaining: &self.bytes[MADT_HEADER_LEN..],
        }
    }
}

pub struct MadtEntries<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for MadtEntries<'a> {
    type Item = MadtEntry;

    fn next(&mut self) -> Option<MadtEntry> {
        if self.remaining.len() < ENTRY_HEADER_LEN {
            return None;
        }

        let entry_type = self.remaining[0];
        let length = self.remaining[1] as usize;
        if length < ENTRY_HEADER_LEN || length > self.remaining.len() {
            // A zero or overrunning declared length would never terminate
            // the walk; stop here.
            return None;
        }

        let record = &self.remaining[..length];
        self.remaining = &self.remaining[length..];

        let entry = match entry_type {
            ENTRY_LOCAL_APIC if length >= LOCAL_APIC_ENTRY_LEN => {
                MadtEntry::LocalApic(LocalApicInfo {
                    acpi_id: record[2],
                    apic_id: record[3],
                    flags: read_u32(record, 4),
                })
            }
            ENTRY_IOAPIC if length >= IOAPIC_ENTRY_LEN => MadtEntry::Ioapic(IoapicInfo {
                id: record[2],
                address: read_u32(record, 4),
                gsi_base: read_u32(record, 8),
            }),
            ENTRY_INTERRUPT_OVERRIDE if length >= ISO_ENTRY_LEN => {
                MadtEntry::InterruptOverride(InterruptOverride {
                    bus_source: record[2],
                    irq_source: record[3],
                    gsi: read_u32(record, 4),
                    flags: read_u16(record, 8),
                })
            }
            t => MadtEntry::Unknown { entry_type: t },
        };

        Some(entry)
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
