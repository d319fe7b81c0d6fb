//! ACPI hardware discovery for the Helios loader.
//!
//! Only the subset of ACPI the loader needs: locating the RSDP, walking the
//! RSDT/XSDT, and interpreting the APIC description table (MADT) into the
//! info tables. Everything operates on bounded byte slices so malformed
//! firmware tables can never walk the parser out of its buffer.
//!
//! # Architecture
//!
//! - [`tables`]: checksum validation, RSDP scan, root-table traversal.
//! - [`madt`]: MADT entry iteration.
//! - [`discover`]: the top-level driver that fills the info tables.

#![no_std]

pub mod discover;
pub mod madt;
pub mod tables;

pub mod acpi_tests;

use core::fmt;

pub use discover::{apply_madt, discover, verify_discovery};

/// Fatal discovery failures. Any of these halts the boot; there is no
/// fallback path without CPU and interrupt-routing information.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcpiError {
    /// No valid RSDP in the legacy BIOS search area.
    RsdpNotFound,
    /// The RSDT/XSDT failed its own checksum or is truncated.
    RootTableInvalid,
    /// The MADT walk finished without a single processor record.
    NoCpus,
    /// The MADT walk finished without a single IO-APIC record.
    NoIoapics,
}

impl fmt::Display for AcpiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RsdpNotFound => f.write_str("could not find RSDP"),
            Self::RootTableInvalid => f.write_str("root table is invalid"),
            Self::NoCpus => f.write_str("no CPU information in ACPI tables"),
            Self::NoIoapics => f.write_str("no IO-APIC found in ACPI tables"),
        }
    }
}
