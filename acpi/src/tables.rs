//! RSDP location and root-table traversal.

use core::mem;
use core::ptr::read_unaligned;

use crate::AcpiError;

/// Start of the legacy BIOS area searched for the RSDP.
pub const BIOS_AREA_START: u64 = 0xE0000;
/// End (exclusive) of the legacy BIOS search area.
pub const BIOS_AREA_END: u64 = 0x10_0000;

pub const RSDP_SIGNATURE: &[u8; 8] = b"RSD PTR ";

/// Length of the revision-0 portion of the RSDP, covered by the first
/// checksum.
pub const RSDP_V1_LENGTH: usize = 20;

/// The RSDP signature is only ever placed on a 16-byte boundary.
pub const RSDP_ALIGNMENT: usize = 16;

#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct Rsdp {
    pub signature: [u8; 8],
    pub checksum: u8,
    pub oem_id: [u8; 6],
    pub revision: u8,
    pub rsdt_address: u32,
    pub length: u32,
    pub xsdt_address: u64,
    pub extended_checksum: u8,
    pub reserved: [u8; 3],
}

#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct SdtHeader {
    pub signature: [u8; 4],
    pub length: u32,
    pub revision: u8,
    pub checksum: u8,
    pub oem_id: [u8; 6],
    pub oem_table_id: [u8; 8],
    pub oem_revision: u32,
    pub creator_id: u32,
    pub creator_revision: u32,
}

impl SdtHeader {
    pub const SIZE: usize = mem::size_of::<SdtHeader>();
}

const _: () = assert!(SdtHeader::SIZE == 36);

/// A firmware table is valid iff the sum of all its bytes is zero mod 256.
pub fn checksum_ok(bytes: &[u8]) -> bool {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b)) == 0
}

fn rsdp_candidate_valid(bytes: &[u8]) -> bool {
    if bytes.len() < RSDP_V1_LENGTH || !checksum_ok(&bytes[..RSDP_V1_LENGTH]) {
        return false;
    }

    // Revision 0 only defines the first 20 bytes. Later revisions declare
    // their own length and carry a second checksum over all of it.
    let revision = bytes[15];
    if revision >= 1 {
        let length = u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]) as usize;
        if length < mem::size_of::<Rsdp>() || length > bytes.len() {
            return false;
        }
        if !checksum_ok(&bytes[..length]) {
            return false;
        }
    }

    true
}

/// Scan `region` for a valid RSDP, stepping on 16-byte boundaries. The
/// region's first byte must itself sit on a 16-byte physical boundary.
/// Returns the offset of the first fully-valid candidate.
pub fn scan_for_rsdp(region: &[u8]) -> Option<usize> {
    let mut offset = 0;
    while offset + RSDP_V1_LENGTH <= region.len() {
        let candidate = &region[offset..];
        if candidate[..RSDP_SIGNATURE.len()] == *RSDP_SIGNATURE && rsdp_candidate_valid(candidate) {
            return Some(offset);
        }
        offset += RSDP_ALIGNMENT;
    }
    None
}

/// Search the legacy BIOS area for the RSDP. Returns its physical address
/// and a copy of the structure.
///
/// # Safety
///
/// The BIOS area must be identity mapped.
pub unsafe fn find_rsdp() -> Option<(u64, Rsdp)> {
    let region = unsafe {
        core::slice::from_raw_parts(
            BIOS_AREA_START as *const u8,
            (BIOS_AREA_END - BIOS_AREA_START) as usize,
        )
    };
    let offset = scan_for_rsdp(region)?;
    let rsdp = unsafe { read_unaligned(region.as_ptr().add(offset) as *const Rsdp) };
    Some((BIOS_AREA_START + offset as u64, rsdp))
}

/// Pointer width of root-table entries for a given RSDP revision: the RSDT
/// holds 32-bit pointers, the XSDT 64-bit ones.
pub const fn root_entry_stride(revision: u8) -> usize {
    if revision == 0 { 4 } else { 8 }
}

/// A checksum-validated RSDT or XSDT.
pub struct RootTable<'a> {
    payload: &'a [u8],
    stride: usize,
}

impl<'a> RootTable<'a> {
    /// Validate the root table's checksum over its full length. An invalid
    /// root table is fatal: nothing below it can be trusted.
    pub fn parse(bytes: &'a [u8], stride: usize) -> Result<Self, AcpiError> {
        if bytes.len() < SdtHeader::SIZE || !checksum_ok(bytes) {
            return Err(AcpiError::RootTableInvalid);
        }
        Ok(Self {
            payload: &bytes[SdtHeader::SIZE..],
            stride,
        })
    }

    /// Physical addresses of the tables the root table points at.
    pub fn entries(&self) -> impl Iterator<Item = u64> + 'a {
        let stride = self.stride;
        let payload = self.payload;
        payload.chunks_exact(stride).map(move |chunk| {
            if stride == 8 {
                u64::from_le_bytes([
                    chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
                ])
            } else {
                u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as u64
            }
        })
    }
}

/// Borrow a firmware table at a physical address as a byte slice of its
/// declared length.
///
/// # Safety
///
/// `paddr` must be identity mapped for at least the declared length.
pub unsafe fn table_bytes(paddr: u64) -> Option<&'static [u8]> {
    if paddr == 0 {
        return None;
    }
    let header = unsafe { read_unaligned(paddr as *const SdtHeader) };
    let length = header.length as usize;
    if length < SdtHeader::SIZE {
        return None;
    }
    Some(unsafe { core::slice::from_raw_parts(paddr as *const u8, length) })
}
