//! # Root/Extended System Description Pointer

use crate::header::{array, read_u32, read_u64, write_u32, write_u64};
use crate::{PhysMapRo, PhysReader, WalkError, sum, update_checksum};
use log::warn;

pub const RSDP_SIGNATURE: &[u8; 8] = b"RSD PTR ";

/// Bytes covered by the ACPI 1.0 checksum.
pub const RSDP_V1_SIZE: usize = 20;

/// Size of the ACPI 2.0+ structure, covered by the extended checksum.
pub const RSDP_V2_SIZE: usize = 36;

pub const CHECKSUM_OFFSET: usize = 8;
pub const OEM_ID_OFFSET: usize = 9;
pub const REVISION_OFFSET: usize = 15;
pub const RSDT_ADDRESS_OFFSET: usize = 16;
pub const LENGTH_OFFSET: usize = 20;
pub const XSDT_ADDRESS_OFFSET: usize = 24;
pub const EXTENDED_CHECKSUM_OFFSET: usize = 32;

/// The root table addresses an RSDP points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcpiRoots {
    pub rsdp_addr: u64,
    pub revision: u8,
    pub oem_id: [u8; 6],
    pub rsdt_addr: Option<u64>,
    pub xsdt_addr: Option<u64>,
}

impl AcpiRoots {
    /// Reads the RSDP at `rsdp_addr`.
    ///
    /// A wrong signature is fatal. Checksum mismatches are reported but
    /// tolerated, since real firmware ships them.
    ///
    /// # Errors
    /// * [`WalkError::RootNotMapped`] if the structure is outside the memory map.
    /// * [`WalkError::BadRootSignature`] if there is no RSDP at the address.
    pub fn parse<M: PhysMapRo>(reader: &PhysReader<'_, M>, rsdp_addr: u64) -> Result<Self, WalkError> {
        let v1 = reader
            .read(rsdp_addr, RSDP_V1_SIZE)
            .map_err(|_| WalkError::RootNotMapped(rsdp_addr))?;

        if !v1.starts_with(RSDP_SIGNATURE) {
            return Err(WalkError::BadRootSignature(rsdp_addr));
        }
        if sum(v1) != 0 {
            warn!("RSDP at {rsdp_addr:#x} has a bad checksum");
        }

        let revision = v1[REVISION_OFFSET];
        let oem_id = array(v1, OEM_ID_OFFSET).unwrap_or_default();
        let rsdt_addr = read_u32(v1, RSDT_ADDRESS_OFFSET)
            .map(u64::from)
            .filter(|&a| a != 0);

        let mut xsdt_addr = None;
        if revision >= 2 {
            let v2 = reader
                .read(rsdp_addr, RSDP_V2_SIZE)
                .map_err(|_| WalkError::RootNotMapped(rsdp_addr))?;
            let length = read_u32(v2, LENGTH_OFFSET)
                .and_then(|l| usize::try_from(l).ok())
                .unwrap_or(RSDP_V2_SIZE)
                .max(RSDP_V2_SIZE);

            match reader.read(rsdp_addr, length) {
                Ok(full) if sum(full) != 0 => {
                    warn!("RSDP at {rsdp_addr:#x} has a bad extended checksum");
                }
                Ok(_) => {}
                Err(e) => warn!("RSDP at {rsdp_addr:#x} claims {length} bytes: {e}"),
            }

            xsdt_addr = read_u64(v2, XSDT_ADDRESS_OFFSET).filter(|&a| a != 0);
        }

        Ok(Self {
            rsdp_addr,
            revision,
            oem_id,
            rsdt_addr,
            xsdt_addr,
        })
    }

    /// The root table to walk and the size of its entries.
    /// The XSDT wins whenever the RSDP is new enough to carry one.
    #[must_use]
    pub const fn root_table(&self) -> Option<(u64, usize)> {
        match (self.xsdt_addr, self.rsdt_addr) {
            (Some(xsdt), _) => Some((xsdt, 8)),
            (None, Some(rsdt)) => Some((rsdt, 4)),
            (None, None) => None,
        }
    }
}

/// Writes a fresh ACPI 2.0 RSDP into `out` and checksums it.
/// Returns `false` if `out` is shorter than [`RSDP_V2_SIZE`].
pub fn write_rsdp(out: &mut [u8], oem_id: &[u8; 6], xsdt_addr: u64) -> bool {
    let Some(out) = out.get_mut(..RSDP_V2_SIZE) else {
        return false;
    };
    out.fill(0);
    out[..8].copy_from_slice(RSDP_SIGNATURE);
    out[OEM_ID_OFFSET..OEM_ID_OFFSET + 6].copy_from_slice(oem_id);
    out[REVISION_OFFSET] = 2;
    write_u32(out, LENGTH_OFFSET, 36);
    write_u64(out, XSDT_ADDRESS_OFFSET, xsdt_addr);
    update_checksums(out);
    true
}

/// Recomputes both RSDP checksums. The legacy one covers the first
/// 20 bytes, the extended one the whole structure.
pub fn update_checksums(rsdp: &mut [u8]) {
    if let Some(v1) = rsdp.get_mut(..RSDP_V1_SIZE) {
        update_checksum(v1, CHECKSUM_OFFSET);
    }
    if let Some(v2) = rsdp.get_mut(..RSDP_V2_SIZE) {
        update_checksum(v2, EXTENDED_CHECKSUM_OFFSET);
    }
}
