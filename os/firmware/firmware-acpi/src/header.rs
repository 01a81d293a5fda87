//! # System Description Table Header
//!
//! Every ACPI table except the FACS starts with the same 36-byte header.
//! The FACS shares only the signature and length fields.

use crate::Signature;

pub const SIGNATURE_OFFSET: usize = 0;
pub const LENGTH_OFFSET: usize = 4;
pub const REVISION_OFFSET: usize = 8;
pub const CHECKSUM_OFFSET: usize = 9;
pub const OEM_ID_OFFSET: usize = 10;
pub const OEM_TABLE_ID_OFFSET: usize = 16;
pub const OEM_REVISION_OFFSET: usize = 24;
pub const CREATOR_ID_OFFSET: usize = 28;
pub const CREATOR_REVISION_OFFSET: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptionHeader {
    pub signature: Signature,
    pub length: u32,
    pub revision: u8,
    pub checksum: u8,
    pub oem_id: [u8; 6],
    pub oem_table_id: [u8; 8],
    pub oem_revision: u32,
    pub creator_id: [u8; 4],
    pub creator_revision: u32,
}

impl DescriptionHeader {
    pub const SIZE: usize = 36;

    /// Decodes the header at the start of `bytes`.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..Self::SIZE)?;
        Some(Self {
            signature: Signature::from_table(bytes)?,
            length: read_u32(bytes, LENGTH_OFFSET)?,
            revision: bytes[REVISION_OFFSET],
            checksum: bytes[CHECKSUM_OFFSET],
            oem_id: array(bytes, OEM_ID_OFFSET)?,
            oem_table_id: array(bytes, OEM_TABLE_ID_OFFSET)?,
            oem_revision: read_u32(bytes, OEM_REVISION_OFFSET)?,
            creator_id: array(bytes, CREATOR_ID_OFFSET)?,
            creator_revision: read_u32(bytes, CREATOR_REVISION_OFFSET)?,
        })
    }

    /// Encodes the header into the first [`Self::SIZE`] bytes of `out`.
    /// Returns `false` if `out` is too short.
    pub fn write(&self, out: &mut [u8]) -> bool {
        let Some(out) = out.get_mut(..Self::SIZE) else {
            return false;
        };
        out[..4].copy_from_slice(self.signature.as_bytes());
        write_u32(out, LENGTH_OFFSET, self.length);
        out[REVISION_OFFSET] = self.revision;
        out[CHECKSUM_OFFSET] = self.checksum;
        out[OEM_ID_OFFSET..OEM_ID_OFFSET + 6].copy_from_slice(&self.oem_id);
        out[OEM_TABLE_ID_OFFSET..OEM_TABLE_ID_OFFSET + 8].copy_from_slice(&self.oem_table_id);
        write_u32(out, OEM_REVISION_OFFSET, self.oem_revision);
        out[CREATOR_ID_OFFSET..CREATOR_ID_OFFSET + 4].copy_from_slice(&self.creator_id);
        write_u32(out, CREATOR_REVISION_OFFSET, self.creator_revision);
        true
    }
}

/// The length field shared by every table, the FACS included.
#[must_use]
pub fn declared_length(bytes: &[u8]) -> Option<u32> {
    read_u32(bytes, LENGTH_OFFSET)
}

pub(crate) fn array<const N: usize>(bytes: &[u8], offset: usize) -> Option<[u8; N]> {
    bytes.get(offset..)?.first_chunk::<N>().copied()
}

#[must_use]
pub fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    array(bytes, offset).map(u32::from_le_bytes)
}

#[must_use]
pub fn read_u64(bytes: &[u8], offset: usize) -> Option<u64> {
    array(bytes, offset).map(u64::from_le_bytes)
}

pub(crate) fn write_u32(bytes: &mut [u8], offset: usize, value: u32) -> bool {
    write_array(bytes, offset, value.to_le_bytes())
}

pub(crate) fn write_u64(bytes: &mut [u8], offset: usize, value: u64) -> bool {
    write_array(bytes, offset, value.to_le_bytes())
}

fn write_array<const N: usize>(bytes: &mut [u8], offset: usize, value: [u8; N]) -> bool {
    match bytes.get_mut(offset..offset.saturating_add(N)) {
        Some(dst) if dst.len() == N => {
            dst.copy_from_slice(&value);
            true
        }
        _ => false,
    }
}
