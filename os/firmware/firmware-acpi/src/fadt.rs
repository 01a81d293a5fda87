//! # FADT Pointer Fields
//!
//! The Fixed ACPI Description Table is the only way to reach the DSDT and
//! the FACS. Both are referenced twice: by a legacy 32-bit field and, from
//! FADT revision 3 on, by a 64-bit `X_` field that takes precedence.

use crate::header::{REVISION_OFFSET, read_u32, read_u64, write_u32, write_u64};
use log::warn;

pub const FIRMWARE_CTRL_OFFSET: usize = 36;
pub const DSDT_OFFSET: usize = 40;
pub const X_FIRMWARE_CTRL_OFFSET: usize = 132;
pub const X_DSDT_OFFSET: usize = 140;

/// Smallest FADT that carries the 64-bit pointer fields.
pub const X_FIELDS_MIN_LENGTH: usize = X_DSDT_OFFSET + 8;

/// Revision that introduced the 64-bit pointer fields.
pub const X_FIELDS_REVISION: u8 = 3;

/// Effective DSDT/FACS addresses of a FADT. Zero means absent.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FadtPointers {
    pub dsdt: u64,
    pub facs: u64,
}

impl FadtPointers {
    /// Reads the pointers of the FADT in `fadt`, which must not extend past
    /// the table's declared length. A non-zero 64-bit field wins over the
    /// legacy one on revision 3+ tables; fields beyond the end read as zero.
    #[must_use]
    pub fn read(fadt: &[u8], revision: u8) -> Self {
        let pick = |legacy: usize, extended: usize| {
            let x = if revision >= X_FIELDS_REVISION {
                read_u64(fadt, extended).unwrap_or(0)
            } else {
                0
            };
            if x != 0 {
                x
            } else {
                read_u32(fadt, legacy).map_or(0, u64::from)
            }
        };

        Self {
            dsdt: pick(DSDT_OFFSET, X_DSDT_OFFSET),
            facs: pick(FIRMWARE_CTRL_OFFSET, X_FIRMWARE_CTRL_OFFSET),
        }
    }
}

/// Points the FADT at a DSDT, or clears the reference when `addr` is zero.
pub fn set_dsdt(fadt: &mut [u8], addr: u64) {
    set_link(fadt, DSDT_OFFSET, X_DSDT_OFFSET, addr, "DSDT");
}

/// Points the FADT at a FACS, or clears the reference when `addr` is zero.
pub fn set_facs(fadt: &mut [u8], addr: u64) {
    set_link(fadt, FIRMWARE_CTRL_OFFSET, X_FIRMWARE_CTRL_OFFSET, addr, "FACS");
}

/// Fills the legacy field whenever the address fits in 32 bits, and the
/// 64-bit field whenever the table is long enough to have one.
///
/// Readers only trust the 64-bit fields from revision 3 on. An address
/// above 4 GiB in a longer table of an older revision therefore raises the
/// table to revision 3; the caller re-checksums the table.
fn set_link(fadt: &mut [u8], legacy: usize, extended: usize, addr: u64, what: &str) {
    let narrow = u32::try_from(addr).ok();
    write_u32(fadt, legacy, narrow.unwrap_or(0));

    if fadt.len() < extended + 8 {
        if narrow.is_none() {
            warn!("FADT of {} bytes cannot reference the {what} at {addr:#x}", fadt.len());
        }
        return;
    }

    write_u64(fadt, extended, addr);
    if narrow.is_none()
        && let Some(revision) = fadt.get_mut(REVISION_OFFSET)
        && *revision < X_FIELDS_REVISION
    {
        warn!("FADT revision {revision} raised to {X_FIELDS_REVISION} to reach the {what} at {addr:#x}");
        *revision = X_FIELDS_REVISION;
    }
}
