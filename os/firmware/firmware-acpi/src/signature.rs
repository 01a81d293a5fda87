//! # Table Signatures

use core::fmt;

/// The 4-byte ASCII tag at the start of every ACPI table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature(pub [u8; 4]);

impl Signature {
    pub const FADT: Self = Self(*b"FACP");
    pub const FACS: Self = Self(*b"FACS");
    pub const DSDT: Self = Self(*b"DSDT");
    pub const RSDT: Self = Self(*b"RSDT");
    pub const XSDT: Self = Self(*b"XSDT");
    /// UEFI ACPI data table. Its contents may be updated by the OS.
    pub const UEFI: Self = Self(*b"UEFI");

    /// Reads the signature at the start of `bytes`.
    #[must_use]
    pub fn from_table(bytes: &[u8]) -> Option<Self> {
        bytes.first_chunk::<4>().copied().map(Self)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Tables that live in NVS memory because firmware or the OS writes to
    /// them after boot.
    #[must_use]
    pub fn needs_nvs(self) -> bool {
        self == Self::FACS || self == Self::UEFI
    }

    /// Tables only reachable through the FADT, never listed in the XSDT.
    #[must_use]
    pub fn is_fadt_child(self) -> bool {
        self == Self::FACS || self == Self::DSDT
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                char::from(b)
            } else {
                '?'
            };
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(\"{self}\")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_masks_binary() {
        assert_eq!(Signature::FADT.to_string(), "FACP");
        assert_eq!(Signature([b'A', 0, 0xff, b' ']).to_string(), "A?? ");
    }

    #[test]
    fn from_short_slice() {
        assert_eq!(Signature::from_table(b"DSD"), None);
        assert_eq!(Signature::from_table(b"DSDT\x24"), Some(Signature::DSDT));
    }
}
