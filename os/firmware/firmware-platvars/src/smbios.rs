//! # SMBIOS Structure Table
//!
//! Each structure is a formatted area (`type`, `length`, `handle`, data)
//! followed by a string set: NUL-terminated strings, ended by an extra NUL.
//! A structure without strings is followed by two NULs.

pub const SMBIOS2_ANCHOR: &[u8; 4] = b"_SM_";
pub const SMBIOS3_ANCHOR: &[u8; 5] = b"_SM3_";

/// Bytes of the 2.x entry point read by [`EntryPoint::parse_v2`].
pub const SMBIOS2_ENTRY_SIZE: usize = 0x1f;
/// Bytes of the 3.x entry point read by [`EntryPoint::parse_v3`].
pub const SMBIOS3_ENTRY_SIZE: usize = 0x18;

/// Type of the end-of-table structure.
pub const END_OF_TABLE: u8 = 127;

const HEADER_SIZE: usize = 4;

/// Where a structure table lives, as announced by an entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    pub table_address: u64,
    /// Exact size for 2.x, an upper bound for 3.x.
    pub table_length: usize,
    /// Whether `table_length` is only an upper bound.
    pub bounded: bool,
}

impl EntryPoint {
    /// Reads a `_SM_` entry point.
    #[must_use]
    pub fn parse_v2(bytes: &[u8]) -> Option<Self> {
        if !bytes.starts_with(SMBIOS2_ANCHOR) {
            return None;
        }
        let length = u16::from_le_bytes(*bytes.get(0x16..)?.first_chunk::<2>()?);
        let address = u32::from_le_bytes(*bytes.get(0x18..)?.first_chunk::<4>()?);
        Some(Self {
            table_address: u64::from(address),
            table_length: usize::from(length),
            bounded: false,
        })
    }

    /// Reads a `_SM3_` entry point.
    #[must_use]
    pub fn parse_v3(bytes: &[u8]) -> Option<Self> {
        if !bytes.starts_with(SMBIOS3_ANCHOR) {
            return None;
        }
        let max_size = u32::from_le_bytes(*bytes.get(0x0c..)?.first_chunk::<4>()?);
        let address = u64::from_le_bytes(*bytes.get(0x10..)?.first_chunk::<8>()?);
        Some(Self {
            table_address: address,
            table_length: usize::try_from(max_size).ok()?,
            bounded: true,
        })
    }
}

/// One structure of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Structure<'a> {
    pub kind: u8,
    pub handle: u16,
    strings: &'a [u8],
}

impl<'a> Structure<'a> {
    /// String number `number`, counting from 1. Number 0 means "no string".
    #[must_use]
    pub fn string(&self, number: u8) -> Option<&'a [u8]> {
        if number == 0 {
            return None;
        }
        self.strings
            .split(|&b| b == 0)
            .take_while(|s| !s.is_empty())
            .nth(usize::from(number) - 1)
    }
}

/// Iterates the structures in `table`. Stops at the end of the slice or at
/// the first structure that does not fit.
pub struct Structures<'a> {
    table: &'a [u8],
    offset: usize,
}

impl<'a> Structures<'a> {
    #[must_use]
    pub const fn new(table: &'a [u8]) -> Self {
        Self { table, offset: 0 }
    }

    /// Offset of the next structure.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for Structures<'a> {
    type Item = Structure<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.table.get(self.offset..)?;
        let header = rest.first_chunk::<HEADER_SIZE>()?;
        let kind = header[0];
        let length = usize::from(header[1]).max(HEADER_SIZE);
        let handle = u16::from_le_bytes([header[2], header[3]]);

        let strings = rest.get(length..)?;
        let set_len = string_set_len(strings)?;

        self.offset += length + set_len;
        Some(Structure {
            kind,
            handle,
            strings: &strings[..set_len],
        })
    }
}

/// Length of the string set at the start of `bytes`, terminator included.
fn string_set_len(bytes: &[u8]) -> Option<usize> {
    // The set ends at the first double NUL; an empty set is just that.
    bytes
        .windows(2)
        .position(|w| w == [0, 0])
        .map(|p| p + 2)
}

/// Length of an SMBIOS 3 table: everything up to and including the
/// end-of-table structure. Gives up once the length passes `max_size`.
#[must_use]
pub fn table3_length(table: &[u8], max_size: usize) -> usize {
    let mut walk = Structures::new(table);
    while let Some(structure) = walk.next() {
        if structure.kind == END_OF_TABLE || walk.offset() > max_size {
            return walk.offset();
        }
    }
    walk.offset()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure(kind: u8, formatted: &[u8], strings: &[&str]) -> Vec<u8> {
        let mut out = vec![kind, u8::try_from(HEADER_SIZE + formatted.len()).unwrap(), 0x34, 0x12];
        out.extend_from_slice(formatted);
        for s in strings {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        if strings.is_empty() {
            out.push(0);
        }
        out.push(0);
        out
    }

    #[test]
    fn strings_by_number() {
        let raw = structure(0, &[1, 2, 0, 3], &["Vendor", "1.0", "01/01/2024"]);
        let s = Structures::new(&raw).next().unwrap();
        assert_eq!(s.kind, 0);
        assert_eq!(s.handle, 0x1234);
        assert_eq!(s.string(0), None);
        assert_eq!(s.string(1), Some(&b"Vendor"[..]));
        assert_eq!(s.string(3), Some(&b"01/01/2024"[..]));
        assert_eq!(s.string(4), None);
    }

    #[test]
    fn structures_without_strings() {
        let mut raw = structure(4, &[0; 8], &[]);
        raw.extend(structure(1, &[], &["Maker"]));
        raw.extend(structure(END_OF_TABLE, &[], &[]));

        let kinds: Vec<u8> = Structures::new(&raw).map(|s| s.kind).collect();
        assert_eq!(kinds, [4, 1, END_OF_TABLE]);
        assert_eq!(Structures::new(&raw).next().unwrap().string(1), None);
    }

    #[test]
    fn truncated_structure_ends_the_walk() {
        let mut raw = structure(0, &[], &["A"]);
        raw.extend_from_slice(&[1, 8, 0, 0, b'x']);
        assert_eq!(Structures::new(&raw).count(), 1);
    }

    #[test]
    fn v3_length_stops_at_end_marker() {
        let mut raw = structure(0, &[], &["A"]);
        let end = raw.len() + structure(END_OF_TABLE, &[], &[]).len();
        raw.extend(structure(END_OF_TABLE, &[], &[]));
        raw.extend(structure(1, &[], &["after"]));

        assert_eq!(table3_length(&raw, 4096), end);
        // A too small bound stops the walk at the first structure past it.
        assert_eq!(table3_length(&raw, 2), 7);
    }

    #[test]
    fn entry_points() {
        let mut v2 = [0u8; SMBIOS2_ENTRY_SIZE];
        v2[..4].copy_from_slice(SMBIOS2_ANCHOR);
        v2[0x16..0x18].copy_from_slice(&0x1a0u16.to_le_bytes());
        v2[0x18..0x1c].copy_from_slice(&0x000f_0000u32.to_le_bytes());
        assert_eq!(
            EntryPoint::parse_v2(&v2),
            Some(EntryPoint {
                table_address: 0xf_0000,
                table_length: 0x1a0,
                bounded: false
            })
        );
        assert_eq!(EntryPoint::parse_v3(&v2), None);

        let mut v3 = [0u8; SMBIOS3_ENTRY_SIZE];
        v3[..5].copy_from_slice(SMBIOS3_ANCHOR);
        v3[0x0c..0x10].copy_from_slice(&0x2000u32.to_le_bytes());
        v3[0x10..0x18].copy_from_slice(&0x1_0000_0000u64.to_le_bytes());
        let ep = EntryPoint::parse_v3(&v3).unwrap();
        assert_eq!(ep.table_address, 0x1_0000_0000);
        assert_eq!(ep.table_length, 0x2000);
        assert!(ep.bounded);
    }
}
