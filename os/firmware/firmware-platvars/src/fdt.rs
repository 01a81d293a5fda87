//! # Flattened Device Tree Root Properties
//!
//! Only the root node's own properties are read; the scan stops at the
//! first child node.

/// FDT magic number: `0xd00dfeed` in big-endian.
pub const FDT_MAGIC: u32 = 0xd00d_feed;

/// Size of the header in bytes.
pub const HEADER_SIZE: usize = 40;

/// Exported `compatible` strings are capped at this many.
pub const MAX_COMPATIBLE: usize = 10;

const FDT_BEGIN_NODE: u32 = 0x0000_0001;
const FDT_END_NODE: u32 = 0x0000_0002;
const FDT_PROP: u32 = 0x0000_0003;
const FDT_NOP: u32 = 0x0000_0004;

fn read_be32_at(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..)?
        .first_chunk::<4>()
        .map(|b| u32::from_be_bytes(*b))
}

const fn align4(offset: usize) -> usize {
    (offset + 3) & !3
}

/// The header fields the tools need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdtHeader {
    pub magic: u32,
    pub total_size: u32,
    pub off_dt_struct: u32,
    pub off_dt_strings: u32,
    pub size_dt_strings: u32,
    pub size_dt_struct: u32,
}

impl FdtHeader {
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            magic: read_be32_at(bytes, 0)?,
            total_size: read_be32_at(bytes, 4)?,
            off_dt_struct: read_be32_at(bytes, 8)?,
            off_dt_strings: read_be32_at(bytes, 12)?,
            size_dt_strings: read_be32_at(bytes, 32)?,
            size_dt_struct: read_be32_at(bytes, 36)?,
        })
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.magic == FDT_MAGIC
    }
}

/// The root node's `model` and `compatible` properties.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RootInfo<'a> {
    pub model: Option<&'a [u8]>,
    pub compatible: Compatible<'a>,
}

/// Reads the root node of the blob in `fdt`.
#[must_use]
pub fn root_info(fdt: &[u8]) -> Option<RootInfo<'_>> {
    let header = FdtHeader::parse(fdt)?;
    if !header.is_valid() {
        return None;
    }

    let struct_start = header.off_dt_struct as usize;
    let strings_start = header.off_dt_strings as usize;
    let structs = fdt.get(struct_start..struct_start + header.size_dt_struct as usize)?;
    let strings = fdt.get(strings_start..strings_start + header.size_dt_strings as usize)?;

    let mut offset = 0;
    while read_be32_at(structs, offset)? == FDT_NOP {
        offset += 4;
    }
    if read_be32_at(structs, offset)? != FDT_BEGIN_NODE {
        return None;
    }
    offset += 4;
    let name_len = structs.get(offset..)?.iter().position(|&b| b == 0)?;
    offset = align4(offset + name_len + 1);

    let mut info = RootInfo::default();
    loop {
        let token = read_be32_at(structs, offset)?;
        offset += 4;
        match token {
            FDT_PROP => {
                let len = read_be32_at(structs, offset)? as usize;
                let name_off = read_be32_at(structs, offset + 4)? as usize;
                let value = structs.get(offset + 8..offset + 8 + len)?;
                offset = align4(offset + 8 + len);

                let name = strings.get(name_off..)?;
                let name = &name[..name.iter().position(|&b| b == 0)?];
                match name {
                    b"model" => info.model = Some(trim_nul(value)),
                    b"compatible" => info.compatible = Compatible::new(value),
                    _ => {}
                }
            }
            FDT_NOP => {}
            FDT_BEGIN_NODE | FDT_END_NODE => return Some(info),
            _ => return None,
        }
    }
}

fn trim_nul(value: &[u8]) -> &[u8] {
    value.strip_suffix(&[0]).unwrap_or(value)
}

/// The NUL-separated string list of a `compatible` property.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Compatible<'a>(&'a [u8]);

impl<'a> Compatible<'a> {
    #[must_use]
    pub const fn new(raw: &'a [u8]) -> Self {
        Self(raw)
    }

    /// The strings, in order, at most [`MAX_COMPATIBLE`] of them.
    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.0
            .split(|&b| b == 0)
            .filter(|s| !s.is_empty())
            .take(MAX_COMPATIBLE)
    }
}
