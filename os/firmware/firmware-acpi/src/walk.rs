//! # Table Discovery
//!
//! Every consumer walks the tables the same way:
//!
//! 1. [`find_root`] asks the configuration table registry for the RSDP,
//!    trying [`ROOT_POINTER_GUIDS`] in order.
//! 2. [`iterate`] walks the XSDT (or, for ACPI 1.0 firmware, the RSDT),
//!    validating each table against the memory map before yielding it.
//! 3. [`expand_fadt`] resolves the DSDT and FACS behind the FADT.
//!
//! [`visit`] runs all three. Invalid or unmapped tables are logged and
//! skipped; only a missing or unreadable root stops the walk.

use crate::fadt::FadtPointers;
use crate::header::{read_u32, read_u64};
use crate::rsdp::AcpiRoots;
use crate::{ConfigTableRegistry, DescriptionHeader, PhysMapRo, PhysReader, Signature, WalkError};
use firmware_rangecheck::RangeCheckError;
use log::{info, warn};
use uefi::Guid;
use uefi::table::cfg::{ACPI_GUID, ACPI2_GUID};

/// Registry identifiers of the RSDP, most capable first.
pub const ROOT_POINTER_GUIDS: [Guid; 2] = [ACPI2_GUID, ACPI_GUID];

/// How a table was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOrigin {
    /// Listed in the XSDT or RSDT.
    Root,
    /// Referenced by the FADT.
    Fadt,
}

/// A table whose full declared length passed range validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef {
    pub address: u64,
    pub header: DescriptionHeader,
    pub origin: TableOrigin,
}

impl TableRef {
    #[must_use]
    pub const fn signature(&self) -> Signature {
        self.header.signature
    }

    /// Table length in bytes as declared by its header.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.header.length as usize
    }

    /// Maps the whole table.
    ///
    /// # Errors
    /// Only if the memory map changed its mind since the table was yielded.
    pub fn bytes<'a, M: PhysMapRo>(
        &self,
        reader: &PhysReader<'a, M>,
    ) -> Result<&'a [u8], RangeCheckError> {
        reader.read(self.address, self.length())
    }
}

/// The tables behind a FADT. A slot is `None` when the FADT does not
/// reference the table or the reference failed validation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FadtTables {
    pub dsdt: Option<TableRef>,
    pub facs: Option<TableRef>,
}

/// Returns the address registered under the first of `candidates` found in
/// `registry`. The address itself is not validated.
pub fn find_root(registry: &impl ConfigTableRegistry, candidates: &[Guid]) -> Option<u64> {
    candidates.iter().find_map(|guid| registry.lookup(guid))
}

/// Lazily walks the entries of a root table.
pub struct TableWalk<'a, M> {
    reader: PhysReader<'a, M>,
    entries: &'a [u8],
    entry_size: usize,
    offset: usize,
}

/// Starts a walk of the root table the RSDP at `rsdp_addr` references.
///
/// # Errors
/// * [`WalkError::RootNotMapped`] and [`WalkError::BadRootSignature`] from [`AcpiRoots::parse`].
/// * [`WalkError::NoRootTable`] if the RSDP has neither an XSDT nor an RSDT.
/// * [`WalkError::RootTableUnreadable`] if the root table fails validation.
pub fn iterate<'a, M: PhysMapRo>(
    reader: &PhysReader<'a, M>,
    rsdp_addr: u64,
) -> Result<TableWalk<'a, M>, WalkError> {
    let roots = AcpiRoots::parse(reader, rsdp_addr)?;
    let (root_addr, entry_size) = roots.root_table().ok_or(WalkError::NoRootTable)?;

    let root = load_table(reader, root_addr, TableOrigin::Root)
        .ok_or(WalkError::RootTableUnreadable(root_addr))?;
    let expected = if entry_size == 8 {
        Signature::XSDT
    } else {
        Signature::RSDT
    };
    if root.signature() != expected {
        warn!(
            "Root table at {root_addr:#x} has signature {}, expected {expected}",
            root.signature()
        );
    }

    let bytes = root
        .bytes(reader)
        .map_err(|_| WalkError::RootTableUnreadable(root_addr))?;

    Ok(TableWalk {
        reader: *reader,
        entries: &bytes[DescriptionHeader::SIZE..],
        entry_size,
        offset: 0,
    })
}

impl<M: PhysMapRo> Iterator for TableWalk<'_, M> {
    type Item = TableRef;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let slot = self.entries.get(self.offset..self.offset + self.entry_size)?;
            self.offset += self.entry_size;

            let address = if self.entry_size == 8 {
                read_u64(slot, 0)
            } else {
                read_u32(slot, 0).map(u64::from)
            }
            .unwrap_or(0);

            if address == 0 {
                info!("<skipping empty SDT entry>");
                continue;
            }

            if let Some(table) = load_table(&self.reader, address, TableOrigin::Root) {
                return Some(table);
            }
        }
    }
}

/// Resolves the DSDT and FACS referenced by `fadt`.
#[must_use]
pub fn expand_fadt<M: PhysMapRo>(reader: &PhysReader<'_, M>, fadt: &TableRef) -> FadtTables {
    let bytes = match fadt.bytes(reader) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("FADT @ {:#x} is no longer readable: {e}", fadt.address);
            return FadtTables::default();
        }
    };

    let pointers = FadtPointers::read(bytes, fadt.header.revision);
    FadtTables {
        dsdt: resolve(reader, pointers.dsdt, Signature::DSDT),
        facs: resolve(reader, pointers.facs, Signature::FACS),
    }
}

fn resolve<M: PhysMapRo>(
    reader: &PhysReader<'_, M>,
    address: u64,
    expected: Signature,
) -> Option<TableRef> {
    if address == 0 {
        warn!("FADT does not reference a {expected}");
        return None;
    }

    let table = load_table(reader, address, TableOrigin::Fadt)?;
    if table.signature() != expected {
        warn!(
            "FADT {expected} pointer {address:#x} leads to a {} table",
            table.signature()
        );
    }
    Some(table)
}

/// Walks every table reachable from the RSDP at `rsdp_addr`, handing each to
/// `action`. A FADT is immediately followed by its DSDT and then its FACS.
///
/// # Errors
/// The errors of [`iterate`]; per-table failures are logged and skipped.
pub fn visit<M: PhysMapRo>(
    reader: &PhysReader<'_, M>,
    rsdp_addr: u64,
    mut action: impl FnMut(&TableRef),
) -> Result<(), WalkError> {
    for table in iterate(reader, rsdp_addr)? {
        action(&table);

        if table.signature() == Signature::FADT {
            let children = expand_fadt(reader, &table);
            if let Some(dsdt) = children.dsdt {
                action(&dsdt);
            }
            if let Some(facs) = children.facs {
                action(&facs);
            }
        }
    }
    Ok(())
}

/// Validates the header, then the declared length, of the table at `address`.
fn load_table<M: PhysMapRo>(
    reader: &PhysReader<'_, M>,
    address: u64,
    origin: TableOrigin,
) -> Option<TableRef> {
    let head = match reader.read(address, DescriptionHeader::SIZE) {
        Ok(head) => head,
        Err(e) => {
            warn!("Table header @ {address:#x} failed validation: {e}");
            return None;
        }
    };
    let header = DescriptionHeader::parse(head)?;
    let signature = header.signature;

    let length = header.length as usize;
    if length < DescriptionHeader::SIZE {
        warn!("Table {signature} @ {address:#x} is corrupt: length {length:#x} is shorter than its header");
        return None;
    }

    if let Err(e) = reader.read(address, length) {
        warn!("Table {signature} @ {address:#x} (0x{length:x} bytes) failed validation: {e}");
        return None;
    }

    Some(TableRef {
        address,
        header,
        origin,
    })
}
