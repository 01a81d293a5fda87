//! # ACPI Table Store
//!
//! An [`AcpiTableStore`] owns a private RSDP and XSDT and a list of tables,
//! each copied into its own page run. Tables are addressed by a
//! [`TableHandle`] that stays valid until the table is removed, and across
//! [`AcpiTableStore::replace`].
//!
//! ## Invariants
//!
//! * At most one FADT, one FACS and one DSDT are present.
//! * The XSDT lists every table except the FACS and the DSDT, in insertion
//!   order; both are reachable only through the FADT.
//! * The FADT always points at the FACS/DSDT currently in the store.
//! * When a method returns, every structure it touched sums to zero.
//!
//! Once [`AcpiTableStore::publish`] has run, the RSDP is registered with the
//! platform. There is no way back; later edits only refresh checksums.
//! Published tables must stay in memory for the OS, so dropping the store
//! does not free anything.

use crate::header::{
    CHECKSUM_OFFSET, LENGTH_OFFSET, OEM_ID_OFFSET, OEM_REVISION_OFFSET, OEM_TABLE_ID_OFFSET,
    declared_length, read_u64, write_u32, write_u64,
};
use crate::pages::{MemoryClass, PageAllocator, Pages, pages_for};
use crate::rsdp::{RSDP_V2_SIZE, XSDT_ADDRESS_OFFSET, update_checksums, write_rsdp};
use crate::{AcpiError, ConfigTableRegistry, DescriptionHeader, Signature, fadt, update_checksum};
use alloc::vec::Vec;
use core::fmt;
use log::{debug, info, warn};
use uefi::table::cfg::ACPI2_GUID;

const XSDT_ENTRY_SIZE: usize = 8;

/// Identity of a table in an [`AcpiTableStore`]. Handles start at 1 and
/// are never reused, except by [`AcpiTableStore::replace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableHandle(usize);

impl TableHandle {
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Construction parameters of an [`AcpiTableStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// XSDT capacity is allocated, and grown, this many entries at a time.
    pub xsdt_block_entries: usize,
    pub oem_id: [u8; 6],
    pub oem_table_id: [u8; 8],
    pub oem_revision: u32,
    pub creator_id: [u8; 4],
    pub creator_revision: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            xsdt_block_entries: 100,
            oem_id: *b"LOADED",
            oem_table_id: *b"_LOADED_",
            oem_revision: 0x1337,
            creator_id: *b"LOAD",
            creator_revision: 0xfeed,
        }
    }
}

struct TableEntry {
    handle: TableHandle,
    signature: Signature,
    length: usize,
    pages: Pages,
}

impl TableEntry {
    fn bytes(&self) -> &[u8] {
        &self.pages.as_slice()[..self.length]
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pages.as_mut_slice()[..self.length]
    }

    fn in_xsdt(&self) -> bool {
        !self.signature.is_fadt_child()
    }
}

/// Mutable RSDP → XSDT → tables tree.
pub struct AcpiTableStore<A: PageAllocator> {
    allocator: A,
    config: StoreConfig,
    rsdp: Pages,
    xsdt: Pages,
    xsdt_capacity: usize,
    tables: Vec<TableEntry>,
    fadt: Option<TableHandle>,
    facs: Option<TableHandle>,
    dsdt: Option<TableHandle>,
    next_handle: usize,
    published: bool,
}

impl<A: PageAllocator> AcpiTableStore<A> {
    /// Allocates an empty RSDP and XSDT.
    ///
    /// # Errors
    /// [`AcpiError::OutOfResources`] if either structure cannot be allocated.
    pub fn new(mut allocator: A, config: StoreConfig) -> Result<Self, AcpiError> {
        let xsdt_capacity = config.xsdt_block_entries.max(1);

        let mut rsdp = allocator
            .allocate_pages(pages_for(RSDP_V2_SIZE), MemoryClass::Reclaim)
            .map_err(|status| {
                warn!("Could not allocate the RSDP: {status:?}");
                AcpiError::OutOfResources
            })?;

        let xsdt_size = DescriptionHeader::SIZE + xsdt_capacity * XSDT_ENTRY_SIZE;
        let mut xsdt = match allocator.allocate_pages(pages_for(xsdt_size), MemoryClass::Reclaim) {
            Ok(xsdt) => xsdt,
            Err(status) => {
                warn!("Could not allocate the XSDT: {status:?}");
                allocator.free_pages(rsdp);
                return Err(AcpiError::OutOfResources);
            }
        };

        rsdp.as_mut_slice().fill(0);
        xsdt.as_mut_slice().fill(0);
        write_rsdp(rsdp.as_mut_slice(), &config.oem_id, xsdt.address());

        let header = DescriptionHeader {
            signature: Signature::XSDT,
            length: 0,
            revision: 1,
            checksum: 0,
            oem_id: config.oem_id,
            oem_table_id: config.oem_table_id,
            oem_revision: config.oem_revision,
            creator_id: config.creator_id,
            creator_revision: config.creator_revision,
        };
        header.write(xsdt.as_mut_slice());

        let mut store = Self {
            allocator,
            config,
            rsdp,
            xsdt,
            xsdt_capacity,
            tables: Vec::new(),
            fadt: None,
            facs: None,
            dsdt: None,
            next_handle: 1,
            published: false,
        };
        store.sync_root();
        Ok(store)
    }

    /// Copies `table` into the store.
    ///
    /// With `want_checksum` the table's checksum is recomputed; a FADT is
    /// always re-checksummed because the store rewrites its pointer fields.
    ///
    /// # Errors
    /// * [`AcpiError::Truncated`] / [`AcpiError::LengthMismatch`] if `table`
    ///   disagrees with its own length field.
    /// * [`AcpiError::Duplicate`] for a second FADT, FACS or DSDT.
    /// * [`AcpiError::OutOfResources`] if the table or a larger XSDT cannot
    ///   be allocated.
    ///
    /// The store is unchanged on error.
    pub fn add(&mut self, table: &[u8], want_checksum: bool) -> Result<TableHandle, AcpiError> {
        self.add_table(table, want_checksum, None)
    }

    /// Removes the table behind `handle` and clears any FADT reference to it.
    ///
    /// # Errors
    /// [`AcpiError::NotFound`] for an unknown handle.
    pub fn remove(&mut self, handle: TableHandle) -> Result<(), AcpiError> {
        let index = self
            .index_of(handle)
            .ok_or(AcpiError::NotFound(handle))?;
        let entry = self.tables.remove(index);

        match entry.signature {
            Signature::FADT => self.fadt = None,
            Signature::FACS => {
                self.facs = None;
                self.patch_fadt(|f| fadt::set_facs(f, 0));
            }
            Signature::DSDT => {
                self.dsdt = None;
                self.patch_fadt(|f| fadt::set_dsdt(f, 0));
            }
            _ => {}
        }

        debug!("Removed {} table {handle}", entry.signature);
        self.allocator.free_pages(entry.pages);
        self.sync_root();
        Ok(())
    }

    /// Swaps the table behind `handle` for `table`, keeping the handle.
    ///
    /// `table` is checked before the old table is touched, so a malformed
    /// or duplicate replacement leaves the store as it was.
    ///
    /// # Errors
    /// [`AcpiError::Aborted`] if `handle` is unknown, `table` would be
    /// rejected by [`Self::add`], or the new copy cannot be allocated. Only
    /// in the last case is the old table gone.
    pub fn replace(
        &mut self,
        handle: TableHandle,
        table: &[u8],
        want_checksum: bool,
    ) -> Result<TableHandle, AcpiError> {
        if self.index_of(handle).is_none() {
            warn!("Cannot replace unknown table {handle}");
            return Err(AcpiError::Aborted);
        }
        if let Err(e) = self.admit(table, Some(handle)) {
            warn!("Replacement for table {handle} rejected: {e}");
            return Err(AcpiError::Aborted);
        }

        if let Err(e) = self.remove(handle) {
            warn!("Could not remove table {handle} for replacement: {e}");
            return Err(AcpiError::Aborted);
        }

        self.add_table(table, want_checksum, Some(handle))
            .map_err(|e| {
                warn!("Could not add the replacement for table {handle}: {e}");
                AcpiError::Aborted
            })
    }

    /// Refreshes the root checksums and, the first time, registers the RSDP
    /// as the system's ACPI 2.0 table.
    ///
    /// # Errors
    /// [`AcpiError::Aborted`] if the registry refuses the RSDP.
    pub fn publish(&mut self, registry: &mut impl ConfigTableRegistry) -> Result<(), AcpiError> {
        self.update_root_checksums();
        if self.published {
            return Ok(());
        }

        let address = self.rsdp.address();
        registry
            .install(&ACPI2_GUID, Some(address))
            .map_err(|status| {
                warn!("Could not publish the RSDP: {status:?}");
                AcpiError::Aborted
            })?;

        self.published = true;
        info!("Published RSDP @ {address:#x}");
        Ok(())
    }

    /// Adds a checksummed copy of `table` and publishes the result.
    ///
    /// # Errors
    /// The errors of [`Self::add`] and [`Self::publish`].
    pub fn install(
        &mut self,
        table: &[u8],
        registry: &mut impl ConfigTableRegistry,
    ) -> Result<TableHandle, AcpiError> {
        let handle = self.add(table, true)?;
        self.publish(registry)?;
        Ok(handle)
    }

    /// Removes a table and publishes the result.
    ///
    /// # Errors
    /// [`AcpiError::NotFound`] whatever went wrong.
    pub fn uninstall(
        &mut self,
        handle: TableHandle,
        registry: &mut impl ConfigTableRegistry,
    ) -> Result<(), AcpiError> {
        self.remove(handle)
            .and_then(|()| self.publish(registry))
            .map_err(|_| AcpiError::NotFound(handle))
    }

    /// A copy of the `index`-th table in insertion order.
    #[must_use]
    pub fn get_table(&self, index: usize) -> Option<(TableHandle, Vec<u8>)> {
        self.tables.get(index).map(|t| (t.handle, t.bytes().to_vec()))
    }

    /// A copy of the table behind `handle`.
    #[must_use]
    pub fn copy_table(&self, handle: TableHandle) -> Option<Vec<u8>> {
        self.entry(handle).map(|t| t.bytes().to_vec())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.published
    }

    #[must_use]
    pub fn rsdp_address(&self) -> u64 {
        self.rsdp.address()
    }

    #[must_use]
    pub fn xsdt_address(&self) -> u64 {
        self.xsdt.address()
    }

    /// Where the table behind `handle` lives.
    #[must_use]
    pub fn table_address(&self, handle: TableHandle) -> Option<u64> {
        self.entry(handle).map(|t| t.pages.address())
    }

    /// The XSDT's entries as currently encoded in its buffer.
    #[must_use]
    pub fn xsdt_entries(&self) -> Vec<u64> {
        let xsdt = self.xsdt.as_slice();
        let length = declared_length(xsdt).map_or(0, |l| l as usize);
        (DescriptionHeader::SIZE..length)
            .step_by(XSDT_ENTRY_SIZE)
            .filter_map(|offset| read_u64(xsdt, offset))
            .collect()
    }

    /// The RSDP bytes.
    #[must_use]
    pub fn rsdp_bytes(&self) -> &[u8] {
        &self.rsdp.as_slice()[..RSDP_V2_SIZE]
    }

    /// The XSDT bytes up to its declared length.
    #[must_use]
    pub fn xsdt_bytes(&self) -> &[u8] {
        let xsdt = self.xsdt.as_slice();
        let length = declared_length(xsdt).map_or(0, |l| l as usize);
        &xsdt[..length.min(xsdt.len())]
    }

    fn add_table(
        &mut self,
        table: &[u8],
        want_checksum: bool,
        reuse: Option<TableHandle>,
    ) -> Result<TableHandle, AcpiError> {
        let (declared, signature) = self.admit(table, None)?;

        let class = if signature.needs_nvs() {
            MemoryClass::Nvs
        } else {
            MemoryClass::Reclaim
        };
        let mut pages = self
            .allocator
            .allocate_pages(pages_for(declared), class)
            .map_err(|status| {
                warn!("Could not allocate {declared:#x} bytes for a {signature} table: {status:?}");
                AcpiError::OutOfResources
            })?;

        if !signature.is_fadt_child() && self.xsdt_len() == self.xsdt_capacity {
            if let Err(e) = self.grow_xsdt() {
                self.allocator.free_pages(pages);
                return Err(e);
            }
        }

        let buffer = pages.as_mut_slice();
        buffer.fill(0);
        buffer[..declared].copy_from_slice(table);

        let handle = reuse.unwrap_or_else(|| {
            let handle = TableHandle(self.next_handle);
            self.next_handle += 1;
            handle
        });

        let mut entry = TableEntry {
            handle,
            signature,
            length: declared,
            pages,
        };
        let address = entry.pages.address();

        match signature {
            Signature::FADT => {
                let facs = self.facs.and_then(|h| self.table_address(h)).unwrap_or(0);
                let dsdt = self.dsdt.and_then(|h| self.table_address(h)).unwrap_or(0);
                let bytes = entry.bytes_mut();
                fadt::set_facs(bytes, facs);
                fadt::set_dsdt(bytes, dsdt);
                update_checksum(bytes, CHECKSUM_OFFSET);
                self.adopt_oem_identity(entry.bytes());
                self.fadt = Some(handle);
            }
            Signature::FACS => {
                self.facs = Some(handle);
                self.patch_fadt(|f| fadt::set_facs(f, address));
            }
            Signature::DSDT => {
                if want_checksum {
                    update_checksum(entry.bytes_mut(), CHECKSUM_OFFSET);
                }
                self.dsdt = Some(handle);
                self.patch_fadt(|f| fadt::set_dsdt(f, address));
            }
            _ => {
                if want_checksum {
                    update_checksum(entry.bytes_mut(), CHECKSUM_OFFSET);
                }
            }
        }

        debug!("Added {signature} table as {handle} @ {address:#x} (0x{declared:x} bytes)");
        self.tables.push(entry);
        self.sync_root();
        Ok(handle)
    }

    /// Validates `table` against its own length field and the singleton
    /// rule. `replacing` is the handle about to make room for it.
    fn admit(
        &self,
        table: &[u8],
        replacing: Option<TableHandle>,
    ) -> Result<(usize, Signature), AcpiError> {
        let declared = declared_length(table).ok_or(AcpiError::Truncated)? as usize;
        if declared != table.len() {
            return Err(AcpiError::LengthMismatch {
                declared,
                actual: table.len(),
            });
        }

        let signature = Signature::from_table(table).ok_or(AcpiError::Truncated)?;
        if signature != Signature::FACS && declared < DescriptionHeader::SIZE {
            return Err(AcpiError::Truncated);
        }

        let present = match signature {
            Signature::FADT => self.fadt,
            Signature::FACS => self.facs,
            Signature::DSDT => self.dsdt,
            _ => None,
        };
        if let Some(existing) = present.filter(|&h| Some(h) != replacing) {
            warn!("A {signature} table is already installed as {existing}");
            return Err(AcpiError::Duplicate(signature));
        }
        Ok((declared, signature))
    }

    /// Copies the FADT's OEM fields into the RSDP and XSDT.
    fn adopt_oem_identity(&mut self, fadt: &[u8]) {
        let oem_id = &fadt[OEM_ID_OFFSET..OEM_ID_OFFSET + 6];
        let oem_table_id = &fadt[OEM_TABLE_ID_OFFSET..OEM_TABLE_ID_OFFSET + 8];
        let oem_revision = &fadt[OEM_REVISION_OFFSET..OEM_REVISION_OFFSET + 4];

        let rsdp = self.rsdp.as_mut_slice();
        rsdp[crate::rsdp::OEM_ID_OFFSET..crate::rsdp::OEM_ID_OFFSET + 6].copy_from_slice(oem_id);

        let xsdt = self.xsdt.as_mut_slice();
        xsdt[OEM_ID_OFFSET..OEM_ID_OFFSET + 6].copy_from_slice(oem_id);
        xsdt[OEM_TABLE_ID_OFFSET..OEM_TABLE_ID_OFFSET + 8].copy_from_slice(oem_table_id);
        xsdt[OEM_REVISION_OFFSET..OEM_REVISION_OFFSET + 4].copy_from_slice(oem_revision);
    }

    /// Applies `edit` to the FADT, if present, and re-checksums it.
    fn patch_fadt(&mut self, edit: impl FnOnce(&mut [u8])) {
        let Some(handle) = self.fadt else {
            return;
        };
        if let Some(entry) = self.tables.iter_mut().find(|t| t.handle == handle) {
            let bytes = entry.bytes_mut();
            edit(bytes);
            update_checksum(bytes, CHECKSUM_OFFSET);
        }
    }

    /// Moves the XSDT into a run one block larger.
    fn grow_xsdt(&mut self) -> Result<(), AcpiError> {
        let capacity = self.xsdt_capacity + self.config.xsdt_block_entries.max(1);
        let size = DescriptionHeader::SIZE + capacity * XSDT_ENTRY_SIZE;

        let mut pages = self
            .allocator
            .allocate_pages(pages_for(size), MemoryClass::Reclaim)
            .map_err(|status| {
                warn!("Could not grow the XSDT to {capacity} entries: {status:?}");
                AcpiError::OutOfResources
            })?;

        let used = DescriptionHeader::SIZE + self.xsdt_capacity * XSDT_ENTRY_SIZE;
        let buffer = pages.as_mut_slice();
        buffer.fill(0);
        buffer[..used].copy_from_slice(&self.xsdt.as_slice()[..used]);

        let old = core::mem::replace(&mut self.xsdt, pages);
        self.allocator.free_pages(old);
        self.xsdt_capacity = capacity;
        debug!(
            "XSDT grown to {capacity} entries @ {:#x}",
            self.xsdt.address()
        );

        self.sync_root();
        Ok(())
    }

    fn xsdt_len(&self) -> usize {
        self.tables.iter().filter(|t| t.in_xsdt()).count()
    }

    /// Rebuilds the XSDT entries from the table list and points the RSDP at
    /// the current XSDT, then re-checksums both.
    fn sync_root(&mut self) {
        let xsdt = self.xsdt.as_mut_slice();
        let end = DescriptionHeader::SIZE + self.xsdt_capacity * XSDT_ENTRY_SIZE;

        let mut offset = DescriptionHeader::SIZE;
        for table in self.tables.iter().filter(|t| t.in_xsdt()) {
            write_u64(xsdt, offset, table.pages.address());
            offset += XSDT_ENTRY_SIZE;
        }
        xsdt[offset..end].fill(0);
        write_u32(xsdt, LENGTH_OFFSET, u32::try_from(offset).unwrap_or(u32::MAX));

        write_u64(self.rsdp.as_mut_slice(), XSDT_ADDRESS_OFFSET, self.xsdt.address());
        self.update_root_checksums();
    }

    fn update_root_checksums(&mut self) {
        update_checksums(self.rsdp.as_mut_slice());

        let xsdt = self.xsdt.as_mut_slice();
        let length = declared_length(xsdt).map_or(0, |l| l as usize);
        if let Some(table) = xsdt.get_mut(..length) {
            update_checksum(table, CHECKSUM_OFFSET);
        }
    }

    fn index_of(&self, handle: TableHandle) -> Option<usize> {
        self.tables.iter().position(|t| t.handle == handle)
    }

    fn entry(&self, handle: TableHandle) -> Option<&TableEntry> {
        self.tables.iter().find(|t| t.handle == handle)
    }
}
