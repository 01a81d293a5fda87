//! In-memory stand-ins for the platform services the ACPI code talks to.

#![allow(dead_code)]

use firmware_acpi::rsdp::{
    RSDT_ADDRESS_OFFSET, RSDP_V1_SIZE, REVISION_OFFSET, update_checksums, write_rsdp,
};
use firmware_acpi::{
    ConfigTableRegistry, DescriptionHeader, MemoryClass, PageAllocator, Pages, PhysMapRo,
    Signature, update_checksum,
};
use firmware_rangecheck::{MapEntry, MapReadError, MemoryMapSource, PAGE_SIZE};
use std::alloc::{Layout, alloc, dealloc};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ptr::NonNull;
use std::rc::Rc;
use uefi::{Guid, Status};

pub fn put_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u64(bytes: &mut [u8], offset: usize, value: u64) {
    bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

pub fn get_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

pub fn get_u64(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

/// A checksummed table with a zero-filled body of `body_len` bytes.
pub fn sdt(signature: &[u8; 4], revision: u8, body_len: usize) -> Vec<u8> {
    let mut table = vec![0u8; DescriptionHeader::SIZE + body_len];
    let header = DescriptionHeader {
        signature: Signature(*signature),
        length: u32::try_from(table.len()).unwrap(),
        revision,
        checksum: 0,
        oem_id: *b"VENDOR",
        oem_table_id: *b"TESTTABL",
        oem_revision: 1,
        creator_id: *b"TEST",
        creator_revision: 1,
    };
    assert!(header.write(&mut table));
    update_checksum(&mut table, 9);
    table
}

/// Same as [`sdt`], but with a recognisable body pattern.
pub fn sdt_with_marker(signature: &[u8; 4], marker: u8) -> Vec<u8> {
    let mut table = sdt(signature, 1, 16);
    table[DescriptionHeader::SIZE..].fill(marker);
    update_checksum(&mut table, 9);
    table
}

/// A FADT of `length` bytes with the given pointer fields.
pub fn fadt(revision: u8, length: usize, dsdt: u32, facs: u32, x_dsdt: u64, x_facs: u64) -> Vec<u8> {
    let mut table = sdt(b"FACP", revision, length - DescriptionHeader::SIZE);
    put_u32(&mut table, 36, facs);
    put_u32(&mut table, 40, dsdt);
    if length >= 148 {
        put_u64(&mut table, 132, x_facs);
        put_u64(&mut table, 140, x_dsdt);
    }
    update_checksum(&mut table, 9);
    table
}

/// A 64-byte FACS. It has no checksum in the table header position.
pub fn facs() -> Vec<u8> {
    let mut table = vec![0u8; 64];
    table[..4].copy_from_slice(b"FACS");
    put_u32(&mut table, 4, 64);
    table
}

/// An RSDP of the given revision. Revision 0 structures are 20 bytes long.
pub fn rsdp(revision: u8, rsdt: u32, xsdt: u64) -> Vec<u8> {
    let mut raw = vec![0u8; 36];
    assert!(write_rsdp(&mut raw, b"FWVEND", xsdt));
    raw[REVISION_OFFSET] = revision;
    put_u32(&mut raw, RSDT_ADDRESS_OFFSET, rsdt);
    if revision < 2 {
        raw.truncate(RSDP_V1_SIZE);
    }
    update_checksums(&mut raw);
    raw
}

/// An RSDT or XSDT holding `entries`.
pub fn root_table(signature: &[u8; 4], entries: &[u64]) -> Vec<u8> {
    let width = if signature == b"XSDT" { 8 } else { 4 };
    let mut table = sdt(signature, 1, entries.len() * width);
    for (i, &entry) in entries.iter().enumerate() {
        let offset = DescriptionHeader::SIZE + i * width;
        if width == 8 {
            put_u64(&mut table, offset, entry);
        } else {
            put_u32(&mut table, offset, u32::try_from(entry).unwrap());
        }
    }
    update_checksum(&mut table, 9);
    table
}

/// Synthetic physical address space. Every region is also reported as a
/// memory map descriptor covering the pages it touches.
#[derive(Default)]
pub struct FakePhys {
    regions: BTreeMap<u64, Vec<u8>>,
    pub reads: RefCell<Vec<u64>>,
}

impl FakePhys {
    pub fn place(&mut self, address: u64, bytes: Vec<u8>) {
        self.regions.insert(address, bytes);
    }

    pub fn map_entries(&self) -> Vec<MapEntry> {
        self.regions
            .iter()
            .map(|(&address, bytes)| {
                let start = address & !(PAGE_SIZE - 1);
                let end = address + bytes.len() as u64;
                MapEntry::new(start, (end - start).div_ceil(PAGE_SIZE))
            })
            .collect()
    }

    pub fn was_read(&self, address: u64) -> bool {
        self.reads.borrow().contains(&address)
    }
}

impl PhysMapRo for FakePhys {
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> &'a [u8] {
        self.reads.borrow_mut().push(paddr);
        let (&base, bytes) = self
            .regions
            .range(..=paddr)
            .next_back()
            .unwrap_or_else(|| panic!("read of unbacked address {paddr:#x}"));
        let offset = usize::try_from(paddr - base).unwrap();
        assert!(
            offset + len <= bytes.len(),
            "read of {len:#x} bytes at {paddr:#x} runs past its region"
        );
        unsafe { std::slice::from_raw_parts(bytes.as_ptr().add(offset), len) }
    }
}

/// A memory map that never changes.
pub struct VecSource(pub Vec<MapEntry>);

impl MemoryMapSource for VecSource {
    fn read_map(&mut self, out: &mut [MapEntry]) -> Result<usize, MapReadError> {
        if out.len() < self.0.len() {
            return Err(MapReadError::BufferTooSmall {
                required: self.0.len(),
            });
        }
        out[..self.0.len()].copy_from_slice(&self.0);
        Ok(self.0.len())
    }
}

/// Reads host memory as if it were identity-mapped physical memory.
pub struct IdentityMap;

impl PhysMapRo for IdentityMap {
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> &'a [u8] {
        unsafe { std::slice::from_raw_parts(paddr as usize as *const u8, len) }
    }
}

#[derive(Debug, Default)]
pub struct AllocLog {
    pub allocations: Vec<(u64, usize, MemoryClass)>,
    pub frees: Vec<u64>,
    pub live: BTreeMap<u64, usize>,
    /// Allocations left before every further request fails.
    pub budget: Option<usize>,
}

impl AllocLog {
    pub fn class_of(&self, address: u64) -> Option<MemoryClass> {
        self.allocations
            .iter()
            .find(|(a, _, _)| *a == address)
            .map(|&(_, _, class)| class)
    }

    /// The live runs as memory map descriptors.
    pub fn map_entries(&self) -> Vec<MapEntry> {
        self.live
            .iter()
            .map(|(&address, &count)| MapEntry::new(address, count as u64))
            .collect()
    }
}

/// Page allocator backed by the host heap. Everything it does is recorded
/// in a log shared with the test.
pub struct HeapPages {
    log: Rc<RefCell<AllocLog>>,
}

impl HeapPages {
    pub fn new() -> (Self, Rc<RefCell<AllocLog>>) {
        let log = Rc::new(RefCell::new(AllocLog::default()));
        (Self { log: log.clone() }, log)
    }
}

fn layout(count: usize) -> Layout {
    Layout::from_size_align(count * firmware_acpi::pages::PAGE_SIZE, 4096).unwrap()
}

impl PageAllocator for HeapPages {
    fn allocate_pages(&mut self, count: usize, class: MemoryClass) -> Result<Pages, Status> {
        let mut log = self.log.borrow_mut();
        if let Some(budget) = log.budget.as_mut() {
            if *budget == 0 {
                return Err(Status::OUT_OF_RESOURCES);
            }
            *budget -= 1;
        }

        let ptr = unsafe { alloc(layout(count)) };
        let base = NonNull::new(ptr).ok_or(Status::OUT_OF_RESOURCES)?;
        let address = ptr as usize as u64;
        log.allocations.push((address, count, class));
        log.live.insert(address, count);
        Ok(unsafe { Pages::from_raw(base, count) })
    }

    fn free_pages(&mut self, pages: Pages) {
        let mut log = self.log.borrow_mut();
        log.frees.push(pages.address());
        log.live.remove(&pages.address());
        unsafe { dealloc(pages.as_ptr().as_ptr(), layout(pages.page_count())) };
    }
}

/// Configuration table registry kept in a vector.
#[derive(Debug, Default)]
pub struct MemRegistry {
    pub entries: Vec<(Guid, u64)>,
    pub installs: usize,
}

impl ConfigTableRegistry for MemRegistry {
    fn lookup(&self, guid: &Guid) -> Option<u64> {
        self.entries
            .iter()
            .find(|(g, _)| g == guid)
            .map(|&(_, address)| address)
    }

    fn install(&mut self, guid: &'static Guid, address: Option<u64>) -> Result<(), Status> {
        self.installs += 1;
        self.entries.retain(|(g, _)| g != guid);
        if let Some(address) = address {
            self.entries.push((*guid, address));
        }
        Ok(())
    }
}
