//! # Page Allocation
//!
//! The table store keeps every table in its own run of identity-mapped
//! pages, so that a table's virtual address is also the physical address
//! the XSDT and FADT refer to.

use core::ptr::NonNull;
use uefi::Status;

pub const PAGE_SIZE: usize = 4096;

/// Number of pages needed to hold `len` bytes.
#[must_use]
pub const fn pages_for(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

/// Memory type a table is allocated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryClass {
    /// ACPI reclaim memory; the OS may reuse it once the tables are parsed.
    Reclaim,
    /// ACPI NVS memory; preserved across sleep states.
    Nvs,
}

/// An owned run of whole pages.
#[derive(Debug)]
pub struct Pages {
    base: NonNull<u8>,
    count: usize,
}

impl Pages {
    /// # Safety
    /// `base` must be valid for reads and writes of `count * PAGE_SIZE`
    /// bytes and must not be accessed through any other path while the
    /// returned value is alive.
    #[must_use]
    pub const unsafe fn from_raw(base: NonNull<u8>, count: usize) -> Self {
        Self { base, count }
    }

    /// Physical (identity-mapped) address of the first byte.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.base.as_ptr().addr() as u64
    }

    #[must_use]
    pub const fn as_ptr(&self) -> NonNull<u8> {
        self.base
    }

    #[must_use]
    pub const fn page_count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.count * PAGE_SIZE
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[must_use]
    pub const fn as_slice(&self) -> &[u8] {
        // SAFETY: Guaranteed by the contract of `from_raw`.
        unsafe { core::slice::from_raw_parts(self.base.as_ptr(), self.len()) }
    }

    #[must_use]
    pub const fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: Guaranteed by the contract of `from_raw`; `&mut self` is exclusive.
        unsafe { core::slice::from_raw_parts_mut(self.base.as_ptr(), self.len()) }
    }
}

/// Source of the store's page runs.
pub trait PageAllocator {
    /// Allocates `count` pages of `class` memory. The contents are undefined.
    ///
    /// # Errors
    /// The platform status, typically `OUT_OF_RESOURCES`.
    fn allocate_pages(&mut self, count: usize, class: MemoryClass) -> Result<Pages, Status>;

    /// Returns a run obtained from [`PageAllocator::allocate_pages`] on the
    /// same allocator.
    fn free_pages(&mut self, pages: Pages);
}
