//! # ACPI Table Discovery and Management
//!
//! This crate holds everything the firmware tools need to look at and
//! rebuild the ACPI table tree a platform publishes through its UEFI
//! configuration tables.
//!
//! ## Architecture
//!
//! ```text
//! UEFI configuration table (ACPI 2.0 GUID, then ACPI 1.0 GUID)
//!     ↓
//! RSDP ("RSD PTR ")
//!     ↓  revision >= 2 and XSDT present?  yes → XSDT (8-byte entries)
//!     ↓                                   no  → RSDT (4-byte entries)
//! Tables (FACP, APIC, SSDT, ...)
//!     ↓  FACP only
//! DSDT, FACS
//! ```
//!
//! ## Key Components
//!
//! ### Physical Memory Access ([`PhysMapRo`], [`PhysReader`])
//! Every physical pointer read from a firmware table is first validated
//! against the platform memory map ([`firmware_rangecheck::RangeCheck`]) and
//! only then mapped. [`PhysReader`] couples the two so that no code path can
//! map a range it has not checked.
//!
//! ### Discovery ([`walk`])
//! [`walk::find_root`] locates the RSDP, [`walk::iterate`] walks the root
//! table lazily, [`walk::expand_fadt`] resolves the DSDT/FACS behind a FADT,
//! and [`walk::visit`] strings all three together. All tools use
//! [`walk::visit`], so they agree on which root table they inspect.
//!
//! ### Table Store ([`store`])
//! [`store::AcpiTableStore`] builds a fresh RSDP/XSDT tree out of loose
//! tables, keeps the FADT/DSDT/FACS cross references and all checksums
//! consistent, and publishes the result once as the system's ACPI tables.
//!
//! ## Checksums
//!
//! Every ACPI structure with a checksum byte must sum to zero modulo 256.
//! [`update_checksum`] zeroes the checksum byte, sums the structure and
//! stores the two's complement of the result.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

extern crate alloc;

pub mod error;
pub mod fadt;
pub mod header;
pub mod pages;
pub mod registry;
pub mod rsdp;
pub mod signature;
pub mod store;
pub mod walk;

pub use error::{AcpiError, WalkError};
pub use header::DescriptionHeader;
pub use pages::{MemoryClass, PageAllocator, Pages};
pub use registry::ConfigTableRegistry;
pub use signature::Signature;
pub use store::{AcpiTableStore, StoreConfig, TableHandle};
pub use walk::{TableOrigin, TableRef};

use firmware_rangecheck::{RangeCheck, RangeCheckError};

/// Map a physical region and return a *read-only* byte slice for its contents.
/// You provide the implementation (identity map, kmap, etc.).
pub trait PhysMapRo {
    /// # Safety
    /// The implementor must ensure the returned slice is valid for `len` bytes.
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> &'a [u8];
}

/// Reads physical memory only after the range passed a [`RangeCheck`].
pub struct PhysReader<'a, M> {
    map: &'a M,
    check: &'a RangeCheck,
}

impl<M> Clone for PhysReader<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for PhysReader<'_, M> {}

impl<'a, M: PhysMapRo> PhysReader<'a, M> {
    /// # Safety
    /// Every range `check` accepts must be readable through `map` for `'a`.
    /// A disabled session accepts every range, so with one the caller vouches
    /// for every address the tables reference.
    #[must_use]
    pub const unsafe fn new(map: &'a M, check: &'a RangeCheck) -> Self {
        Self { map, check }
    }

    /// Validates and maps `[paddr, paddr + len)`.
    ///
    /// # Errors
    /// Any [`RangeCheckError`] the session reports for the range.
    pub fn read(&self, paddr: u64, len: usize) -> Result<&'a [u8], RangeCheckError> {
        let length = u64::try_from(len).map_err(|_| RangeCheckError::Wraparound {
            start: paddr,
            length: u64::MAX,
        })?;
        self.check.query_checked(paddr, length)?;

        // SAFETY: The range passed the session, which is the contract of `new`.
        Ok(unsafe { self.map.map_ro(paddr, len) })
    }

    #[must_use]
    pub const fn check(&self) -> &'a RangeCheck {
        self.check
    }
}

/// Wrapping byte sum of `bytes`.
#[must_use]
pub fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |a, &b| a.wrapping_add(b))
}

/// Recomputes the checksum byte at `offset` so that `bytes` sums to zero.
/// Does nothing if `offset` lies outside `bytes`.
pub fn update_checksum(bytes: &mut [u8], offset: usize) {
    let Some(slot) = bytes.get_mut(offset) else {
        return;
    };
    *slot = 0;
    let total = sum(bytes);
    bytes[offset] = total.wrapping_neg();
}
