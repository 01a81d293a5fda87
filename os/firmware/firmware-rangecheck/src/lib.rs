//! # Physical Range Validation
//!
//! Firmware hands out raw physical addresses everywhere: the RSDP points at
//! an XSDT, the XSDT points at tables, the FADT points at the DSDT and FACS,
//! the SMBIOS entry point points at its structure table. None of these carry
//! any bounds or type information, and a single stale pointer is enough to
//! fault the whole application.
//!
//! This crate answers one question before any of those pointers is
//! dereferenced: *is `[start, start + length)` entirely backed by memory the
//! platform reports in its memory map?*
//!
//! ## Session Model
//!
//! ```text
//! RangeCheck::open(source, validate, warn)
//!         │  size query ─┐
//!         │  fill query ─┴─ retried while the map keeps growing
//!         ↓
//!   sorted snapshot (immutable)
//!         │
//!   query / query_checked   ← any number of times, no platform calls
//!         ↓
//!   close()                 ← idempotent
//! ```
//!
//! The snapshot is captured once and sorted once; queries never go back to
//! the platform.
//!
//! A session opened with `validate = false` never touches the platform and
//! reports every non-empty range as mapped.
//!
//! ## Platform Integration
//!
//! The live map comes from a [`MemoryMapSource`]. Under UEFI this is backed
//! by `GetMemoryMap()`; in tests by a plain vector.

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod error;
mod session;
mod source;

pub use error::RangeCheckError;
pub use session::RangeCheck;
pub use source::{MapEntry, MapReadError, MemoryMapSource};

/// Size of a UEFI page; memory map descriptors count in these units.
pub const PAGE_SIZE: u64 = 4096;
