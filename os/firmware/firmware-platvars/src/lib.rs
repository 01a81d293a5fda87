//! # Platform Variables
//!
//! Describes the firmware tables of the running platform as a flat list of
//! `pvar-*` shell variables, so scripts can branch on the firmware they
//! run under without parsing tables themselves.
//!
//! ```text
//! pvar-have-smbios      = True | False     SMBIOS 2.x entry point
//! pvar-have-smbios64    = True | False     SMBIOS 3.x entry point
//! pvar-have-acpi        = True | False
//! pvar-have-fdt         = True | False
//! pvar-acpi-<OEMID>     = True             per ACPI table, see [`acpi_table_vars`]
//! pvar-smbios-*         = <string>         BIOS (type 0) and system (type 1) strings
//! pvar-fdt-model        = <string>
//! pvar-fdt-compatible-N = <string>         at most 10
//! ```
//!
//! [`collect`] gathers everything from a [`Firmware`] description, reading
//! tables through a range-checked [`firmware_acpi::PhysReader`]; an
//! implementation of [`VarSink`] then stores the variables.

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod collect;
mod error;
pub mod fdt;
pub mod smbios;
mod vars;

pub use collect::{FDT_GUID, Firmware, collect};
pub use error::VarError;
pub use vars::{PlatVar, VarSink, acpi_table_vars, export, flag, sanitize};
