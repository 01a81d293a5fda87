//! # UEFI Shell Tools for Firmware Tables
//!
//! Platform glue shared by the shell applications in `src/bin`:
//!
//! | Binary            | Purpose                                                    |
//! |-------------------|------------------------------------------------------------|
//! | `acpi-dump`       | Saves every ACPI table to `NN-SIG.aml` files               |
//! | `acpi-load`       | Replaces the firmware's ACPI tables with `*.aml` files     |
//! | `plat-vars`       | Exports `pvar-*` shell variables describing the platform   |
//! | `range-is-mapped` | Tells whether a physical range is in the memory map        |
//! | `fdt-dump`        | Saves the firmware's device tree blob as `fdt.dtb`         |
//!
//! The table logic lives in the `firmware-*` crates and talks to the
//! platform through traits. This crate implements those traits on top of
//! UEFI boot and runtime services:
//!
//! * [`BootMemoryMap`] feeds `GetMemoryMap()` into range checks.
//! * [`IdentityMap`] reads physical memory through the boot-time identity map.
//! * [`BootPages`] allocates ACPI reclaim and NVS pages.
//! * [`SystemConfigTables`] reads and updates the system table's configuration table.
//! * [`ShellVars`] stores shell environment variables.
//!
//! Files are read and written relative to the root of the volume the tool
//! was loaded from, see [`ToolDir`].
//!
//! All of this is only valid while boot services are running, which is
//! always the case for a shell application.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

extern crate alloc;

pub mod args;
mod config_tables;
mod error;
mod file_system;
pub mod logger;
mod memory;
mod mmap;
mod phys;
mod shell_vars;

pub use config_tables::SystemConfigTables;
pub use error::FsError;
pub use file_system::ToolDir;
pub use memory::BootPages;
pub use mmap::BootMemoryMap;
pub use phys::IdentityMap;
pub use shell_vars::{SHELL_VARIABLE_GUID, ShellVars};
