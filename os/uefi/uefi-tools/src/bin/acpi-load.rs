//! # `acpi-load [-v] [directory]`
//!
//! Replaces the firmware's ACPI tables with the `*.aml` files found in
//! `directory` (default: the volume root), typically a set produced by
//! `acpi-dump` and then edited.
//!
//! The existing ACPI 1.0 and 2.0 configuration table entries are removed
//! first; an empty directory publishes an RSDP with an empty XSDT. Files
//! whose header length disagrees with their size are skipped, and any other
//! per-file failure is reported before loading carries on.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![no_main]

extern crate alloc;

use alloc::string::String;
use firmware_acpi::{AcpiTableStore, ConfigTableRegistry, DescriptionHeader, StoreConfig};
use firmware_shell::{GetOpt, GetOptError, is_aml_file};
use log::debug;
use uefi::prelude::*;
use uefi::table::cfg::{ACPI_GUID, ACPI2_GUID};
use uefi_tools::logger::{self, UefiLogger};
use uefi_tools::{BootPages, SystemConfigTables, ToolDir, args};

fn parse(args: &[String]) -> Result<String, GetOptError> {
    let mut opts = GetOpt::new(args, "");
    for opt in opts.by_ref() {
        match opt.flag {
            'v' => logger::set_verbose(),
            _ => return Err(opt.unknown()),
        }
    }
    Ok(opts
        .operands()
        .first()
        .cloned()
        .unwrap_or_else(|| String::from(".")))
}

#[entry]
fn main() -> Status {
    if UefiLogger::init().is_err() {
        return Status::ABORTED;
    }

    let args = args::shell_args().unwrap_or_default();
    let directory = match parse(&args) {
        Ok(directory) => directory,
        Err(e) => {
            uefi::println!("{e}");
            uefi::println!(
                "Usage: {} [-v] [directory]",
                args::program_name(&args, "acpi-load")
            );
            return e.into();
        }
    };

    match load(&directory) {
        Ok(()) => {
            uefi::println!("All done!");
            Status::SUCCESS
        }
        Err(status) => status,
    }
}

fn load(directory: &str) -> Result<(), Status> {
    let mut dir = ToolDir::open(directory, false).map_err(|e| {
        uefi::println!("{e}");
        Status::from(e)
    })?;
    uefi::println!("Loading tables from '{}'", dir.display());

    let names = dir.files().map_err(|e| {
        uefi::println!("{e}");
        Status::from(e)
    })?;

    let mut registry = SystemConfigTables;
    for guid in [&ACPI2_GUID, &ACPI_GUID] {
        if let Err(status) = registry.install(guid, None) {
            // Nothing was registered under this GUID.
            debug!("Removing {guid}: {status:?}");
        }
    }

    let mut store = AcpiTableStore::new(BootPages, StoreConfig::default()).map_err(|e| {
        uefi::println!("Could not set up the table store: {e}");
        Status::from(e)
    })?;

    for name in names.iter().filter(|name| is_aml_file(name)) {
        let path = format_path(&dir, name);
        let table = match dir.load(name) {
            Ok(table) => table,
            Err(e) => {
                uefi::println!("Could not read '{path}': {e}");
                continue;
            }
        };

        let Some(header) = DescriptionHeader::parse(&table) else {
            uefi::println!("Skipping '{path}': corrupt ACPI table");
            continue;
        };
        if header.length as usize != table.len() {
            uefi::println!("Skipping '{path}': corrupt ACPI table");
            continue;
        }

        uefi::println!("'{path}' -> {}", header.signature);
        match store.install(&table, &mut registry) {
            Ok(handle) => debug!("Installed {} as {handle}", header.signature),
            Err(e) => uefi::println!("Could not install table from '{path}': {e}"),
        }
    }

    store.publish(&mut registry).map_err(|e| {
        uefi::println!("Could not publish the tables: {e}");
        Status::from(e)
    })?;
    Ok(())
}

fn format_path(dir: &ToolDir, name: &str) -> String {
    let mut path = dir.display();
    if !path.ends_with('\\') {
        path.push('\\');
    }
    path.push_str(name);
    path
}
