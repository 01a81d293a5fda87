//! # `fdt-dump [-v] [directory]`
//!
//! Saves the flattened device tree the firmware passes to the OS as
//! `fdt.dtb` in `directory` (default: the volume root).

#![cfg_attr(not(any(test, doctest)), no_std)]
#![no_main]

extern crate alloc;

use alloc::string::String;
use firmware_acpi::{ConfigTableRegistry, PhysReader};
use firmware_platvars::FDT_GUID;
use firmware_platvars::fdt::{FdtHeader, HEADER_SIZE};
use firmware_rangecheck::RangeCheck;
use firmware_shell::{GetOpt, GetOptError};
use log::{error, warn};
use uefi::prelude::*;
use uefi_tools::logger::{self, UefiLogger};
use uefi_tools::{BootMemoryMap, IdentityMap, SystemConfigTables, ToolDir, args};

const FILE_NAME: &str = "fdt.dtb";

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
                args::program_name(&args, "fdt-dump")
            );
            return e.into();
        }
    };

    match dump(&directory) {
        Ok(()) => {
            uefi::println!("All done!");
            Status::SUCCESS
        }
        Err(status) => status,
    }
}

fn dump(directory: &str) -> Result<(), Status> {
    let Some(address) = SystemConfigTables.lookup(&FDT_GUID) else {
        uefi::println!("No Device Tree support found");
        return Err(Status::NOT_FOUND);
    };

    let mut dir = ToolDir::open(directory, true).map_err(|e| {
        uefi::println!("{e}");
        Status::from(e)
    })?;
    uefi::println!("Dumping FDT to '{}'", dir.display());

    let check = RangeCheck::open(&mut BootMemoryMap, true, true).map_err(|e| {
        error!("Could not capture the memory map: {e}");
        Status::from(e)
    })?;
    // SAFETY: Boot services are running, so physical memory is identity
    // mapped, and every read goes through `check` first.
    let reader = unsafe { PhysReader::new(&IdentityMap, &check) };

    let header = reader
        .read(address, HEADER_SIZE)
        .map_err(Status::from)
        .and_then(|bytes| FdtHeader::parse(bytes).ok_or(Status::VOLUME_CORRUPTED))?;
    if !header.is_valid() {
        warn!("FDT header not valid");
    }

    let size = header.total_size as usize;
    if size < HEADER_SIZE {
        uefi::println!("FDT size {size:#x} is smaller than its header");
        return Err(Status::VOLUME_CORRUPTED);
    }
    uefi::println!("FDT {size:#x} bytes");

    let blob = reader.read(address, size).map_err(|e| {
        uefi::println!("Could not read the FDT: {e}");
        Status::from(e)
    })?;
    dir.save(FILE_NAME, blob).map_err(|e| {
        uefi::println!("{e}");
        Status::from(e)
    })
}
