//! # `acpi-dump [-v] [-n] [-q] [directory]`
//!
//! Saves every ACPI table the firmware publishes as `NN-SIG.aml` in
//! `directory` (default: the volume root), numbering tables in walk order.
//! The DSDT and FACS follow the FADT that references them.
//!
//! * `-v` enables debug output.
//! * `-n` reads tables without checking them against the memory map.
//! * `-q` does not warn about tables outside the memory map.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![no_main]

extern crate alloc;

use alloc::string::{String, ToString};
use firmware_acpi::{PhysReader, WalkError};
use firmware_acpi::walk::{ROOT_POINTER_GUIDS, find_root, visit};
use firmware_rangecheck::RangeCheck;
use firmware_shell::{GetOpt, GetOptError, dump_file_name};
use log::{error, warn};
use uefi::prelude::*;
use uefi_tools::logger::{self, UefiLogger};
use uefi_tools::{BootMemoryMap, IdentityMap, SystemConfigTables, ToolDir, args};

/// File names only carry two digits of the table index.
const MAX_DISTINCT_FILES: usize = 100;

struct Options {
    validate: bool,
    warn_on_miss: bool,
    directory: String,
}

fn parse(args: &[String]) -> Result<Options, GetOptError> {
    let mut options = Options {
        validate: true,
        warn_on_miss: true,
        directory: String::from("."),
    };

    let mut opts = GetOpt::new(args, "");
    for opt in opts.by_ref() {
        match opt.flag {
            'v' => logger::set_verbose(),
            'n' => options.validate = false,
            'q' => options.warn_on_miss = false,
            _ => return Err(opt.unknown()),
        }
    }
    if let Some(directory) = opts.operands().first() {
        options.directory.clone_from(directory);
    }
    Ok(options)
}

#[entry]
fn main() -> Status {
    if UefiLogger::init().is_err() {
        return Status::ABORTED;
    }

    let args = args::shell_args().unwrap_or_default();
    let options = match parse(&args) {
        Ok(options) => options,
        Err(e) => {
            uefi::println!("{e}");
            uefi::println!(
                "Usage: {} [-v] [-n] [-q] [directory]",
                args::program_name(&args, "acpi-dump")
            );
            return e.into();
        }
    };

    match dump(&options) {
        Ok(()) => {
            uefi::println!("All done!");
            Status::SUCCESS
        }
        Err(status) => status,
    }
}

fn dump(options: &Options) -> Result<(), Status> {
    let Some(rsdp) = find_root(&SystemConfigTables, &ROOT_POINTER_GUIDS) else {
        uefi::println!("No ACPI support found");
        return Err(WalkError::RootNotFound.into());
    };

    let mut dir = ToolDir::open(&options.directory, true).map_err(|e| {
        uefi::println!("{e}");
        Status::from(e)
    })?;
    uefi::println!("Dumping tables to '{}'", dir.display());

    let check = RangeCheck::open(&mut BootMemoryMap, options.validate, options.warn_on_miss)
        .map_err(|e| {
            error!("Could not capture the memory map: {e}");
            Status::from(e)
        })?;
    // SAFETY: Boot services are running, so physical memory is identity
    // mapped, and every read goes through `check` first.
    let reader = unsafe { PhysReader::new(&IdentityMap, &check) };

    let mut index = 0;
    let mut failed = 0;
    let walked = visit(&reader, rsdp, |table| {
        let signature = table.signature();
        uefi::println!(
            "Table {signature} @ {:#x} ({:#x} bytes)",
            table.address,
            table.length()
        );

        if index == MAX_DISTINCT_FILES {
            warn!("More than {MAX_DISTINCT_FILES} tables, file names repeat from here on");
        }
        let name = dump_file_name(index, signature);
        index += 1;

        let saved = match table.bytes(&reader) {
            Ok(bytes) => dir.save(&name, bytes).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = saved {
            uefi::println!("Could not save '{name}': {e}");
            failed += 1;
        }
    });

    if let Err(e) = walked {
        uefi::println!("{e}");
        return Err(e.into());
    }
    if failed > 0 {
        uefi::println!("{failed} of {index} tables could not be saved");
        return Err(Status::ABORTED);
    }
    Ok(())
}
