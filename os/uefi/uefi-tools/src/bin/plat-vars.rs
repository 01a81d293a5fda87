//! # `plat-vars [-v]`
//!
//! Exports `pvar-*` shell variables describing the platform's SMBIOS, ACPI
//! and device tree tables. See `firmware_platvars` for the full list.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![no_main]

extern crate alloc;

use alloc::string::String;
use firmware_acpi::PhysReader;
use firmware_platvars::{Firmware, collect, export};
use firmware_rangecheck::RangeCheck;
use firmware_shell::{GetOpt, GetOptError};
use log::{debug, error};
use uefi::prelude::*;
use uefi_tools::logger::{self, UefiLogger};
use uefi_tools::{BootMemoryMap, IdentityMap, ShellVars, SystemConfigTables, args};

fn parse(args: &[String]) -> Result<(), GetOptError> {
    for opt in GetOpt::new(args, "") {
        match opt.flag {
            'v' => logger::set_verbose(),
            _ => return Err(opt.unknown()),
        }
    }
    Ok(())
}

#[entry]
fn main() -> Status {
    if UefiLogger::init().is_err() {
        return Status::ABORTED;
    }

    let Some(args) = args::shell_args() else {
        uefi::println!("This program requires the UEFI Shell");
        return Status::UNSUPPORTED;
    };
    if let Err(e) = parse(&args) {
        uefi::println!("{e}");
        uefi::println!("Usage: {} [-v]", args::program_name(&args, "plat-vars"));
        return e.into();
    }

    let check = match RangeCheck::open(&mut BootMemoryMap, true, true) {
        Ok(check) => check,
        Err(e) => {
            error!("Could not capture the memory map: {e}");
            return e.into();
        }
    };
    // SAFETY: Boot services are running, so physical memory is identity
    // mapped, and every read goes through `check` first.
    let reader = unsafe { PhysReader::new(&IdentityMap, &check) };

    let firmware = Firmware::from_registry(&SystemConfigTables);
    debug!("{firmware:x?}");

    let vars = collect(&reader, &firmware);
    let failed = export(&mut ShellVars, &vars);
    if failed > 0 {
        uefi::println!("{failed} of {} variables could not be set", vars.len());
        return Status::ABORTED;
    }
    Status::SUCCESS
}
