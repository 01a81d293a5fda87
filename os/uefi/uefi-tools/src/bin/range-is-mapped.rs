//! # `range-is-mapped [-v] [-q] <start> <length>`
//!
//! Tells whether the physical range `[start, start + length)` is fully
//! described by the memory map. Both numbers are hexadecimal.
//!
//! Returns `SUCCESS` if it is, `NOT_FOUND` if it is not, and
//! `INVALID_PARAMETER` for bad arguments.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![no_main]

extern crate alloc;

use alloc::string::String;
use firmware_rangecheck::{RangeCheck, RangeCheckError};
use firmware_shell::{GetOpt, GetOptError, parse_hex};
use uefi::prelude::*;
use uefi_tools::logger::{self, UefiLogger};
use uefi_tools::{BootMemoryMap, args};

struct Options {
    warn_on_miss: bool,
    start: u64,
    length: u64,
}

fn parse(args: &[String]) -> Result<Options, GetOptError> {
    let mut warn_on_miss = true;
    let mut opts = GetOpt::new(args, "");
    for opt in opts.by_ref() {
        match opt.flag {
            'v' => logger::set_verbose(),
            'q' => warn_on_miss = false,
            _ => return Err(opt.unknown()),
        }
    }

    let [start, length, ..] = opts.operands() else {
        return Err(GetOptError::MissingOperand);
    };
    Ok(Options {
        warn_on_miss,
        start: parse_hex(start)?,
        length: parse_hex(length)?,
    })
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
    let options = match parse(&args) {
        Ok(options) => options,
        Err(e) => {
            uefi::println!("{e}");
            uefi::println!(
                "Usage: {} [-v] [-q] range-start range-length",
                args::program_name(&args, "range-is-mapped")
            );
            return e.into();
        }
    };

    let check = match RangeCheck::open(&mut BootMemoryMap, true, options.warn_on_miss) {
        Ok(check) => check,
        Err(e) => {
            uefi::println!("Error: {e}");
            return e.into();
        }
    };

    match check.query_checked(options.start, options.length) {
        Ok(()) => {
            uefi::println!(
                "{:#x}-{:#x} is in the memory map",
                options.start,
                options.start + (options.length - 1)
            );
            Status::SUCCESS
        }
        Err(e @ (RangeCheckError::ZeroLength { .. } | RangeCheckError::Wraparound { .. })) => {
            uefi::println!("Invalid range passed");
            e.into()
        }
        // The session already warned, unless told to keep quiet.
        Err(e) => e.into(),
    }
}
