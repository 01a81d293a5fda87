//! # Shell Argument Helpers
//!
//! Small pieces shared by the shell applications: a `getopt`-style option
//! scanner, hex argument parsing, and the naming rules for dumped and
//! loaded table files.

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod error;
mod getopt;
mod names;

pub use error::GetOptError;
pub use getopt::{GetOpt, Opt};
pub use names::{dump_file_name, is_aml_file};

/// Parses a hexadecimal number with an optional `0x`/`0X` prefix.
///
/// # Errors
/// [`GetOptError::InvalidNumber`] for empty input, non-hex digits, or
/// values that do not fit in 64 bits.
pub fn parse_hex(word: &str) -> Result<u64, GetOptError> {
    let digits = word
        .strip_prefix("0x")
        .or_else(|| word.strip_prefix("0X"))
        .unwrap_or(word);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(GetOptError::InvalidNumber);
    }
    u64::from_str_radix(digits, 16).map_err(|_| GetOptError::InvalidNumber)
}
