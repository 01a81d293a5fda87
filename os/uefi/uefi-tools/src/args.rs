//! Shell command line access.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use uefi::boot;
use uefi::proto::shell_params::ShellParameters;

/// The words the shell passed, program name first. `None` when the image
/// was not started from the shell.
#[must_use]
pub fn shell_args() -> Option<Vec<String>> {
    let params = boot::open_protocol_exclusive::<ShellParameters>(boot::image_handle()).ok()?;
    Some(params.args().map(|arg| arg.to_string()).collect())
}

/// Name the tool was invoked as, for usage lines.
#[must_use]
pub fn program_name<'a>(args: &'a [String], fallback: &'a str) -> &'a str {
    args.first().map_or(fallback, String::as_str)
}
