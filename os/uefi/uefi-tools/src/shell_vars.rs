use firmware_platvars::{VarError, VarSink};
use uefi::runtime::{self, VariableAttributes, VariableVendor};
use uefi::{CString16, Guid, guid};

/// Vendor GUID under which the shell keeps its environment variables.
pub const SHELL_VARIABLE_GUID: Guid = guid!("158def5a-f656-419c-b027-7a3192c079d2");

/// Volatile shell environment variables.
///
/// Values are stored as NUL-terminated UTF-16, which is what the shell's
/// `set` command reads back.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellVars;

impl VarSink for ShellVars {
    fn set(&mut self, name: &str, value: &str) -> Result<(), VarError> {
        let name = CString16::try_from(name).map_err(|_| VarError::InvalidName)?;
        let value = CString16::try_from(value).map_err(|_| VarError::InvalidValue)?;
        runtime::set_variable(
            &name,
            &VariableVendor(SHELL_VARIABLE_GUID),
            VariableAttributes::BOOTSERVICE_ACCESS,
            value.as_bytes(),
        )
        .map_err(|e| VarError::Rejected(e.status()))
    }
}
