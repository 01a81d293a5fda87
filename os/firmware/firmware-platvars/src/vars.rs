use crate::VarError;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use firmware_acpi::{DescriptionHeader, Signature};
use log::{debug, warn};

/// One `name=value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatVar {
    pub name: String,
    pub value: String,
}

impl PlatVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Where exported variables end up.
pub trait VarSink {
    /// # Errors
    /// Any [`VarError`] the store reports.
    fn set(&mut self, name: &str, value: &str) -> Result<(), VarError>;
}

/// `True`/`False` flag variable.
#[must_use]
pub fn flag(name: &str, present: bool) -> PlatVar {
    PlatVar::new(name, if present { "True" } else { "False" })
}

/// Writes every variable to `sink`, logging failures. Returns how many
/// were rejected.
pub fn export(sink: &mut impl VarSink, vars: &[PlatVar]) -> usize {
    let mut failed = 0;
    for var in vars {
        match sink.set(&var.name, &var.value) {
            Ok(()) => debug!("{}={}", var.name, var.value),
            Err(e) => {
                warn!("Could not set {}: {e}", var.name);
                failed += 1;
            }
        }
    }
    failed
}

/// Turns a fixed-width firmware id into a name fragment: cut at the first
/// NUL, spaces become `_`, anything else unprintable becomes `?`.
#[must_use]
pub fn sanitize(raw: &[u8]) -> String {
    raw.iter()
        .take_while(|&&b| b != 0)
        .map(|&b| match b {
            b' ' => '_',
            b if b.is_ascii_graphic() => char::from(b),
            _ => '?',
        })
        .collect()
}

/// Variables describing one ACPI table.
///
/// The FACS has no OEM fields and only reports its version, which lives
/// at byte 32 of `table`.
#[must_use]
pub fn acpi_table_vars(header: &DescriptionHeader, table: &[u8]) -> Vec<PlatVar> {
    let sig = header.signature;

    if sig == Signature::FACS {
        return table
            .get(32)
            .map(|version| PlatVar::new(format!("pvar-acpi-{sig}-rev"), format!("{version:#x}")))
            .into_iter()
            .collect();
    }

    let oem_id = sanitize(&header.oem_id);
    let oem_table_id = sanitize(&header.oem_table_id);

    let mut vars = Vec::with_capacity(6);
    vars.push(PlatVar::new(format!("pvar-acpi-{oem_id}"), "True"));
    vars.push(PlatVar::new(format!("pvar-acpi-{oem_table_id}"), "True"));
    vars.push(PlatVar::new(
        format!("pvar-acpi-{sig}-rev"),
        format!("{:#x}", header.revision),
    ));
    vars.push(PlatVar::new(format!("pvar-acpi-{sig}-oem-id"), oem_id));
    vars.push(PlatVar::new(
        format!("pvar-acpi-{sig}-oem-rev"),
        format!("{:#x}", header.oem_revision),
    ));
    vars.push(PlatVar::new(format!("pvar-acpi-{sig}-tab-id"), oem_table_id));
    vars
}
