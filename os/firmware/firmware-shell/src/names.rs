use alloc::format;
use alloc::string::String;
use firmware_acpi::Signature;

/// `<NN>-<SIG>.aml`, with the index wrapping at 100.
#[must_use]
pub fn dump_file_name(index: usize, signature: Signature) -> String {
    format!("{:02}-{signature}.aml", index % 100)
}

/// Whether a directory entry looks like a compiled ACPI table.
#[must_use]
pub fn is_aml_file(name: &str) -> bool {
    name.contains(".aml") || name.contains(".AML")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_names_wrap() {
        assert_eq!(dump_file_name(0, Signature::FADT), "00-FACP.aml");
        assert_eq!(dump_file_name(7, Signature::DSDT), "07-DSDT.aml");
        assert_eq!(dump_file_name(99, Signature::FACS), "99-FACS.aml");
        assert_eq!(dump_file_name(100, Signature::FACS), "00-FACS.aml");
        assert_eq!(dump_file_name(3, Signature([b'S', 0, b'D', b'T'])), "03-S?DT.aml");
    }

    #[test]
    fn aml_names() {
        assert!(is_aml_file("dsdt.aml"));
        assert!(is_aml_file("SSDT1.AML"));
        assert!(is_aml_file("table.aml.bak"));
        assert!(!is_aml_file("table.Aml"));
        assert!(!is_aml_file("readme.txt"));
    }
}
