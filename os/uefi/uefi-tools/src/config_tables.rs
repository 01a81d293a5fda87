use core::ffi::c_void;
use firmware_acpi::ConfigTableRegistry;
use uefi::{Guid, Status, boot, system};

/// The system table's configuration table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigTables;

impl ConfigTableRegistry for SystemConfigTables {
    fn lookup(&self, guid: &Guid) -> Option<u64> {
        system::with_config_table(|entries| {
            entries
                .iter()
                .find(|entry| entry.guid == *guid)
                .map(|entry| entry.address as usize as u64)
        })
    }

    fn install(&mut self, guid: &'static Guid, address: Option<u64>) -> Result<(), Status> {
        let table = address.map_or(core::ptr::null(), |a| a as usize as *const c_void);
        // SAFETY: `table` is either null, which removes the entry, or the
        // address of a table the caller keeps alive for the rest of boot.
        unsafe { boot::install_configuration_table(guid, table) }.map_err(|e| e.status())
    }
}
