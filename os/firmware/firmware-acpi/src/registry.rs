//! # Configuration Table Registry

use uefi::{Guid, Status};

/// The platform's GUID-keyed configuration table list.
pub trait ConfigTableRegistry {
    /// Address registered under `guid`, if any.
    fn lookup(&self, guid: &Guid) -> Option<u64>;

    /// Registers `address` under `guid`, replacing an existing entry.
    /// `None` removes the entry.
    ///
    /// # Errors
    /// Whatever status the platform reports.
    fn install(&mut self, guid: &'static Guid, address: Option<u64>) -> Result<(), Status>;
}
