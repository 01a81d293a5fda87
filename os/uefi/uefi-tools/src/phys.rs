use firmware_acpi::PhysMapRo;

/// Physical memory as seen through the boot services identity map.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityMap;

impl PhysMapRo for IdentityMap {
    unsafe fn map_ro<'a>(&self, paddr: u64, len: usize) -> &'a [u8] {
        // SAFETY: The caller validated the range against the memory map,
        // and physical addresses equal virtual ones until ExitBootServices.
        unsafe { core::slice::from_raw_parts(paddr as usize as *const u8, len) }
    }
}
