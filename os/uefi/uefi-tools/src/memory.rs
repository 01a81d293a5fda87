use firmware_acpi::{MemoryClass, PageAllocator, Pages};
use log::warn;
use uefi::Status;
use uefi::boot::{self, AllocateType, MemoryType};

/// Boot services page allocator for ACPI table memory.
///
/// Pages are identity-mapped while boot services run, so the address
/// handed out is also the physical address tables refer to.
#[derive(Debug, Default, Clone, Copy)]
pub struct BootPages;

const fn memory_type(class: MemoryClass) -> MemoryType {
    match class {
        MemoryClass::Reclaim => MemoryType::ACPI_RECLAIM,
        MemoryClass::Nvs => MemoryType::ACPI_NON_VOLATILE,
    }
}

impl PageAllocator for BootPages {
    fn allocate_pages(&mut self, count: usize, class: MemoryClass) -> Result<Pages, Status> {
        let base = boot::allocate_pages(AllocateType::AnyPages, memory_type(class), count)
            .map_err(|e| e.status())?;
        // SAFETY: boot services handed us `count` fresh pages at `base`.
        Ok(unsafe { Pages::from_raw(base, count) })
    }

    fn free_pages(&mut self, pages: Pages) {
        // SAFETY: `pages` came from `allocate_pages` above and is consumed here.
        if let Err(e) = unsafe { boot::free_pages(pages.as_ptr(), pages.page_count()) } {
            warn!("Could not free {} pages @ {:#x}: {e:?}", pages.page_count(), pages.address());
        }
    }
}
