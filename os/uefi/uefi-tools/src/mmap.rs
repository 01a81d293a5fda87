//! # UEFI Memory Map Source
//!
//! `boot::memory_map` already sizes, allocates and retries on its own, so
//! each call here takes a fresh copy and reports its descriptor count. The
//! range check session then sizes its own buffer from that count.

use firmware_rangecheck::{MapEntry, MapReadError, MemoryMapSource};
use log::warn;
use uefi::boot::{self, MemoryType};
use uefi::mem::memory_map::MemoryMap;

#[derive(Debug, Default, Clone, Copy)]
pub struct BootMemoryMap;

impl MemoryMapSource for BootMemoryMap {
    fn read_map(&mut self, out: &mut [MapEntry]) -> Result<usize, MapReadError> {
        let map = boot::memory_map(MemoryType::LOADER_DATA).map_err(|e| {
            warn!("Failed to get memory map: {e:?}");
            MapReadError::Failed
        })?;

        let count = map.len();
        if out.len() < count {
            return Err(MapReadError::BufferTooSmall { required: count });
        }

        for (slot, desc) in out.iter_mut().zip(map.entries()) {
            *slot = MapEntry::new(desc.phys_start, desc.page_count);
        }
        Ok(count)
    }
}
