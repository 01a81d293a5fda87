//! # Memory Map Sources

use crate::PAGE_SIZE;

/// One platform memory descriptor, reduced to what range validation needs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MapEntry {
    pub phys_start: u64,
    pub page_count: u64,
}

impl MapEntry {
    #[must_use]
    pub const fn new(phys_start: u64, page_count: u64) -> Self {
        Self {
            phys_start,
            page_count,
        }
    }

    /// Exclusive end address. Computed in 128 bits so that a descriptor
    /// reaching the top of the address space does not wrap.
    #[must_use]
    pub fn end(&self) -> u128 {
        u128::from(self.phys_start) + u128::from(self.page_count) * u128::from(PAGE_SIZE)
    }
}

/// Failure reported by a [`MemoryMapSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapReadError {
    /// The buffer cannot hold the current map; `required` entries are needed.
    BufferTooSmall { required: usize },
    /// The platform refused to report a map.
    Failed,
}

/// Platform memory map provider.
///
/// Mirrors the size-then-fill protocol of `GetMemoryMap()`: a call with a
/// buffer that is too small reports the number of entries required, and the
/// map may grow between two calls.
pub trait MemoryMapSource {
    /// Copies the current map into `out` and returns the number of entries
    /// written.
    ///
    /// # Errors
    /// [`MapReadError::BufferTooSmall`] when `out` cannot hold the whole map,
    /// [`MapReadError::Failed`] for any other platform failure.
    fn read_map(&mut self, out: &mut [MapEntry]) -> Result<usize, MapReadError>;
}
