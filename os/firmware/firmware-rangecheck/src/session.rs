//! # Range Check Sessions

use crate::{MapEntry, MapReadError, MemoryMapSource, RangeCheckError};
use alloc::vec::Vec;
use log::{debug, warn};

/// Slack added to every fill attempt. Allocating the snapshot buffer can
/// split a free descriptor, which makes the map grow by itself.
const EXTRA_ENTRIES: usize = 8;

/// Size/fill rounds before the memory map is declared unstable.
const MAX_ATTEMPTS: usize = 16;

/// A sorted, immutable snapshot of the platform memory map.
///
/// Created with [`RangeCheck::open`]; a session created with validation
/// disabled never consults the platform and accepts every non-empty range.
#[derive(Debug)]
pub struct RangeCheck {
    enabled: bool,
    warn_on_miss: bool,
    entries: Vec<MapEntry>,
}

impl RangeCheck {
    /// Captures and sorts the memory map.
    ///
    /// # Errors
    /// * [`RangeCheckError::OutOfMemory`] if the snapshot buffer cannot be allocated.
    /// * [`RangeCheckError::Unsupported`] if the platform rejects the size query,
    ///   fails the fill query, or keeps growing the map past the retry limit.
    pub fn open(
        source: &mut impl MemoryMapSource,
        validate: bool,
        warn_on_miss: bool,
    ) -> Result<Self, RangeCheckError> {
        if !validate {
            return Ok(Self::disabled());
        }

        let mut entries = capture(source)?;
        entries.sort_unstable_by_key(|e| e.phys_start);
        debug!("Captured memory map with {} descriptors", entries.len());

        Ok(Self {
            enabled: true,
            warn_on_miss,
            entries,
        })
    }

    /// A session that validates nothing.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            warn_on_miss: false,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The sorted snapshot. Empty for disabled or closed sessions.
    #[must_use]
    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    /// Checks that `[start, start + length)` is covered by the snapshot.
    ///
    /// The range may be spread over several touching or overlapping
    /// descriptors. A gap anywhere inside it, including between two present
    /// descriptors that do not touch, makes the whole range unmapped.
    ///
    /// # Errors
    /// * [`RangeCheckError::ZeroLength`] if `length` is zero, whatever the session state.
    /// * [`RangeCheckError::NotMapped`] naming the first uncovered address.
    pub fn query(&self, start: u64, length: u64) -> Result<(), RangeCheckError> {
        if length == 0 {
            return Err(RangeCheckError::ZeroLength { start });
        }

        if !self.enabled {
            return Ok(());
        }

        let end = u128::from(start) + u128::from(length);
        let mut next = u128::from(start);

        // Descriptors are sorted by start but may overlap, so any earlier
        // one can still reach past `start`.
        for entry in &self.entries {
            if u128::from(entry.phys_start) > next {
                break;
            }

            let entry_end = entry.end();
            if entry_end > next {
                next = entry_end.min(end);
                if next == end {
                    return Ok(());
                }
            }
        }

        let err = RangeCheckError::NotMapped {
            start,
            last: u64::try_from(end - 1).unwrap_or(u64::MAX),
            first_missing: u64::try_from(next).unwrap_or(u64::MAX),
        };
        if self.warn_on_miss {
            warn!("{err}");
        }
        Err(err)
    }

    /// Like [`RangeCheck::query`], but first rejects ranges whose end does
    /// not fit in 64 bits.
    ///
    /// # Errors
    /// [`RangeCheckError::Wraparound`] in addition to the errors of [`RangeCheck::query`].
    pub fn query_checked(&self, start: u64, length: u64) -> Result<(), RangeCheckError> {
        if start.checked_add(length).is_none() {
            return Err(RangeCheckError::Wraparound { start, length });
        }
        self.query(start, length)
    }

    /// Releases the snapshot. Safe to call any number of times.
    pub fn close(&mut self) {
        self.entries = Vec::new();
        self.enabled = false;
        self.warn_on_miss = false;
    }
}

fn capture(source: &mut impl MemoryMapSource) -> Result<Vec<MapEntry>, RangeCheckError> {
    let mut required = match source.read_map(&mut []) {
        Err(MapReadError::BufferTooSmall { required }) => required,
        Ok(_) | Err(MapReadError::Failed) => {
            warn!("Memory map failed to size");
            return Err(RangeCheckError::Unsupported);
        }
    };

    for _ in 0..MAX_ATTEMPTS {
        let capacity = required.saturating_add(EXTRA_ENTRIES);

        let mut buf = Vec::new();
        if buf.try_reserve_exact(capacity).is_err() {
            warn!("Could not allocate {capacity} memory map entries");
            return Err(RangeCheckError::OutOfMemory);
        }
        buf.resize(capacity, MapEntry::default());

        match source.read_map(&mut buf) {
            Ok(count) => {
                buf.truncate(count);
                return Ok(buf);
            }
            Err(MapReadError::BufferTooSmall { required: grown }) => {
                debug!("Memory map grew to {grown} entries, retrying");
                required = grown;
            }
            Err(MapReadError::Failed) => {
                warn!("Memory map query failed");
                return Err(RangeCheckError::Unsupported);
            }
        }
    }

    warn!("Memory map did not settle after {MAX_ATTEMPTS} attempts");
    Err(RangeCheckError::Unsupported)
}
