use uefi::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RangeCheckError {
    #[error("{start:#x}-{start:#x} is zero length")]
    ZeroLength { start: u64 },
    #[error("range at {start:#x} with length {length:#x} wraps around")]
    Wraparound { start: u64, length: u64 },
    /// Part of the range is not covered; `first_missing` is where coverage stops.
    #[error("{start:#x}-{last:#x} not in memory map (starting at {first_missing:#x})")]
    NotMapped {
        start: u64,
        last: u64,
        first_missing: u64,
    },
    #[error("out of memory while capturing the memory map")]
    OutOfMemory,
    #[error("memory map query failed")]
    Unsupported,
}

impl From<RangeCheckError> for Status {
    fn from(value: RangeCheckError) -> Self {
        match value {
            RangeCheckError::ZeroLength { .. } | RangeCheckError::Wraparound { .. } => {
                Self::INVALID_PARAMETER
            }
            RangeCheckError::NotMapped { .. } => Self::NOT_FOUND,
            RangeCheckError::OutOfMemory => Self::OUT_OF_RESOURCES,
            RangeCheckError::Unsupported => Self::UNSUPPORTED,
        }
    }
}
