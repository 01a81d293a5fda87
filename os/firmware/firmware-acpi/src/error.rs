use crate::Signature;
use crate::store::TableHandle;
use uefi::Status;

/// Failures of [`crate::store::AcpiTableStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AcpiError {
    #[error("table is too short to carry its header")]
    Truncated,
    #[error("table declares {declared} bytes but {actual} were supplied")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("a {0} table is already installed")]
    Duplicate(Signature),
    #[error("out of resources")]
    OutOfResources,
    #[error("no table with handle {0}")]
    NotFound(TableHandle),
    #[error("operation aborted")]
    Aborted,
}

impl From<AcpiError> for Status {
    fn from(value: AcpiError) -> Self {
        match value {
            AcpiError::Truncated | AcpiError::LengthMismatch { .. } => Self::INVALID_PARAMETER,
            AcpiError::Duplicate(_) => Self::ACCESS_DENIED,
            AcpiError::OutOfResources => Self::OUT_OF_RESOURCES,
            AcpiError::NotFound(_) => Self::NOT_FOUND,
            AcpiError::Aborted => Self::ABORTED,
        }
    }
}

/// Failures that stop a table walk before it yields anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WalkError {
    #[error("no ACPI root pointer among the configuration tables")]
    RootNotFound,
    #[error("root pointer at {0:#x} is not in the memory map")]
    RootNotMapped(u64),
    #[error("no RSD PTR signature at {0:#x}")]
    BadRootSignature(u64),
    #[error("root pointer references neither an RSDT nor an XSDT")]
    NoRootTable,
    #[error("root table at {0:#x} is unmapped or corrupt")]
    RootTableUnreadable(u64),
}

impl From<WalkError> for Status {
    fn from(value: WalkError) -> Self {
        match value {
            WalkError::RootNotFound | WalkError::NoRootTable => Self::NOT_FOUND,
            WalkError::RootNotMapped(_) => Self::INVALID_PARAMETER,
            WalkError::BadRootSignature(_) | WalkError::RootTableUnreadable(_) => {
                Self::VOLUME_CORRUPTED
            }
        }
    }
}
