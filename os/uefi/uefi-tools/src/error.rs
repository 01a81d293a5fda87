use alloc::string::String;
use uefi::Status;

/// File access failures of [`crate::ToolDir`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FsError {
    #[error("Could not open filesystem: {0:?}")]
    NoFileSystem(Status),
    #[error("'{0}' is not a valid path")]
    InvalidPath(String),
    #[error("'{0}' is not a directory")]
    NotADirectory(String),
    #[error("'{0}' is not a regular file")]
    NotAFile(String),
    #[error("{action} '{path}' failed: {status:?}")]
    Io {
        action: &'static str,
        path: String,
        status: Status,
    },
    #[error("Short read of '{path}': {read} of {size} bytes")]
    ShortRead {
        path: String,
        read: usize,
        size: usize,
    },
}

impl From<FsError> for Status {
    fn from(value: FsError) -> Self {
        match value {
            FsError::NoFileSystem(status) | FsError::Io { status, .. } => status,
            FsError::InvalidPath(_) => Self::INVALID_PARAMETER,
            FsError::NotADirectory(_) | FsError::NotAFile(_) => Self::UNSUPPORTED,
            FsError::ShortRead { .. } => Self::DEVICE_ERROR,
        }
    }
}
