use uefi::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VarError {
    #[error("variable name cannot be encoded")]
    InvalidName,
    #[error("variable value cannot be encoded")]
    InvalidValue,
    #[error("platform refused the variable: {0:?}")]
    Rejected(Status),
}

impl From<VarError> for Status {
    fn from(value: VarError) -> Self {
        match value {
            VarError::InvalidName | VarError::InvalidValue => Self::INVALID_PARAMETER,
            VarError::Rejected(status) => status,
        }
    }
}
