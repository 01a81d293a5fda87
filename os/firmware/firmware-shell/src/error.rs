use uefi::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GetOptError {
    #[error("Unknown option '{0}'")]
    UnknownOption(char),
    #[error("Option '{0}' needs an argument")]
    MissingArgument(char),
    #[error("Missing operand")]
    MissingOperand,
    #[error("Invalid hex number")]
    InvalidNumber,
}

impl From<GetOptError> for Status {
    fn from(_: GetOptError) -> Self {
        Self::INVALID_PARAMETER
    }
}
