//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::LineageError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type shown to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<LineageError> for CliError {
    fn from(e: LineageError) -> Self {
        ApplicationError::Domain(e).into()
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(InfraError::Io { .. }) => exitcode::IOERR,
            CliError::Infra(InfraError::Application(e)) => match e {
                ApplicationError::Domain(_) => exitcode::DATAERR,
                ApplicationError::DocumentNotFound(_) => exitcode::NOINPUT,
                ApplicationError::SpeciesNotFound(_) | ApplicationError::NoTree => exitcode::DATAERR,
                ApplicationError::Config { .. } => exitcode::CONFIG,
                ApplicationError::OperationFailed { .. } => exitcode::IOERR,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_domain_error_when_mapping_exit_code_then_returns_dataerr() {
        let err = CliError::from(ApplicationError::Domain(LineageError::EmptyJoin));

        assert_eq!(err.exit_code(), exitcode::DATAERR);
    }

    #[test]
    fn given_missing_document_when_mapping_exit_code_then_returns_noinput() {
        let err = CliError::from(ApplicationError::DocumentNotFound("tree.json".into()));

        assert_eq!(err.exit_code(), exitcode::NOINPUT);
    }
}
