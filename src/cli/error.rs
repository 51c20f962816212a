//! CLI-specific error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Service error: {0}")]
    Service(#[from] registry_admission::ServiceError),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Login failed: {0}")]
    Login(String),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Login(_) => 3,
            CliError::Service(e) if e.is_retryable() => 4,
            CliError::Io(_) | CliError::Service(_) | CliError::Server(_) => 1,
        }
    }
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use registry_admission::ServiceError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Config("x".into()).exit_code(), 2);
        assert_eq!(CliError::Login("denied".into()).exit_code(), 3);
        assert_eq!(
            CliError::from(ServiceError::ProviderUnavailable("down".into())).exit_code(),
            4
        );
        assert_eq!(
            CliError::from(ServiceError::InvalidInput("bad".into())).exit_code(),
            1
        );
    }
}
