//! CLI error types for structured error handling.
//!
//! Errors map to specific exit codes. Core errors are classified by their
//! [`ErrorKind`]; anything else is a general failure.

use std::fmt;
use std::io::IsTerminal;

use owo_colors::OwoColorize;
use stegage_core::{ErrorKind, StegageError};

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Input file, image or config not found
    NotFound { message: String, hint: String },

    /// Invalid user input
    InvalidInput(String),

    /// Core pipeline failure
    Core(StegageError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => write!(f, "{}\n{}", message, hint),
            CliError::InvalidInput(message) => write!(f, "{}", message),
            CliError::Core(err) => match err {
                StegageError::InsufficientCapacity { .. } => write!(
                    f,
                    "{}\nHint: Run `stegage capacity <IMAGE>` to see how much fits.",
                    err
                ),
                StegageError::NoConcealedPayload => {
                    write!(f, "{}\nHint: Was this image produced by `stegage encode`?", err)
                }
                _ => write!(f, "{}", err),
            },
        }
    }
}

impl std::error::Error for CliError {}

impl From<StegageError> for CliError {
    fn from(err: StegageError) -> Self {
        CliError::Core(err)
    }
}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::Core(err) => core_exit_code(err),
        }
    }
}

fn core_exit_code(err: &StegageError) -> i32 {
    match err.kind() {
        ErrorKind::Config | ErrorKind::Format => exit_codes::INVALID_INPUT,
        ErrorKind::Capacity => exit_codes::INSUFFICIENT_CAPACITY,
        ErrorKind::Crypto => exit_codes::AUTH_FAILED,
        ErrorKind::Integrity => exit_codes::INTEGRITY_FAILED,
        ErrorKind::Io => match err {
            StegageError::Io { source } if source.kind() == std::io::ErrorKind::NotFound => {
                exit_codes::NOT_FOUND
            }
            _ => exit_codes::GENERAL,
        },
        ErrorKind::Internal => exit_codes::GENERAL,
    }
}

/// Exit code for any error reaching `main`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    if let Some(core_err) = err.downcast_ref::<StegageError>() {
        return core_exit_code(core_err);
    }
    exit_codes::GENERAL
}

/// Print `Error: <message>` to stderr and exit with the matching code.
pub fn exit_with(err: &anyhow::Error) -> ! {
    let colored = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    if colored {
        eprintln!("{} {}", "Error:".red().bold(), err);
    } else {
        eprintln!("Error: {}", err);
    }
    std::process::exit(exit_code_for(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_exit_codes() {
        let cases = [
            (StegageError::EmptyPassphrase, exit_codes::INVALID_INPUT),
            (
                StegageError::UnsupportedCoverFormat("gif".into()),
                exit_codes::INVALID_INPUT,
            ),
            (
                StegageError::InsufficientCapacity {
                    needed: 100,
                    capacity: 10,
                },
                exit_codes::INSUFFICIENT_CAPACITY,
            ),
            (StegageError::AuthenticationFailed, exit_codes::AUTH_FAILED),
            (StegageError::NoConcealedPayload, exit_codes::INTEGRITY_FAILED),
            (
                StegageError::InternalInconsistency("x".into()),
                exit_codes::GENERAL,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn test_exit_code_for_anyhow_chain() {
        let err: anyhow::Error = StegageError::AuthenticationFailed.into();
        assert_eq!(exit_code_for(&err), exit_codes::AUTH_FAILED);

        let err: anyhow::Error = CliError::not_found("missing", "hint").into();
        assert_eq!(exit_code_for(&err), exit_codes::NOT_FOUND);

        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), exit_codes::GENERAL);
    }

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err = StegageError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(CliError::from(err).exit_code(), exit_codes::NOT_FOUND);
    }

    #[test]
    fn test_capacity_error_carries_hint() {
        let err = CliError::from(StegageError::InsufficientCapacity {
            needed: 100,
            capacity: 10,
        });
        assert!(err.to_string().contains("stegage capacity"));
    }
}
