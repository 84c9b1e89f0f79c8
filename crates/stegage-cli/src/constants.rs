//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells, and by clap)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Unclassified failure.
    pub const GENERAL: i32 = 1;

    /// Input file, image or config not found.
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input, config or unsupported image format.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong passphrase or corrupted data).
    pub const AUTH_FAILED: i32 = 5;

    /// No hidden payload, or a corrupted one.
    pub const INTEGRITY_FAILED: i32 = 6;

    /// Cover image too small for the payload.
    pub const INSUFFICIENT_CAPACITY: i32 = 7;
}

/// Environment variable holding the passphrase for non-interactive use.
pub const PASSPHRASE_ENV: &str = "STEGAGE_PASSPHRASE";
