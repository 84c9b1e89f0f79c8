//! Error types for stegage core operations.
//!
//! Every failure in the conceal/reveal pipeline surfaces as a
//! [`StegageError`]. Variants are fine-grained at the core level; callers that
//! only care about the broad category (the CLI maps categories to exit codes)
//! use [`StegageError::kind`].

use thiserror::Error;

/// Result type alias for stegage operations.
pub type Result<T> = std::result::Result<T, StegageError>;

/// Core error type for stegage operations.
#[derive(Debug, Error)]
pub enum StegageError {
    /// Passphrase was empty
    #[error("Passphrase cannot be empty")]
    EmptyPassphrase,

    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// scrypt parameters rejected or key derivation failed
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    /// Cipher-level failure while sealing
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Ciphertext header could not be parsed
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// A tag or MAC did not verify: wrong passphrase or corrupted data
    #[error("Incorrect passphrase or corrupted data")]
    AuthenticationFailed,

    /// Cover image could not be decoded into a pixel grid
    #[error("Unsupported cover format: {0}")]
    UnsupportedCoverFormat(String),

    /// Stego image could not be serialized
    #[error("Failed to encode output image: {0}")]
    OutputEncodingFailed(String),

    /// Payload plus length prefix does not fit the cover
    #[error("Cover image too small: need {needed} bits, capacity is {capacity} bits")]
    InsufficientCapacity { needed: u64, capacity: u64 },

    /// Length prefix read from an image points past the end of the carrier
    #[error("Declared payload of {declared} bits exceeds carrier capacity of {capacity} bits")]
    DeclaredLengthExceedsCapacity { declared: u64, capacity: u64 },

    /// Extracted bytes do not start with the ciphertext magic
    #[error("No concealed payload found in image")]
    NoConcealedPayload,

    /// The cipher engine produced output that breaks its own contract
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// I/O error on a caller-supplied stream
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Broad error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty passphrase or out-of-range settings
    Config,
    /// Unsupported or undecodable image
    Format,
    /// Payload exceeds cover capacity
    Capacity,
    /// Key derivation or authentication failure
    Crypto,
    /// Missing magic header or corrupted length prefix
    Integrity,
    /// Engine contract violation
    Internal,
    /// Stream I/O
    Io,
}

impl StegageError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StegageError::EmptyPassphrase | StegageError::InvalidConfig(_) => ErrorKind::Config,
            StegageError::UnsupportedCoverFormat(_) | StegageError::OutputEncodingFailed(_) => {
                ErrorKind::Format
            }
            StegageError::InsufficientCapacity { .. } => ErrorKind::Capacity,
            StegageError::KeyDerivationFailed(_)
            | StegageError::EncryptionFailed(_)
            | StegageError::MalformedHeader(_)
            | StegageError::AuthenticationFailed => ErrorKind::Crypto,
            StegageError::DeclaredLengthExceedsCapacity { .. }
            | StegageError::NoConcealedPayload => ErrorKind::Integrity,
            StegageError::InternalInconsistency(_) => ErrorKind::Internal,
            StegageError::Io { .. } => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_passphrase_and_corruption_share_a_message() {
        let err = StegageError::AuthenticationFailed;
        assert_eq!(err.kind(), ErrorKind::Crypto);
        assert_eq!(err.to_string(), "Incorrect passphrase or corrupted data");
    }

    #[test]
    fn test_stage_boundary_errors_are_integrity() {
        assert_eq!(StegageError::NoConcealedPayload.kind(), ErrorKind::Integrity);
        let err = StegageError::DeclaredLengthExceedsCapacity {
            declared: 800,
            capacity: 64,
        };
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert!(err.to_string().contains("800 bits"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: StegageError = io.into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
