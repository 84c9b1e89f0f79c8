//! Passphrase handling.
//!
//! A passphrase is an arbitrary non-empty byte sequence. It is kept in a
//! [`SecretBox`] so it is zeroized on drop and never printed.

use std::io::Read;

use secrecy::{ExposeSecret, SecretBox};

use crate::error::{Result, StegageError};

/// Secret used to derive the wrap key.
pub struct Passphrase {
    bytes: SecretBox<Vec<u8>>,
}

impl Passphrase {
    /// Wrap raw passphrase bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StegageError::EmptyPassphrase`] if `bytes` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use stegage_core::crypto::Passphrase;
    ///
    /// assert!(Passphrase::new("p4ss").is_ok());
    /// assert!(Passphrase::new("").is_err());
    /// ```
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        validate_passphrase(&bytes)?;
        Ok(Self {
            bytes: SecretBox::new(Box::new(bytes)),
        })
    }

    /// Read the whole stream as the passphrase. No trimming is applied.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::new(bytes)
    }

    /// Raw passphrase bytes. Use only for immediate key derivation.
    pub(crate) fn expose(&self) -> &[u8] {
        self.bytes.expose_secret()
    }
}

impl std::fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Passphrase")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Reject passphrases that cannot be used for encryption.
pub fn validate_passphrase(passphrase: &[u8]) -> Result<()> {
    if passphrase.is_empty() {
        return Err(StegageError::EmptyPassphrase);
    }
    Ok(())
}
