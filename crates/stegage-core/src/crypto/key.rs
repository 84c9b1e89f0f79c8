//! Key derivation.
//!
//! The wrap key comes from the passphrase through scrypt, a memory-hard KDF.
//! Every other key (header MAC key, payload key) is expanded from the random
//! file key with HKDF-SHA256.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::passphrase::{validate_passphrase, Passphrase};
use crate::error::{Result, StegageError};

/// Domain separation prefix prepended to the scrypt salt.
const SCRYPT_SALT_LABEL: &[u8] = b"age-encryption.org/v1/scrypt";

/// HKDF info for the header MAC key.
const HEADER_KEY_LABEL: &[u8] = b"header";

/// HKDF info for the payload key.
const PAYLOAD_KEY_LABEL: &[u8] = b"payload";

/// scrypt block size.
const SCRYPT_R: u32 = 8;

/// scrypt parallelism.
const SCRYPT_P: u32 = 1;

/// Length of the random salt in the scrypt stanza.
pub const SALT_LEN: usize = 16;

/// Length of the random file key.
pub const FILE_KEY_LEN: usize = 16;

/// Length of derived symmetric keys (ChaCha20-Poly1305, HMAC-SHA256).
pub const KEY_LEN: usize = 32;

/// A 256-bit symmetric key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LEN],
}

impl DerivedKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { key: bytes }
    }

    /// Raw key bytes. Avoid storing or logging this value.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// The per-blob random key everything else hangs off.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct FileKey {
    key: [u8; FILE_KEY_LEN],
}

impl FileKey {
    /// Wrap raw file key bytes.
    pub fn from_bytes(bytes: [u8; FILE_KEY_LEN]) -> Self {
        Self { key: bytes }
    }

    /// Raw key bytes. Avoid storing or logging this value.
    pub fn as_bytes(&self) -> &[u8; FILE_KEY_LEN] {
        &self.key
    }

    /// Key for the header MAC.
    pub fn header_mac_key(&self) -> Result<DerivedKey> {
        hkdf_expand(&[], &self.key, HEADER_KEY_LABEL)
    }

    /// Key for the STREAM payload, bound to the payload nonce.
    pub fn payload_key(&self, nonce: &[u8]) -> Result<DerivedKey> {
        hkdf_expand(nonce, &self.key, PAYLOAD_KEY_LABEL)
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

fn hkdf_expand(salt: &[u8], ikm: &[u8], info: &[u8]) -> Result<DerivedKey> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| StegageError::KeyDerivationFailed(format!("HKDF expand failed: {}", e)))?;
    let key = DerivedKey::from_bytes(okm);
    okm.zeroize();
    Ok(key)
}

/// Derive the wrap key from a passphrase using scrypt.
///
/// N = 2^`work_factor`, r = 8, p = 1. The salt is domain-separated with the
/// `age-encryption.org/v1/scrypt` label.
///
/// # Errors
///
/// - [`StegageError::EmptyPassphrase`] for an empty passphrase
/// - [`StegageError::KeyDerivationFailed`] if scrypt rejects the parameters
pub fn derive_wrap_key(
    passphrase: &Passphrase,
    salt: &[u8; SALT_LEN],
    work_factor: u8,
) -> Result<DerivedKey> {
    validate_passphrase(passphrase.expose())?;

    if work_factor == 0 {
        return Err(StegageError::KeyDerivationFailed(
            "work factor must be positive".to_string(),
        ));
    }

    let params = scrypt::Params::new(work_factor, SCRYPT_R, SCRYPT_P, KEY_LEN).map_err(|e| {
        StegageError::KeyDerivationFailed(format!("Invalid scrypt parameters: {}", e))
    })?;

    let mut labelled_salt = Vec::with_capacity(SCRYPT_SALT_LABEL.len() + SALT_LEN);
    labelled_salt.extend_from_slice(SCRYPT_SALT_LABEL);
    labelled_salt.extend_from_slice(salt);

    let mut key_bytes = [0u8; KEY_LEN];
    scrypt::scrypt(passphrase.expose(), &labelled_salt, &params, &mut key_bytes)
        .map_err(|e| StegageError::KeyDerivationFailed(format!("scrypt failed: {}", e)))?;

    let key = DerivedKey::from_bytes(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; SALT_LEN] = *b"0123456789abcdef";

    #[test]
    fn test_wrap_key_deterministic() {
        let passphrase = Passphrase::new("test-passphrase").unwrap();

        let key1 = derive_wrap_key(&passphrase, &SALT, 10).unwrap();
        let key2 = derive_wrap_key(&passphrase, &SALT, 10).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let passphrase = Passphrase::new("test-passphrase").unwrap();
        let other_salt = *b"fedcba9876543210";

        let key1 = derive_wrap_key(&passphrase, &SALT, 10).unwrap();
        let key2 = derive_wrap_key(&passphrase, &other_salt, 10).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_work_factor_different_key() {
        let passphrase = Passphrase::new("test-passphrase").unwrap();

        let key1 = derive_wrap_key(&passphrase, &SALT, 10).unwrap();
        let key2 = derive_wrap_key(&passphrase, &SALT, 11).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_zero_work_factor_rejected() {
        let passphrase = Passphrase::new("test-passphrase").unwrap();
        let result = derive_wrap_key(&passphrase, &SALT, 0);
        assert!(matches!(result, Err(StegageError::KeyDerivationFailed(_))));
    }

    #[test]
    fn test_out_of_range_work_factor_rejected() {
        let passphrase = Passphrase::new("test-passphrase").unwrap();
        let result = derive_wrap_key(&passphrase, &SALT, 64);
        assert!(matches!(result, Err(StegageError::KeyDerivationFailed(_))));
    }

    #[test]
    fn test_payload_key_bound_to_nonce() {
        let file_key = FileKey::from_bytes([7u8; FILE_KEY_LEN]);

        let key1 = file_key.payload_key(&[1u8; 16]).unwrap();
        let key2 = file_key.payload_key(&[2u8; 16]).unwrap();
        let mac_key = file_key.header_mac_key().unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
        assert_ne!(key1.as_bytes(), mac_key.as_bytes());
    }

    #[test]
    fn test_derived_key_debug_redacts() {
        let passphrase = Passphrase::new("test-passphrase").unwrap();
        let key = derive_wrap_key(&passphrase, &SALT, 10).unwrap();

        let debug_output = format!("{:?}", key);
        assert!(debug_output.contains("REDACTED"));

        let key_hex = hex::encode(&key.as_bytes()[..4]);
        assert!(!debug_output.contains(&key_hex));
    }

    #[test]
    fn test_file_key_debug_redacts() {
        let file_key = FileKey::from_bytes([0xabu8; FILE_KEY_LEN]);
        let debug_output = format!("{:?}", file_key);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("abab"));
    }
}
