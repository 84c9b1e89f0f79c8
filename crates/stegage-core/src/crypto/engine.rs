//! Passphrase-based authenticated encryption of whole payloads.
//!
//! [`CipherEngine`] turns plaintext into a self-describing blob: a textual
//! header carrying the scrypt salt and work factor, the wrapped file key and a
//! header MAC, followed by a 16-byte payload nonce and the STREAM chunks.
//! Blobs are compatible with age v1 passphrase encryption.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::CipherConfig;
use crate::crypto::header::{self, ScryptStanza, WRAPPED_KEY_LEN};
use crate::crypto::key::{derive_wrap_key, DerivedKey, FileKey, FILE_KEY_LEN, SALT_LEN};
use crate::crypto::passphrase::Passphrase;
use crate::crypto::stream;
use crate::error::{Result, StegageError};

/// Length of the payload nonce that precedes the chunk stream.
pub const PAYLOAD_NONCE_LEN: usize = 16;

/// Random material for one encryption.
///
/// [`EncryptionSession::generate`] draws it from the OS CSPRNG. Building one
/// from fixed parts makes the output reproducible, which is only useful for
/// tests.
pub struct EncryptionSession {
    file_key: FileKey,
    salt: [u8; SALT_LEN],
    nonce: [u8; PAYLOAD_NONCE_LEN],
}

impl EncryptionSession {
    /// Fresh random session.
    pub fn generate() -> Result<Self> {
        let mut file_key = Zeroizing::new([0u8; FILE_KEY_LEN]);
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; PAYLOAD_NONCE_LEN];
        for buf in [&mut file_key[..], &mut salt[..], &mut nonce[..]] {
            getrandom::getrandom(buf).map_err(|e| {
                StegageError::EncryptionFailed(format!("Failed to gather randomness: {}", e))
            })?;
        }
        Ok(Self::from_parts(*file_key, salt, nonce))
    }

    /// Session with caller-chosen file key, salt and nonce.
    pub fn from_parts(
        file_key: [u8; FILE_KEY_LEN],
        salt: [u8; SALT_LEN],
        nonce: [u8; PAYLOAD_NONCE_LEN],
    ) -> Self {
        Self {
            file_key: FileKey::from_bytes(file_key),
            salt,
            nonce,
        }
    }
}

impl std::fmt::Debug for EncryptionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionSession")
            .field("file_key", &self.file_key)
            .field("salt", &self.salt)
            .field("nonce", &self.nonce)
            .finish()
    }
}

/// The file key is wrapped under a key used exactly once, so a zero nonce is safe.
const WRAP_NONCE: [u8; 12] = [0u8; 12];

fn wrap_file_key(wrap_key: &DerivedKey, file_key: &FileKey) -> Result<[u8; WRAPPED_KEY_LEN]> {
    let cipher = ChaCha20Poly1305::new_from_slice(wrap_key.as_bytes())
        .map_err(|e| StegageError::EncryptionFailed(e.to_string()))?;
    let sealed = cipher
        .encrypt(Nonce::from_slice(&WRAP_NONCE), file_key.as_bytes().as_slice())
        .map_err(|e| StegageError::EncryptionFailed(e.to_string()))?;
    sealed
        .as_slice()
        .try_into()
        .map_err(|_| StegageError::EncryptionFailed("wrapped key has the wrong length".to_string()))
}

fn unwrap_file_key(wrap_key: &DerivedKey, wrapped: &[u8; WRAPPED_KEY_LEN]) -> Result<FileKey> {
    let cipher = ChaCha20Poly1305::new_from_slice(wrap_key.as_bytes())
        .map_err(|_| StegageError::AuthenticationFailed)?;
    let opened = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&WRAP_NONCE), wrapped.as_slice())
            .map_err(|_| StegageError::AuthenticationFailed)?,
    );
    let bytes: [u8; FILE_KEY_LEN] = opened
        .as_slice()
        .try_into()
        .map_err(|_| StegageError::AuthenticationFailed)?;
    Ok(FileKey::from_bytes(bytes))
}

/// Password-based encryption engine.
#[derive(Debug, Clone)]
pub struct CipherEngine {
    config: CipherConfig,
}

impl CipherEngine {
    /// Engine for `config`. The work factor is checked when it is used, the
    /// chunk size here.
    pub fn new(config: CipherConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(StegageError::InvalidConfig(
                "chunk size must be positive".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &CipherConfig {
        &self.config
    }

    /// Exact blob length for a plaintext of `plaintext_len` bytes.
    pub fn sealed_len(&self, plaintext_len: usize) -> usize {
        header::header_len(self.config.work_factor)
            + PAYLOAD_NONCE_LEN
            + stream::sealed_len(plaintext_len, self.config.chunk_size)
    }

    /// Largest plaintext whose blob fits in `available` bytes.
    pub fn max_plaintext_len(&self, available: usize) -> Option<usize> {
        let overhead = header::header_len(self.config.work_factor) + PAYLOAD_NONCE_LEN;
        stream::max_plaintext_len(available.checked_sub(overhead)?, self.config.chunk_size)
    }

    /// Encrypt `plaintext` under `passphrase` with a fresh random session.
    ///
    /// # Errors
    ///
    /// - [`StegageError::EmptyPassphrase`]
    /// - [`StegageError::KeyDerivationFailed`] if the work factor is out of range
    /// - [`StegageError::EncryptionFailed`] on cipher failure
    pub fn encrypt(&self, passphrase: &Passphrase, plaintext: &[u8]) -> Result<Vec<u8>> {
        let session = EncryptionSession::generate()?;
        self.encrypt_with_session(passphrase, plaintext, &session)
    }

    /// Encrypt with explicit session material.
    pub fn encrypt_with_session(
        &self,
        passphrase: &Passphrase,
        plaintext: &[u8],
        session: &EncryptionSession,
    ) -> Result<Vec<u8>> {
        debug!(
            work_factor = self.config.work_factor,
            plaintext_len = plaintext.len(),
            "deriving wrap key"
        );
        let wrap_key = derive_wrap_key(passphrase, &session.salt, self.config.work_factor)?;

        let stanza = ScryptStanza {
            salt: session.salt,
            work_factor: self.config.work_factor,
            wrapped_key: wrap_file_key(&wrap_key, &session.file_key)?,
        };
        let mac_key = session.file_key.header_mac_key()?;
        let payload_key = session.file_key.payload_key(&session.nonce)?;

        let mut blob = header::encode_header(&stanza, &mac_key)?;
        blob.extend_from_slice(&session.nonce);
        blob.extend_from_slice(&stream::seal(
            &payload_key,
            plaintext,
            self.config.chunk_size,
        )?);

        debug!(blob_len = blob.len(), "sealed payload");
        Ok(blob)
    }

    /// Decrypt a blob produced by [`CipherEngine::encrypt`] (or any age v1
    /// passphrase encryption).
    ///
    /// A wrong passphrase and a corrupted blob are indistinguishable: both
    /// report [`StegageError::AuthenticationFailed`].
    ///
    /// # Errors
    ///
    /// - [`StegageError::MalformedHeader`] before any key derivation
    /// - [`StegageError::KeyDerivationFailed`] if the blob demands a work factor
    ///   above the configured maximum
    /// - [`StegageError::AuthenticationFailed`] on any tag or MAC mismatch
    pub fn decrypt(&self, passphrase: &Passphrase, blob: &[u8]) -> Result<Vec<u8>> {
        let parsed = header::parse_header(blob)?;
        let work_factor = parsed.stanza.work_factor;
        if work_factor > self.config.max_work_factor {
            return Err(StegageError::KeyDerivationFailed(format!(
                "work factor {} exceeds the maximum of {}",
                work_factor, self.config.max_work_factor
            )));
        }

        debug!(work_factor, blob_len = blob.len(), "deriving wrap key");
        let wrap_key = derive_wrap_key(passphrase, &parsed.stanza.salt, work_factor)?;
        let file_key = unwrap_file_key(&wrap_key, &parsed.stanza.wrapped_key)?;

        let mac_key = file_key.header_mac_key()?;
        header::verify_mac(&mac_key, parsed.mac_input, &parsed.mac)?;

        let payload = &blob[parsed.len..];
        if payload.len() < PAYLOAD_NONCE_LEN {
            return Err(StegageError::AuthenticationFailed);
        }
        let (nonce, chunks) = payload.split_at(PAYLOAD_NONCE_LEN);
        let payload_key = file_key.payload_key(nonce)?;
        let plaintext = stream::open(&payload_key, chunks, self.config.chunk_size)?;

        debug!(plaintext_len = plaintext.len(), "opened payload");
        Ok(plaintext)
    }
}
