//! Cryptographic operations for stegage.
//!
//! Passphrase encryption in the age v1 format, built from maintained
//! primitives:
//! - **scrypt**: memory-hard derivation of the wrap key from the passphrase
//! - **ChaCha20-Poly1305**: file key wrapping and per-chunk payload sealing
//! - **HKDF-SHA256 / HMAC-SHA256**: subkeys and the header MAC
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the stego image
//! - Offline brute-force attacks on the passphrase
//! - Truncation or tampering of the hidden payload
//!
//! We do NOT defend against:
//! - Detection of the hidden payload by steganalysis
//! - Compromised OS / keylogger

pub mod engine;
pub mod header;
pub mod key;
pub mod passphrase;
pub(crate) mod stream;

pub use engine::{CipherEngine, EncryptionSession, PAYLOAD_NONCE_LEN};
pub use key::{derive_wrap_key, DerivedKey, FileKey};
pub use passphrase::{validate_passphrase, Passphrase};
