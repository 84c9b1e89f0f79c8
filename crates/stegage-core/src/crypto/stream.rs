//! Chunked authenticated payload encryption (STREAM construction).
//!
//! The plaintext is cut into fixed-size chunks, each sealed with
//! ChaCha20-Poly1305 under the payload key. The 12-byte nonce is an 11-byte
//! big-endian chunk counter followed by a flag byte that is `0x01` only on
//! the final chunk, so dropping trailing chunks breaks authentication.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};

use crate::crypto::header::TAG_LEN;
use crate::crypto::key::DerivedKey;
use crate::error::{Result, StegageError};

const LAST_CHUNK_FLAG: u8 = 0x01;

fn chunk_nonce(counter: u64, last: bool) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[3..11].copy_from_slice(&counter.to_be_bytes());
    if last {
        nonce[11] = LAST_CHUNK_FLAG;
    }
    nonce
}

fn chunk_count(plaintext_len: usize, chunk_size: usize) -> usize {
    plaintext_len.div_ceil(chunk_size).max(1)
}

/// Ciphertext length for `plaintext_len` bytes of plaintext.
pub(crate) fn sealed_len(plaintext_len: usize, chunk_size: usize) -> usize {
    plaintext_len + TAG_LEN * chunk_count(plaintext_len, chunk_size)
}

/// Largest plaintext whose sealed form fits in `available` bytes.
pub(crate) fn max_plaintext_len(available: usize, chunk_size: usize) -> Option<usize> {
    if available < TAG_LEN {
        return None;
    }
    let sealed_chunk = chunk_size + TAG_LEN;
    let full_chunks = available / sealed_chunk;
    let remainder = available % sealed_chunk;
    if remainder > TAG_LEN {
        Some(full_chunks * chunk_size + remainder - TAG_LEN)
    } else {
        Some(full_chunks * chunk_size)
    }
}

/// Seal `plaintext` into a sequence of tagged chunks.
pub(crate) fn seal(key: &DerivedKey, plaintext: &[u8], chunk_size: usize) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|e| StegageError::EncryptionFailed(e.to_string()))?;

    let mut out = Vec::with_capacity(sealed_len(plaintext.len(), chunk_size));
    let total = chunk_count(plaintext.len(), chunk_size);

    // An empty plaintext still produces one (empty) final chunk.
    for counter in 0..total {
        let start = (counter * chunk_size).min(plaintext.len());
        let end = (start + chunk_size).min(plaintext.len());
        let chunk = &plaintext[start..end];
        let last = counter + 1 == total;
        let nonce = chunk_nonce(counter as u64, last);
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), chunk)
            .map_err(|e| StegageError::EncryptionFailed(e.to_string()))?;
        out.extend_from_slice(&sealed);
    }

    Ok(out)
}

/// Open a sealed chunk sequence.
///
/// Each chunk is authenticated before any of its plaintext is kept. The
/// sequence must end with a chunk sealed as final, and only the first chunk
/// may be empty.
pub(crate) fn open(key: &DerivedKey, ciphertext: &[u8], chunk_size: usize) -> Result<Vec<u8>> {
    if ciphertext.is_empty() {
        return Err(StegageError::AuthenticationFailed);
    }

    let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|_| StegageError::AuthenticationFailed)?;

    let sealed_chunk = chunk_size + TAG_LEN;
    let total = ciphertext.len().div_ceil(sealed_chunk);
    let mut out = Vec::with_capacity(ciphertext.len());

    for (counter, chunk) in ciphertext.chunks(sealed_chunk).enumerate() {
        let last = counter + 1 == total;
        if chunk.len() < TAG_LEN || (last && counter > 0 && chunk.len() == TAG_LEN) {
            return Err(StegageError::AuthenticationFailed);
        }
        let nonce = chunk_nonce(counter as u64, last);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), chunk)
            .map_err(|_| StegageError::AuthenticationFailed)?;
        out.extend_from_slice(&plaintext);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHUNK: usize = 64;

    fn key() -> DerivedKey {
        DerivedKey::from_bytes([0x5a; 32])
    }

    #[test]
    fn test_nonce_layout() {
        let nonce = chunk_nonce(0x0102, true);
        assert_eq!(nonce, [0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x02, 0x01]);
        assert_eq!(chunk_nonce(0, false), [0u8; 12]);
    }

    #[test]
    fn test_sealed_len_accounts_for_every_chunk() {
        assert_eq!(sealed_len(0, CHUNK), 16);
        assert_eq!(sealed_len(1, CHUNK), 17);
        assert_eq!(sealed_len(CHUNK, CHUNK), CHUNK + 16);
        assert_eq!(sealed_len(CHUNK + 1, CHUNK), CHUNK + 1 + 32);

        for len in [0, 1, CHUNK - 1, CHUNK, CHUNK + 1, 3 * CHUNK] {
            let sealed = seal(&key(), &vec![7u8; len], CHUNK).unwrap();
            assert_eq!(sealed.len(), sealed_len(len, CHUNK), "len {}", len);
        }
    }

    #[test]
    fn test_max_plaintext_len_inverts_sealed_len() {
        assert_eq!(max_plaintext_len(15, CHUNK), None);
        for available in [16, 17, 79, 80, 81, 96, 97, 200, 1000] {
            let max = max_plaintext_len(available, CHUNK).unwrap();
            assert!(sealed_len(max, CHUNK) <= available, "available {}", available);
            assert!(sealed_len(max + 1, CHUNK) > available, "available {}", available);
        }
    }

    #[test]
    fn test_multi_chunk_round_trip() {
        let plaintext: Vec<u8> = (0..=255u8).cycle().take(5 * CHUNK + 3).collect();
        let sealed = seal(&key(), &plaintext, CHUNK).unwrap();
        let opened = open(&key(), &sealed, CHUNK).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let plaintext = vec![1u8; 2 * CHUNK];
        let sealed = seal(&key(), &plaintext, CHUNK).unwrap();
        assert_eq!(sealed.len(), 2 * (CHUNK + 16));
        assert_eq!(open(&key(), &sealed, CHUNK).unwrap(), plaintext);
    }

    #[test]
    fn test_truncation_at_chunk_boundary_detected() {
        let plaintext = vec![9u8; 3 * CHUNK];
        let sealed = seal(&key(), &plaintext, CHUNK).unwrap();
        let truncated = &sealed[..2 * (CHUNK + 16)];
        assert!(matches!(
            open(&key(), truncated, CHUNK),
            Err(StegageError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_appended_empty_chunk_rejected() {
        let plaintext = vec![9u8; CHUNK];
        let mut sealed = seal(&key(), &plaintext, CHUNK).unwrap();
        sealed.extend_from_slice(&[0u8; 16]);
        assert!(open(&key(), &sealed, CHUNK).is_err());
    }

    #[test]
    fn test_flipped_bit_detected() {
        let mut sealed = seal(&key(), b"attack at dawn", CHUNK).unwrap();
        sealed[3] ^= 0x01;
        assert!(matches!(
            open(&key(), &sealed, CHUNK),
            Err(StegageError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_wrong_key_detected() {
        let sealed = seal(&key(), b"attack at dawn", CHUNK).unwrap();
        let other = DerivedKey::from_bytes([0xa5; 32]);
        assert!(open(&other, &sealed, CHUNK).is_err());
    }

    #[test]
    fn test_empty_ciphertext_rejected() {
        assert!(open(&key(), &[], CHUNK).is_err());
    }
}
