//! Blobs are plain age v1 passphrase files in both directions.

use std::io::{Read, Write};
use std::iter;

use age::secrecy::SecretString;
use stegage_core::{CipherConfig, CipherEngine, Passphrase, StegageError};

fn engine() -> CipherEngine {
    CipherEngine::new(CipherConfig {
        // age calibrates its work factor to the machine.
        max_work_factor: 30,
        ..CipherConfig::with_work_factor(10)
    })
    .expect("engine should build")
}

fn age_encrypt(plaintext: &[u8], passphrase: &str) -> Vec<u8> {
    let encryptor = age::Encryptor::with_user_passphrase(SecretString::from(passphrase.to_string()));
    let mut encrypted = Vec::new();
    let mut writer = encryptor
        .wrap_output(&mut encrypted)
        .expect("age writer should open");
    writer.write_all(plaintext).expect("age write should succeed");
    writer.finish().expect("age finish should succeed");
    encrypted
}

fn age_decrypt(blob: &[u8], passphrase: &str) -> Result<Vec<u8>, age::DecryptError> {
    let decryptor = age::Decryptor::new(blob)?;
    let identity = age::scrypt::Identity::new(SecretString::from(passphrase.to_string()));
    let mut reader = decryptor.decrypt(iter::once(&identity as &dyn age::Identity))?;
    let mut decrypted = Vec::new();
    reader.read_to_end(&mut decrypted)?;
    Ok(decrypted)
}

#[test]
fn test_age_reads_our_blobs() {
    let pass = Passphrase::new("interop-pass").expect("passphrase should be valid");

    let large = vec![0xc3; 70_000];
    let cases: [&[u8]; 3] = [b"", b"hello-test", &large];

    for plaintext in cases {
        let blob = engine()
            .encrypt(&pass, plaintext)
            .expect("encryption should succeed");
        let decrypted = age_decrypt(&blob, "interop-pass").expect("age should decrypt");
        assert_eq!(decrypted, plaintext);
    }
}

#[test]
fn test_age_rejects_our_blob_with_wrong_passphrase() {
    let pass = Passphrase::new("interop-pass").expect("passphrase should be valid");
    let blob = engine()
        .encrypt(&pass, b"secret")
        .expect("encryption should succeed");
    assert!(age_decrypt(&blob, "other-pass").is_err());
}

#[test]
fn test_we_read_age_blobs() {
    let encrypted = age_encrypt(b"written by age", "interop-pass");
    let pass = Passphrase::new("interop-pass").expect("passphrase should be valid");
    let decrypted = engine()
        .decrypt(&pass, &encrypted)
        .expect("decryption should succeed");
    assert_eq!(decrypted, b"written by age");

    let wrong = Passphrase::new("other-pass").expect("passphrase should be valid");
    assert!(matches!(
        engine().decrypt(&wrong, &encrypted),
        Err(StegageError::AuthenticationFailed)
    ));
}

#[test]
fn test_we_read_multi_chunk_age_blobs() {
    let plaintext: Vec<u8> = (0..=255u8).cycle().take(3 * 64 * 1024 + 5).collect();
    let encrypted = age_encrypt(&plaintext, "interop-pass");
    let pass = Passphrase::new("interop-pass").expect("passphrase should be valid");
    assert_eq!(
        engine()
            .decrypt(&pass, &encrypted)
            .expect("decryption should succeed"),
        plaintext
    );
}

#[test]
fn test_age_work_factor_limit_enforced() {
    let encrypted = age_encrypt(b"slow", "interop-pass");
    let strict = CipherEngine::new(CipherConfig {
        max_work_factor: 1,
        ..CipherConfig::with_work_factor(1)
    })
    .expect("engine should build");
    let pass = Passphrase::new("interop-pass").expect("passphrase should be valid");
    assert!(matches!(
        strict.decrypt(&pass, &encrypted),
        Err(StegageError::KeyDerivationFailed(_))
    ));
}
