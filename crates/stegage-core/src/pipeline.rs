//! Conceal and reveal: encryption composed with LSB embedding.
//!
//! The magic constant is checked at both boundaries. On conceal a blob that
//! does not start with it means the engine broke its contract; on reveal it
//! means the image holds nothing we put there, and key derivation is skipped.

use std::io::{Read, Write};

use tracing::debug;

use crate::carrier::{CarrierCodec, CoverImage, FormatRegistry, StegoImage, LENGTH_PREFIX_BITS};
use crate::config::{StegageConfig, MAGIC};
use crate::crypto::{CipherEngine, EncryptionSession, Passphrase};
use crate::error::{Result, StegageError};

/// One cipher engine, one carrier codec and the cover format registry.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: StegageConfig,
    engine: CipherEngine,
    codec: CarrierCodec,
    registry: FormatRegistry,
}

impl Pipeline {
    pub fn new(config: StegageConfig) -> Result<Self> {
        let engine = CipherEngine::new(config.cipher.clone())?;
        let codec = CarrierCodec::new(config.carrier.clone());
        Ok(Self {
            config,
            engine,
            codec,
            registry: FormatRegistry::default(),
        })
    }

    /// Replace the cover format registry.
    pub fn with_registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &StegageConfig {
        &self.config
    }

    pub fn engine(&self) -> &CipherEngine {
        &self.engine
    }

    pub fn codec(&self) -> &CarrierCodec {
        &self.codec
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Decode cover image bytes with the registry.
    pub fn decode_cover(&self, bytes: &[u8]) -> Result<CoverImage> {
        self.registry.decode(bytes)
    }

    /// Largest plaintext that `cover` can hold, or `None` if it cannot hold
    /// even an empty one.
    pub fn max_plaintext_len(&self, cover: &CoverImage) -> Option<usize> {
        let available = usize::try_from(self.codec.payload_capacity(cover)).ok()?;
        self.engine.max_plaintext_len(available)
    }

    /// Fail with [`StegageError::InsufficientCapacity`] unless a plaintext of
    /// `plaintext_len` bytes fits in `cover` once encrypted.
    pub fn check_capacity(&self, plaintext_len: usize, cover: &CoverImage) -> Result<()> {
        let capacity = self.codec.capacity_bits(cover);
        let needed = LENGTH_PREFIX_BITS
            .saturating_add((self.engine.sealed_len(plaintext_len) as u64).saturating_mul(8));
        if needed > capacity {
            return Err(StegageError::InsufficientCapacity { needed, capacity });
        }
        Ok(())
    }

    /// Encrypt `plaintext` and hide it in `cover`.
    pub fn conceal(
        &self,
        passphrase: &Passphrase,
        plaintext: &[u8],
        cover: &CoverImage,
    ) -> Result<StegoImage> {
        self.conceal_with_session(passphrase, plaintext, cover, &EncryptionSession::generate()?)
    }

    /// [`Pipeline::conceal`] with explicit salt, nonce and file key.
    pub fn conceal_with_session(
        &self,
        passphrase: &Passphrase,
        plaintext: &[u8],
        cover: &CoverImage,
        session: &EncryptionSession,
    ) -> Result<StegoImage> {
        // Fail on capacity before paying for key derivation.
        self.check_capacity(plaintext.len(), cover)?;

        let blob = self
            .engine
            .encrypt_with_session(passphrase, plaintext, session)?;
        if !blob.starts_with(MAGIC) {
            return Err(StegageError::InternalInconsistency(
                "cipher output is missing the magic header".to_string(),
            ));
        }

        let stego = self.codec.embed(cover, &blob)?;
        debug!(
            blob_len = blob.len(),
            width = stego.width(),
            height = stego.height(),
            "concealed payload"
        );
        Ok(stego)
    }

    /// Recover the plaintext hidden in `image`.
    pub fn reveal(&self, passphrase: &Passphrase, image: &CoverImage) -> Result<Vec<u8>> {
        let blob = self.extract_blob(image)?;
        self.engine.decrypt(passphrase, &blob)
    }

    /// Extract the hidden blob and check its magic, without decrypting.
    pub fn extract_blob(&self, image: &CoverImage) -> Result<Vec<u8>> {
        let candidate = self.codec.extract(image)?;
        if !candidate.starts_with(MAGIC) {
            debug!(candidate_len = candidate.len(), "magic header missing");
            return Err(StegageError::NoConcealedPayload);
        }
        Ok(candidate)
    }

    /// Stream form of [`Pipeline::conceal`]. The stego image is written to
    /// `output` as PNG only once everything has succeeded.
    pub fn encode<P, D, C, W>(
        &self,
        passphrase: P,
        plaintext: D,
        cover: C,
        mut output: W,
    ) -> Result<()>
    where
        P: Read,
        D: Read,
        C: Read,
        W: Write,
    {
        let passphrase = Passphrase::from_reader(passphrase)?;
        let plaintext = read_all(plaintext)?;
        let cover = self.decode_cover(&read_all(cover)?)?;

        let png = self.conceal(&passphrase, &plaintext, &cover)?.encode_png()?;
        output.write_all(&png)?;
        output.flush()?;
        Ok(())
    }

    /// Stream form of [`Pipeline::reveal`]. The plaintext is written to
    /// `output` only once it has been fully authenticated.
    pub fn decode<P, I, W>(&self, passphrase: P, image: I, mut output: W) -> Result<()>
    where
        P: Read,
        I: Read,
        W: Write,
    {
        let passphrase = Passphrase::from_reader(passphrase)?;
        let image = self.decode_cover(&read_all(image)?)?;

        let plaintext = self.reveal(&passphrase, &image)?;
        output.write_all(&plaintext)?;
        output.flush()?;
        Ok(())
    }
}

fn read_all<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// [`Pipeline::encode`] with the default configuration.
pub fn encode<P, D, C, W>(passphrase: P, plaintext: D, cover: C, output: W) -> Result<()>
where
    P: Read,
    D: Read,
    C: Read,
    W: Write,
{
    Pipeline::new(StegageConfig::default())?.encode(passphrase, plaintext, cover, output)
}

/// [`Pipeline::decode`] with the default configuration.
pub fn decode<P, I, W>(passphrase: P, image: I, output: W) -> Result<()>
where
    P: Read,
    I: Read,
    W: Write,
{
    Pipeline::new(StegageConfig::default())?.decode(passphrase, image, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CipherConfig;
    use crate::error::ErrorKind;
    use image::{Rgba, RgbaImage};

    fn pipeline() -> Pipeline {
        Pipeline::new(StegageConfig {
            cipher: CipherConfig::with_work_factor(10),
            ..StegageConfig::default()
        })
        .unwrap()
    }

    fn cover(width: u32, height: u32) -> CoverImage {
        CoverImage::from_rgba(RgbaImage::from_pixel(width, height, Rgba([90, 120, 150, 255])))
    }

    #[test]
    fn test_conceal_reveal() {
        let pipeline = pipeline();
        let pass = Passphrase::new("p4ss").unwrap();
        let stego = pipeline.conceal(&pass, b"secret", &cover(64, 64)).unwrap();
        assert_eq!(pipeline.reveal(&pass, &stego.into_cover()).unwrap(), b"secret");
    }

    #[test]
    fn test_untouched_cover_has_no_payload() {
        let pipeline = pipeline();
        let pass = Passphrase::new("p4ss").unwrap();
        // Uniform even channels decode to a zero-length payload.
        let image = CoverImage::from_rgba(RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 255])));
        let err = pipeline.reveal(&pass, &image).unwrap_err();
        assert!(matches!(err, StegageError::NoConcealedPayload));
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn test_extract_blob_returns_ciphertext() {
        let pipeline = pipeline();
        let pass = Passphrase::new("p4ss").unwrap();
        let stego = pipeline.conceal(&pass, b"abc", &cover(32, 32)).unwrap();
        let blob = pipeline.extract_blob(&stego.into_cover()).unwrap();
        assert!(blob.starts_with(crate::config::MAGIC));
        assert_eq!(blob.len(), pipeline.engine().sealed_len(3));
        assert_eq!(pipeline.engine().decrypt(&pass, &blob).unwrap(), b"abc");
    }

    #[test]
    fn test_capacity_checked_before_encryption() {
        let pipeline = pipeline();
        let pass = Passphrase::new("p4ss").unwrap();
        let err = pipeline.conceal(&pass, &[0u8; 64], &cover(4, 4)).unwrap_err();
        assert!(matches!(err, StegageError::InsufficientCapacity { capacity: 48, .. }));
    }

    #[test]
    fn test_max_plaintext_len_is_tight() {
        let pipeline = pipeline();
        let pass = Passphrase::new("p4ss").unwrap();
        let image = cover(32, 32);
        let max = pipeline.max_plaintext_len(&image).unwrap();

        assert!(pipeline.conceal(&pass, &vec![1u8; max], &image).is_ok());
        assert!(matches!(
            pipeline.conceal(&pass, &vec![1u8; max + 1], &image),
            Err(StegageError::InsufficientCapacity { .. })
        ));
        assert_eq!(pipeline.max_plaintext_len(&cover(4, 4)), None);
    }

    #[test]
    fn test_stream_round_trip() {
        let pipeline = pipeline();
        let mut cover_png = Vec::new();
        image::DynamicImage::ImageRgba8(cover(48, 48).pixels().clone())
            .write_to(&mut std::io::Cursor::new(&mut cover_png), image::ImageFormat::Png)
            .unwrap();

        let mut png = Vec::new();

        pipeline
            .encode(&b"p4ss"[..], &b"streamed"[..], &cover_png[..], &mut png)
            .unwrap();

        let mut plaintext = Vec::new();
        pipeline.decode(&b"p4ss"[..], &png[..], &mut plaintext).unwrap();
        assert_eq!(plaintext, b"streamed");
    }

    #[test]
    fn test_failed_decode_writes_nothing() {
        let pipeline = pipeline();
        let pass = Passphrase::new("p4ss").unwrap();
        let png = pipeline
            .conceal(&pass, b"data", &cover(48, 48))
            .unwrap()
            .encode_png()
            .unwrap();

        let mut output = Vec::new();
        let err = pipeline.decode(&b"wrong"[..], &png[..], &mut output).unwrap_err();
        assert!(matches!(err, StegageError::AuthenticationFailed));
        assert!(output.is_empty());
    }

    #[test]
    fn test_empty_passphrase_stream_rejected() {
        let pipeline = pipeline();
        let mut output = Vec::new();
        let err = pipeline
            .encode(&b""[..], &b"data"[..], &b""[..], &mut output)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(output.is_empty());
    }

    #[test]
    fn test_passphrase_stream_is_not_trimmed() {
        let pipeline = pipeline();
        let png = pipeline
            .conceal(&Passphrase::new("p4ss\n").unwrap(), b"data", &cover(48, 48))
            .unwrap()
            .encode_png()
            .unwrap();

        let mut output = Vec::new();
        assert!(pipeline.decode(&b"p4ss"[..], &png[..], &mut output).is_err());
        pipeline.decode(&b"p4ss\n"[..], &png[..], &mut output).unwrap();
        assert_eq!(output, b"data");
    }
}
