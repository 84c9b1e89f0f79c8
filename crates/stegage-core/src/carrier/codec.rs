//! Least-significant-bit embedding.
//!
//! A payload is written as a 32-bit big-endian length followed by the
//! payload bytes, most significant bit first. Bits go into the low bit of
//! each usable channel, walking pixels in raster order and channels in
//! R, G, B (then A) order. Channels past the end of the payload are left
//! untouched.

use image::buffer::ConvertBuffer;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use tracing::debug;

use crate::config::{CarrierConfig, ChannelPolicy};
use crate::error::{Result, StegageError};

/// Bits used by the length prefix.
pub const LENGTH_PREFIX_BITS: u64 = 32;

const BYTES_PER_PIXEL: usize = 4;

/// A decoded image, normalized to 8-bit RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pixels: RgbaImage,
    has_alpha: bool,
}

impl CoverImage {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            has_alpha: true,
        }
    }

    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self {
            pixels: pixels.convert(),
            has_alpha: false,
        }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        let has_alpha = image.color().has_alpha();
        Self {
            pixels: image.into_rgba8(),
            has_alpha,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    fn pixel_count(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }
}

/// An image carrying an embedded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StegoImage {
    pixels: RgbaImage,
    has_alpha: bool,
}

impl StegoImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Encode as PNG. Written as RGB when neither the cover nor the
    /// embedding used alpha.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let encoder = PngEncoder::new(&mut out);
        let (width, height) = (self.width(), self.height());
        let written = if self.has_alpha {
            encoder.write_image(self.pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
        } else {
            let rgb: RgbImage = self.pixels.convert();
            encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        };
        written.map_err(|e| StegageError::OutputEncodingFailed(e.to_string()))?;
        Ok(out)
    }

    /// View the result as a cover, e.g. to extract from it again.
    pub fn into_cover(self) -> CoverImage {
        CoverImage {
            pixels: self.pixels,
            has_alpha: self.has_alpha,
        }
    }
}

/// Embeds and extracts length-prefixed payloads.
#[derive(Debug, Clone, Default)]
pub struct CarrierCodec {
    config: CarrierConfig,
}

impl CarrierCodec {
    pub fn new(config: CarrierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CarrierConfig {
        &self.config
    }

    /// Total embeddable bits, including the length prefix.
    pub fn capacity_bits(&self, image: &CoverImage) -> u64 {
        image.pixel_count() * self.config.channels.usable_channels() as u64
    }

    /// Largest payload in bytes that fits after the length prefix.
    pub fn payload_capacity(&self, image: &CoverImage) -> u64 {
        self.capacity_bits(image).saturating_sub(LENGTH_PREFIX_BITS) / 8
    }

    /// Byte offsets of usable channels in raster order.
    fn slots(&self, image: &CoverImage) -> impl Iterator<Item = usize> {
        let channels = self.config.channels.usable_channels();
        let pixels = image.pixel_count() as usize;
        (0..pixels).flat_map(move |p| (0..channels).map(move |c| p * BYTES_PER_PIXEL + c))
    }

    /// Write `payload` into a copy of `cover`.
    pub fn embed(&self, cover: &CoverImage, payload: &[u8]) -> Result<StegoImage> {
        let capacity = self.capacity_bits(cover);
        let needed = LENGTH_PREFIX_BITS + 8 * payload.len() as u64;
        if needed > capacity {
            return Err(StegageError::InsufficientCapacity { needed, capacity });
        }
        let declared = u32::try_from(payload.len())
            .map_err(|_| StegageError::InsufficientCapacity { needed, capacity })?;

        let mut pixels = cover.pixels.clone();
        let raw: &mut [u8] = &mut pixels;
        let bits = declared
            .to_be_bytes()
            .into_iter()
            .chain(payload.iter().copied())
            .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1));

        for (slot, bit) in self.slots(cover).zip(bits) {
            raw[slot] = (raw[slot] & 0xfe) | bit;
        }

        debug!(
            payload_len = payload.len(),
            bits_used = needed,
            capacity_bits = capacity,
            "embedded payload"
        );

        // Bits written to alpha only survive if the output keeps alpha.
        let has_alpha = cover.has_alpha || self.config.channels == ChannelPolicy::Rgba;
        Ok(StegoImage { pixels, has_alpha })
    }

    /// Read the length-prefixed payload back out of `image`.
    pub fn extract(&self, image: &CoverImage) -> Result<Vec<u8>> {
        let capacity = self.capacity_bits(image);
        if capacity < LENGTH_PREFIX_BITS {
            return Err(StegageError::DeclaredLengthExceedsCapacity {
                declared: LENGTH_PREFIX_BITS,
                capacity,
            });
        }

        let raw = image.pixels.as_raw();
        let mut bits = self.slots(image).map(|slot| raw[slot] & 1);

        let declared = (0..4).fold(0u32, |acc, _| (acc << 8) | u32::from(read_byte(&mut bits)));
        let declared_bits = 8 * u64::from(declared);
        let available = capacity - LENGTH_PREFIX_BITS;
        if declared_bits > available {
            return Err(StegageError::DeclaredLengthExceedsCapacity {
                declared: declared_bits,
                capacity: available,
            });
        }

        let payload: Vec<u8> = (0..declared).map(|_| read_byte(&mut bits)).collect();
        debug!(payload_len = payload.len(), "extracted payload");
        Ok(payload)
    }
}

fn read_byte(bits: &mut impl Iterator<Item = u8>) -> u8 {
    bits.take(8).fold(0, |acc, bit| (acc << 1) | bit)
}
