//! Supported cover image formats.
//!
//! Decoders are looked up by the format detected from the input's byte
//! signature. Adding a format is a matter of registering another entry.

use image::ImageFormat;
use tracing::debug;

use crate::carrier::codec::CoverImage;
use crate::error::{Result, StegageError};

/// A decodable cover format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierFormat {
    pub format: ImageFormat,
    pub name: &'static str,
    /// Whether pixel values survive a save/load cycle unchanged
    pub lossless: bool,
}

impl CarrierFormat {
    pub const PNG: CarrierFormat = CarrierFormat {
        format: ImageFormat::Png,
        name: "png",
        lossless: true,
    };

    pub const BMP: CarrierFormat = CarrierFormat {
        format: ImageFormat::Bmp,
        name: "bmp",
        lossless: true,
    };

    pub const JPEG: CarrierFormat = CarrierFormat {
        format: ImageFormat::Jpeg,
        name: "jpeg",
        lossless: false,
    };
}

/// Format registry keyed by [`ImageFormat`].
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: Vec<CarrierFormat>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(CarrierFormat::PNG);
        registry.register(CarrierFormat::BMP);
        registry.register(CarrierFormat::JPEG);
        registry
    }
}

impl FormatRegistry {
    /// Registry with no formats.
    pub fn empty() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    /// Add a format, replacing any entry for the same [`ImageFormat`].
    pub fn register(&mut self, entry: CarrierFormat) {
        self.formats.retain(|f| f.format != entry.format);
        self.formats.push(entry);
    }

    pub fn get(&self, format: ImageFormat) -> Option<&CarrierFormat> {
        self.formats.iter().find(|f| f.format == format)
    }

    pub fn formats(&self) -> impl Iterator<Item = &CarrierFormat> {
        self.formats.iter()
    }

    /// Identify the format of `bytes` from its signature.
    pub fn detect(&self, bytes: &[u8]) -> Result<&CarrierFormat> {
        let format = image::guess_format(bytes).map_err(|_| {
            StegageError::UnsupportedCoverFormat("unrecognized image signature".to_string())
        })?;
        self.get(format).ok_or_else(|| {
            StegageError::UnsupportedCoverFormat(format!(
                "{} images are not supported",
                format.extensions_str().first().copied().unwrap_or("these")
            ))
        })
    }

    /// Decode `bytes` into a pixel grid.
    pub fn decode(&self, bytes: &[u8]) -> Result<CoverImage> {
        let entry = self.detect(bytes)?;
        let image = image::load_from_memory_with_format(bytes, entry.format).map_err(|e| {
            StegageError::UnsupportedCoverFormat(format!("could not decode {}: {}", entry.name, e))
        })?;
        debug!(
            format = entry.name,
            lossless = entry.lossless,
            width = image.width(),
            height = image.height(),
            "decoded image"
        );
        Ok(CoverImage::from_dynamic(image))
    }
}
