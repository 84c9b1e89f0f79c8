//! Tunable parameters for the cipher engine and the carrier codec.
//!
//! Nothing in the pipeline reads module-level tunables; every value flows in
//! through these structs so each component can be exercised on its own.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StegageError};

/// First 14 bytes of every ciphertext blob.
pub const MAGIC: &[u8; 14] = b"age-encryption";

/// Default scrypt work factor (log2 N). N = 2^18, r = 8, p = 1.
pub const DEFAULT_WORK_FACTOR: u8 = 18;

/// Highest work factor accepted when decrypting.
pub const DEFAULT_MAX_WORK_FACTOR: u8 = 22;

/// Plaintext bytes per STREAM chunk. The blob does not record it, and age
/// readers only accept this size.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Top-level configuration shared by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StegageConfig {
    pub cipher: CipherConfig,
    pub carrier: CarrierConfig,
}

impl StegageConfig {
    /// Check all values are in range.
    pub fn validate(&self) -> Result<()> {
        self.cipher.validate()
    }
}

/// Parameters for [`crate::crypto::CipherEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherConfig {
    /// scrypt log2 N used when encrypting
    pub work_factor: u8,
    /// Largest log2 N a blob may demand when decrypting
    pub max_work_factor: u8,
    /// Plaintext bytes per authenticated chunk; must be [`DEFAULT_CHUNK_SIZE`]
    pub chunk_size: usize,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            work_factor: DEFAULT_WORK_FACTOR,
            max_work_factor: DEFAULT_MAX_WORK_FACTOR,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl CipherConfig {
    /// Config with the given encryption work factor and default limits.
    pub fn with_work_factor(work_factor: u8) -> Self {
        Self {
            work_factor,
            ..Self::default()
        }
    }

    /// Check all values are in range.
    pub fn validate(&self) -> Result<()> {
        if self.work_factor == 0 || self.work_factor >= 64 {
            return Err(StegageError::InvalidConfig(format!(
                "work factor must be between 1 and 63 (got {})",
                self.work_factor
            )));
        }
        if self.max_work_factor < self.work_factor {
            return Err(StegageError::InvalidConfig(format!(
                "max work factor {} is below work factor {}",
                self.max_work_factor, self.work_factor
            )));
        }
        if self.chunk_size != DEFAULT_CHUNK_SIZE {
            return Err(StegageError::InvalidConfig(format!(
                "chunk size must be {} (got {})",
                DEFAULT_CHUNK_SIZE, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Which pixel channels carry payload bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelPolicy {
    /// Red, green and blue; alpha is never modified
    #[default]
    Rgb,
    /// All four channels
    Rgba,
}

impl ChannelPolicy {
    /// Number of channels per pixel that carry one bit each.
    pub fn usable_channels(self) -> usize {
        match self {
            ChannelPolicy::Rgb => 3,
            ChannelPolicy::Rgba => 4,
        }
    }
}

/// Parameters for [`crate::carrier::CarrierCodec`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierConfig {
    pub channels: ChannelPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = StegageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cipher.work_factor, 18);
        assert_eq!(config.cipher.chunk_size, 65536);
        assert_eq!(config.carrier.channels, ChannelPolicy::Rgb);
        assert_eq!(MAGIC, b"age-encryption");
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = CipherConfig {
            chunk_size: 0,
            ..CipherConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk size"));
    }

    #[test]
    fn test_non_age_chunk_size_rejected() {
        for chunk_size in [256, 4096, DEFAULT_CHUNK_SIZE + 1] {
            let config = CipherConfig {
                chunk_size,
                ..CipherConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(StegageError::InvalidConfig(_))),
                "chunk size {}",
                chunk_size
            );
        }
    }

    #[test]
    fn test_max_below_work_factor_rejected() {
        let config = CipherConfig {
            work_factor: 20,
            max_work_factor: 16,
            ..CipherConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: StegageConfig = toml::from_str("[cipher]\nwork_factor = 15\n").unwrap();
        assert_eq!(config.cipher.work_factor, 15);
        assert_eq!(config.cipher.max_work_factor, DEFAULT_MAX_WORK_FACTOR);
        assert_eq!(config.carrier.channels, ChannelPolicy::Rgb);
    }

    #[test]
    fn test_channel_policy_from_toml() {
        let config: StegageConfig = toml::from_str("[carrier]\nchannels = \"rgba\"\n").unwrap();
        assert_eq!(config.carrier.channels.usable_channels(), 4);
    }
}
