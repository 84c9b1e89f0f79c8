//! # Stegage Core
//!
//! Core library for stegage - passphrase encryption in the age v1 format,
//! hidden in the least-significant bits of a lossless image.
//!
//! This crate provides the cipher engine, the carrier codec and the pipeline
//! composing them, independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **crypto**: scrypt key derivation, age header, chunked payload sealing
//! - **carrier**: cover format registry, LSB embedding, PNG output
//! - **pipeline**: conceal/reveal with magic checks between the stages
//! - **config**: tunables passed explicitly to each component
//! - **fs**: atomic output files
//!
//! ## Example
//!
//! ```no_run
//! use stegage_core::{CoverImage, Passphrase, Pipeline, StegageConfig};
//!
//! # fn main() -> stegage_core::Result<()> {
//! let pipeline = Pipeline::new(StegageConfig::default())?;
//! let cover = pipeline.decode_cover(&std::fs::read("cover.png")?)?;
//! let passphrase = Passphrase::new("p4ss")?;
//!
//! let stego = pipeline.conceal(&passphrase, b"hello", &cover)?;
//! let revealed = pipeline.reveal(&passphrase, &stego.into_cover())?;
//! assert_eq!(revealed, b"hello");
//! # Ok(())
//! # }
//! ```

pub mod carrier;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod pipeline;

pub use carrier::{
    CarrierCodec, CarrierFormat, CoverImage, FormatRegistry, StegoImage, LENGTH_PREFIX_BITS,
};
pub use config::{CarrierConfig, ChannelPolicy, CipherConfig, StegageConfig, MAGIC};
pub use crypto::{CipherEngine, EncryptionSession, Passphrase};
pub use error::{ErrorKind, Result, StegageError};
pub use pipeline::{decode, encode, Pipeline};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
