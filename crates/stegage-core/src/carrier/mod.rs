//! Cover images: decoding, LSB embedding, and PNG output.

pub mod codec;
pub mod registry;

pub use codec::{CarrierCodec, CoverImage, StegoImage, LENGTH_PREFIX_BITS};
pub use registry::{CarrierFormat, FormatRegistry};
