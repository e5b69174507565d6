// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Pixel low-bit steganography.
//!
//! A payload is transformed (optional encryption, compression, Reed-Solomon
//! parity), prefixed with a 44-byte header carrying a SHA-256 digest, and
//! written into the low 1-3 bits of each RGB channel. Two placement
//! strategies exist: **sequential** (raster order) and **permuted** (a fixed
//! pseudo-random pixel order). Decoding recovers the strategy and bit depth
//! by probing for a valid header.

pub mod error;
pub mod bits;
pub mod header;
pub mod capacity;
pub mod permute;
pub mod carrier;
pub mod embed;
pub mod crypto;
pub mod compress;
pub mod ecc;
pub mod payload;
pub mod config;
pub mod batch;
mod pipeline;

pub use error::{ConfigurationError, IntegrityError, StegoError, UnsupportedAlgorithm};
pub use header::{Algorithm, Header, HeaderFlags, HEADER_SIZE};
pub use carrier::CarrierImage;
pub use config::{DecodeConfig, EmbedConfig};
pub use capacity::{choose_image_size, choose_min_bits, compute_capacity, max_capacity, CapacityInfo};
pub use crypto::{AesCbcCipher, CipherCodec};
pub use ecc::{ErrorCorrectionCodec, ReedSolomon};
pub use pipeline::{decode, encode, encode_into, Codec, DecodeMetadata, EncodeMetadata};
pub use batch::{decode_batch, encode_batch, BatchJob};

/// Maximum pixel dimension (width or height).
pub const MAX_DIMENSION: u32 = 8192;

/// Maximum total pixel count (width × height).
pub const MAX_PIXELS: u32 = 16_000_000;

/// Smallest supported bits per channel.
pub const MIN_BITS_PER_CHANNEL: u8 = 1;

/// Largest supported bits per channel.
pub const MAX_BITS_PER_CHANNEL: u8 = 3;

/// Validate carrier dimensions.
///
/// # Errors
/// [`ConfigurationError::InvalidDimensions`] if either side is 0 or exceeds
/// [`MAX_DIMENSION`], or the pixel count exceeds [`MAX_PIXELS`].
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), StegoError> {
    if width == 0
        || height == 0
        || width > MAX_DIMENSION
        || height > MAX_DIMENSION
        || width.checked_mul(height).map_or(true, |p| p > MAX_PIXELS)
    {
        return Err(ConfigurationError::InvalidDimensions { width, height }.into());
    }
    Ok(())
}
