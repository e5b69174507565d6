// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # pixstego-core
//!
//! Pure-Rust engine for hiding arbitrary bytes in the low bits of RGB pixels.
//!
//! - **Sequential** placement writes bits in raster order.
//! - **Permuted** placement scatters them with a fixed-seed ChaCha20 shuffle.
//!   This is obfuscation, not secrecy.
//!
//! Every payload carries a 44-byte header with a SHA-256 digest, so corruption
//! is always detected. Optional transforms: AES-256-CBC encryption (Argon2id
//! key), zlib compression, and Reed-Solomon parity that repairs a bounded
//! number of corrupted bytes. Carriers must be stored losslessly (PNG); any
//! lossy re-encoding destroys the payload.
//!
//! # Quick start
//!
//! ```rust
//! use pixstego_core::{decode, encode, DecodeConfig, EmbedConfig};
//!
//! let config = EmbedConfig::new(50, 50);
//! let (image, meta) = encode(b"Hello, World!", &config).unwrap();
//! assert_eq!(meta.bits_per_channel, 2);
//!
//! let (payload, _) = decode(&image, &DecodeConfig::default()).unwrap();
//! assert_eq!(payload, b"Hello, World!");
//! ```

pub mod stego;

pub use stego::{decode, encode, encode_into, Codec, DecodeMetadata, EncodeMetadata};
pub use stego::{decode_batch, encode_batch, BatchJob};
pub use stego::{choose_image_size, choose_min_bits, compute_capacity, max_capacity, CapacityInfo};
pub use stego::{Algorithm, CarrierImage, DecodeConfig, EmbedConfig, HEADER_SIZE};
pub use stego::{AesCbcCipher, CipherCodec, ErrorCorrectionCodec, ReedSolomon};
pub use stego::{ConfigurationError, IntegrityError, StegoError, UnsupportedAlgorithm};
pub use stego::{validate_dimensions, MAX_BITS_PER_CHANNEL, MAX_DIMENSION, MAX_PIXELS, MIN_BITS_PER_CHANNEL};
