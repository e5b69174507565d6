// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the steganography pipeline.
//!
//! [`StegoError`] has four kinds: capacity, integrity, unsupported algorithm
//! and configuration. Each kind carries a detail enum whose messages include
//! the concrete numbers involved (lengths, capacities, dimensions), so a
//! caller can surface them verbatim.

use core::fmt;

use crate::stego::header::Algorithm;

/// Errors that can occur during steganographic encoding or decoding.
#[derive(Debug)]
pub enum StegoError {
    /// The payload plus overhead does not fit the image at the requested
    /// bits per channel.
    InsufficientCapacity {
        /// Transformed payload bytes, before ECC parity.
        needed: usize,
        /// Bytes available after the header and the parity `needed` would add.
        capacity: usize,
        width: u32,
        height: u32,
        bits_per_channel: u8,
    },
    /// Header or payload could not be trusted.
    Integrity(IntegrityError),
    /// The embedded header names an algorithm or version this build does not know.
    UnsupportedAlgorithm(UnsupportedAlgorithm),
    /// Invalid construction-time parameters.
    Configuration(ConfigurationError),
}

/// Detail for [`StegoError::Integrity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// Fewer than `HEADER_SIZE` bytes were supplied to the header decoder.
    IncompleteHeader { available: usize, needed: usize },
    /// Header fields are structurally invalid (unknown flag bits etc).
    MalformedHeader(&'static str),
    /// The carrier holds fewer embeddable bits than requested.
    Truncated { needed_bits: usize, available_bits: usize },
    /// SHA-256 of the extracted payload differs from the header digest.
    ChecksumMismatch { expected: [u8; 32], actual: [u8; 32] },
    /// A Reed-Solomon block had more symbol errors than the parity can fix.
    Uncorrectable { block: usize },
    /// The zlib stream is invalid or expands past the size limit.
    Decompression(String),
    /// AES-CBC unpadding failed (wrong password or corrupted ciphertext).
    DecryptionFailed,
    /// The carrier bytes could not be decoded or encoded as an image.
    ImageCodec(String),
}

/// Detail for [`StegoError::UnsupportedAlgorithm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedAlgorithm {
    UnknownMagic([u8; 4]),
    UnknownVersion(u8),
    /// Magic and algorithm id name different algorithms.
    AlgorithmMismatch { magic: [u8; 4], id: u8 },
}

/// Detail for [`StegoError::Configuration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    InvalidBitsPerChannel(u8),
    InvalidBitRange { min: u8, max: u8 },
    InvalidDimensions { width: u32, height: u32 },
    /// Carrier dimensions differ from `EmbedConfig::image_size`.
    ImageSizeMismatch { expected: (u32, u32), actual: (u32, u32) },
    /// Raw pixel buffer length does not equal `width * height * 3`.
    BufferLength { expected: usize, actual: usize },
    InvalidEccSymbols(u32),
    /// A password was supplied (or the image is encrypted) but the codec has no cipher.
    CipherUnavailable,
    /// ECC was requested (or the image carries parity) but the codec has no ECC backend.
    EccUnavailable,
    /// The image is encrypted and no password was supplied.
    PasswordRequired,
    KeyDerivation(String),
    /// The reused carrier holds an older header that the decoder would find
    /// first, and every bit of its magic is taken by the new payload.
    StaleHeader { bits_per_channel: u8, algorithm: Algorithm },
}

impl fmt::Display for StegoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientCapacity { needed, capacity, width, height, bits_per_channel } => write!(
                f,
                "insufficient capacity: payload {needed} B exceeds capacity {capacity} B \
                 for image {width}x{height} at {bits_per_channel} bits/channel"
            ),
            Self::Integrity(e) => write!(f, "integrity error: {e}"),
            Self::UnsupportedAlgorithm(e) => write!(f, "unsupported algorithm: {e}"),
            Self::Configuration(e) => write!(f, "configuration error: {e}"),
        }
    }
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompleteHeader { available, needed } => {
                write!(f, "incomplete header ({available} of {needed} bytes)")
            }
            Self::MalformedHeader(what) => write!(f, "malformed header: {what}"),
            Self::Truncated { needed_bits, available_bits } => write!(
                f,
                "image holds {available_bits} embeddable bits, {needed_bits} required"
            ),
            Self::ChecksumMismatch { expected, actual } => write!(
                f,
                "SHA-256 mismatch; data corrupted or wrong bits_per_channel used \
                 (expected {}, got {})",
                hex::encode(expected),
                hex::encode(actual)
            ),
            Self::Uncorrectable { block } => {
                write!(f, "Reed-Solomon block {block} has too many errors to correct")
            }
            Self::Decompression(msg) => write!(f, "decompression failed: {msg}"),
            Self::DecryptionFailed => write!(f, "decryption failed (wrong password?)"),
            Self::ImageCodec(msg) => write!(f, "image codec error: {msg}"),
        }
    }
}

impl fmt::Display for UnsupportedAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMagic(magic) => write!(
                f,
                "unknown magic bytes {:?} (expected one of \"STLB\", \"STLR\")",
                String::from_utf8_lossy(magic)
            ),
            Self::UnknownVersion(v) => write!(f, "unknown format version {v}"),
            Self::AlgorithmMismatch { magic, id } => write!(
                f,
                "magic {:?} disagrees with algorithm id {id}",
                String::from_utf8_lossy(magic)
            ),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBitsPerChannel(b) => {
                write!(f, "bits_per_channel must be 1..=3, got {b}")
            }
            Self::InvalidBitRange { min, max } => {
                write!(f, "invalid bits_per_channel search range {min}..={max}")
            }
            Self::InvalidDimensions { width, height } => write!(
                f,
                "invalid image dimensions {width}x{height} (each side 1..=8192, at most 16M pixels)"
            ),
            Self::ImageSizeMismatch { expected, actual } => write!(
                f,
                "carrier is {}x{} but configuration expects {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            Self::BufferLength { expected, actual } => {
                write!(f, "pixel buffer has {actual} bytes, expected {expected}")
            }
            Self::InvalidEccSymbols(n) => {
                write!(f, "error_correction_symbols must be 1..=254, got {n}")
            }
            Self::CipherUnavailable => write!(f, "no cipher backend available"),
            Self::EccUnavailable => write!(f, "no error-correction backend available"),
            Self::PasswordRequired => write!(f, "image is encrypted; a password is required"),
            Self::KeyDerivation(msg) => write!(f, "key derivation failed: {msg}"),
            Self::StaleHeader { bits_per_channel, algorithm } => write!(
                f,
                "carrier already holds a {algorithm:?} header at {bits_per_channel} bits/channel \
                 that cannot be cleared"
            ),
        }
    }
}

impl std::error::Error for StegoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Integrity(e) => Some(e),
            Self::UnsupportedAlgorithm(e) => Some(e),
            Self::Configuration(e) => Some(e),
            Self::InsufficientCapacity { .. } => None,
        }
    }
}

impl std::error::Error for IntegrityError {}
impl std::error::Error for UnsupportedAlgorithm {}
impl std::error::Error for ConfigurationError {}

impl From<IntegrityError> for StegoError {
    fn from(e: IntegrityError) -> Self {
        Self::Integrity(e)
    }
}

impl From<UnsupportedAlgorithm> for StegoError {
    fn from(e: UnsupportedAlgorithm) -> Self {
        Self::UnsupportedAlgorithm(e)
    }
}

impl From<ConfigurationError> for StegoError {
    fn from(e: ConfigurationError) -> Self {
        Self::Configuration(e)
    }
}
