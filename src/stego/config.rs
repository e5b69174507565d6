// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Encode and decode configuration.
//!
//! Both structs deserialize with serde and reject unknown fields, so a
//! misspelled option fails loudly instead of being ignored. Passwords never
//! appear in `Debug` output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stego::ecc::MAX_PARITY;
use crate::stego::error::{ConfigurationError, StegoError};
use crate::stego::header::Algorithm;
use crate::stego::{validate_dimensions, MAX_BITS_PER_CHANNEL, MIN_BITS_PER_CHANNEL};

/// Bits per channel used when none is given.
pub const DEFAULT_BITS_PER_CHANNEL: u8 = 2;

/// RS parity symbols commonly used for light protection.
pub const DEFAULT_ECC_SYMBOLS: u32 = 10;

fn default_bits_per_channel() -> u8 {
    DEFAULT_BITS_PER_CHANNEL
}

fn default_compress() -> bool {
    true
}

fn check_bits(bits: u8) -> Result<(), StegoError> {
    if !(MIN_BITS_PER_CHANNEL..=MAX_BITS_PER_CHANNEL).contains(&bits) {
        return Err(ConfigurationError::InvalidBitsPerChannel(bits).into());
    }
    Ok(())
}

/// Parameters for embedding a payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbedConfig {
    /// `(width, height)` of the produced image.
    pub image_size: (u32, u32),
    #[serde(default = "default_bits_per_channel")]
    pub bits_per_channel: u8,
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Try zlib; kept only when it shrinks the payload.
    #[serde(default = "default_compress")]
    pub compress: bool,
    #[serde(default)]
    pub password: Option<String>,
    /// Use the smallest bits per channel that fits instead of `bits_per_channel`.
    #[serde(default)]
    pub auto_bits: bool,
    /// Reed-Solomon parity symbols per 255-byte block.
    #[serde(default)]
    pub error_correction_symbols: Option<u32>,
}

impl EmbedConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image_size: (width, height),
            bits_per_channel: DEFAULT_BITS_PER_CHANNEL,
            algorithm: Algorithm::default(),
            compress: true,
            password: None,
            auto_bits: false,
            error_correction_symbols: None,
        }
    }

    pub fn with_bits_per_channel(mut self, bits: u8) -> Self {
        self.bits_per_channel = bits;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_auto_bits(mut self, auto_bits: bool) -> Self {
        self.auto_bits = auto_bits;
        self
    }

    pub fn with_error_correction(mut self, symbols: u32) -> Self {
        self.error_correction_symbols = Some(symbols);
        self
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    /// [`ConfigurationError::InvalidDimensions`],
    /// [`ConfigurationError::InvalidBitsPerChannel`] or
    /// [`ConfigurationError::InvalidEccSymbols`].
    pub fn validate(&self) -> Result<(), StegoError> {
        let (width, height) = self.image_size;
        validate_dimensions(width, height)?;
        check_bits(self.bits_per_channel)?;
        if let Some(n) = self.error_correction_symbols {
            if n == 0 || n as usize > MAX_PARITY {
                return Err(ConfigurationError::InvalidEccSymbols(n).into());
            }
        }
        Ok(())
    }

    /// Parity count as stored in the header. Only meaningful after [`validate`](Self::validate).
    pub(crate) fn ecc_symbols_u8(&self) -> Option<u8> {
        self.error_correction_symbols.and_then(|n| u8::try_from(n).ok())
    }
}

impl fmt::Debug for EmbedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedConfig")
            .field("image_size", &self.image_size)
            .field("bits_per_channel", &self.bits_per_channel)
            .field("algorithm", &self.algorithm)
            .field("compress", &self.compress)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("auto_bits", &self.auto_bits)
            .field("error_correction_symbols", &self.error_correction_symbols)
            .finish()
    }
}

/// Parameters for decoding. Everything is optional: unpinned values are
/// probed, and the password is only needed for encrypted payloads.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecodeConfig {
    #[serde(default)]
    pub bits_per_channel: Option<u8>,
    #[serde(default)]
    pub algorithm: Option<Algorithm>,
    #[serde(default)]
    pub password: Option<String>,
}

impl DecodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bits_per_channel(mut self, bits: u8) -> Self {
        self.bits_per_channel = Some(bits);
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn validate(&self) -> Result<(), StegoError> {
        if let Some(bits) = self.bits_per_channel {
            check_bits(bits)?;
        }
        Ok(())
    }

    /// `(bits_per_channel, algorithm)` pairs to probe, in order: bits
    /// ascending, sequential before permuted.
    pub fn candidates(&self) -> Vec<(u8, Algorithm)> {
        (MIN_BITS_PER_CHANNEL..=MAX_BITS_PER_CHANNEL)
            .filter(|&b| self.bits_per_channel.map_or(true, |pinned| pinned == b))
            .flat_map(|b| {
                Algorithm::ALL
                    .into_iter()
                    .filter(|&a| self.algorithm.map_or(true, |pinned| pinned == a))
                    .map(move |a| (b, a))
            })
            .collect()
    }
}

impl fmt::Debug for DecodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeConfig")
            .field("bits_per_channel", &self.bits_per_channel)
            .field("algorithm", &self.algorithm)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = EmbedConfig::new(100, 80);
        assert_eq!(c.bits_per_channel, 2);
        assert_eq!(c.algorithm, Algorithm::Sequential);
        assert!(c.compress);
        assert!(!c.auto_bits);
        assert!(c.password.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn validate_ranges() {
        assert!(matches!(
            EmbedConfig::new(10, 10).with_bits_per_channel(4).validate(),
            Err(StegoError::Configuration(ConfigurationError::InvalidBitsPerChannel(4)))
        ));
        assert!(EmbedConfig::new(10, 10).with_bits_per_channel(0).validate().is_err());
        assert!(matches!(
            EmbedConfig::new(0, 10).validate(),
            Err(StegoError::Configuration(ConfigurationError::InvalidDimensions { .. }))
        ));
        assert!(matches!(
            EmbedConfig::new(10, 10).with_error_correction(255).validate(),
            Err(StegoError::Configuration(ConfigurationError::InvalidEccSymbols(255)))
        ));
        assert!(EmbedConfig::new(10, 10).with_error_correction(0).validate().is_err());
        assert!(EmbedConfig::new(10, 10).with_error_correction(254).validate().is_ok());
    }

    #[test]
    fn debug_redacts_password() {
        let c = EmbedConfig::new(10, 10).with_password("hunter2");
        let s = format!("{c:?}");
        assert!(!s.contains("hunter2"), "{s}");
        assert!(s.contains("redacted"));
        let d = DecodeConfig::new().with_password("hunter2");
        assert!(!format!("{d:?}").contains("hunter2"));
    }

    #[test]
    fn candidates_order() {
        use Algorithm::*;
        assert_eq!(
            DecodeConfig::new().candidates(),
            vec![(1, Sequential), (1, Permuted), (2, Sequential), (2, Permuted), (3, Sequential), (3, Permuted)]
        );
        assert_eq!(DecodeConfig::new().with_bits_per_channel(2).candidates(), vec![(2, Sequential), (2, Permuted)]);
        assert_eq!(
            DecodeConfig::new().with_algorithm(Permuted).with_bits_per_channel(3).candidates(),
            vec![(3, Permuted)]
        );
        assert!(DecodeConfig::new().with_bits_per_channel(7).candidates().is_empty());
    }

    #[test]
    fn decode_validate() {
        assert!(DecodeConfig::new().validate().is_ok());
        assert!(DecodeConfig::new().with_bits_per_channel(4).validate().is_err());
    }
}
