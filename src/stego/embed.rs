// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Low-bit embedding and extraction.
//!
//! Bit `i` of the stream lands in
//!
//! ```text
//! pixel   = i / (3 * bpc)      (index into the pixel order)
//! channel = (i / bpc) % 3
//! bit     = i % bpc
//! ```
//!
//! so each pixel absorbs `3 * bpc` consecutive bits: `bpc` bits of R, then G,
//! then B, lowest bit first within each channel. Only bit positions below
//! `bpc` are ever touched.

use crate::stego::carrier::{CarrierImage, CHANNELS};
use crate::stego::error::{ConfigurationError, IntegrityError, StegoError};
use crate::stego::header::Algorithm;
use crate::stego::permute::{permuted_indices, PERMUTATION_SEED};
use crate::stego::{MAX_BITS_PER_CHANNEL, MIN_BITS_PER_CHANNEL};

/// Where one stream bit is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitLocation {
    /// Position in the pixel order (not a raster index).
    pub pixel: usize,
    pub channel: usize,
    pub bit: u8,
}

impl BitLocation {
    pub fn of(bit_index: usize, bits_per_channel: u8) -> Self {
        let bpc = bits_per_channel as usize;
        Self {
            pixel: bit_index / (CHANNELS * bpc),
            channel: (bit_index / bpc) % CHANNELS,
            bit: (bit_index % bpc) as u8,
        }
    }
}

/// Order in which pixels receive bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelOrder {
    /// y outer, x inner.
    Raster,
    /// Raster indices in shuffled order.
    Permuted(Vec<usize>),
}

impl PixelOrder {
    /// Pixel order for `algorithm` on a `width x height` image.
    pub fn for_algorithm(algorithm: Algorithm, width: u32, height: u32) -> Self {
        match algorithm {
            Algorithm::Sequential => Self::Raster,
            Algorithm::Permuted => Self::Permuted(permuted_indices(width, height, PERMUTATION_SEED)),
        }
    }

    /// Raster index of the `position`-th pixel in this order.
    #[inline]
    pub fn raster_index(&self, position: usize) -> usize {
        match self {
            Self::Raster => position,
            Self::Permuted(order) => order[position],
        }
    }
}

/// Total embeddable bits: `width * height * 3 * bits_per_channel`.
pub fn bit_capacity(carrier: &CarrierImage, bits_per_channel: u8) -> usize {
    carrier.total_pixels() * CHANNELS * bits_per_channel as usize
}

fn check_bits_per_channel(bits_per_channel: u8) -> Result<(), StegoError> {
    if !(MIN_BITS_PER_CHANNEL..=MAX_BITS_PER_CHANNEL).contains(&bits_per_channel) {
        return Err(ConfigurationError::InvalidBitsPerChannel(bits_per_channel).into());
    }
    Ok(())
}

#[inline]
fn byte_index(loc: BitLocation, order: &PixelOrder) -> usize {
    order.raster_index(loc.pixel) * CHANNELS + loc.channel
}

/// Raster byte index and bit position holding stream bit `bit_index`.
pub fn bit_position(bit_index: usize, bits_per_channel: u8, order: &PixelOrder) -> (usize, u8) {
    let loc = BitLocation::of(bit_index, bits_per_channel);
    (byte_index(loc, order), loc.bit)
}

/// Write `bits` (values 0/1) starting at stream bit 0.
///
/// # Errors
/// - [`ConfigurationError::InvalidBitsPerChannel`] outside `1..=3`.
/// - [`StegoError::InsufficientCapacity`] if the image holds fewer than
///   `bits.len()` bits. Nothing is written in that case.
pub fn embed(
    carrier: &mut CarrierImage,
    bits: &[u8],
    bits_per_channel: u8,
    order: &PixelOrder,
) -> Result<(), StegoError> {
    check_bits_per_channel(bits_per_channel)?;
    let available = bit_capacity(carrier, bits_per_channel);
    if bits.len() > available {
        return Err(StegoError::InsufficientCapacity {
            needed: bits.len().div_ceil(8),
            capacity: available / 8,
            width: carrier.width(),
            height: carrier.height(),
            bits_per_channel,
        });
    }

    let data = carrier.as_raw_mut();
    for (i, &bit) in bits.iter().enumerate() {
        let loc = BitLocation::of(i, bits_per_channel);
        let idx = byte_index(loc, order);
        data[idx] = (data[idx] & !(1 << loc.bit)) | ((bit & 1) << loc.bit);
    }
    Ok(())
}

/// Read `num_bits` bits starting at stream bit `offset`.
///
/// # Errors
/// - [`ConfigurationError::InvalidBitsPerChannel`] outside `1..=3`.
/// - [`IntegrityError::Truncated`] if `offset + num_bits` exceeds the image's
///   bit capacity.
pub fn extract(
    carrier: &CarrierImage,
    num_bits: usize,
    bits_per_channel: u8,
    order: &PixelOrder,
    offset: usize,
) -> Result<Vec<u8>, StegoError> {
    check_bits_per_channel(bits_per_channel)?;
    let available = bit_capacity(carrier, bits_per_channel);
    let end = offset.saturating_add(num_bits);
    if end > available {
        return Err(IntegrityError::Truncated { needed_bits: end, available_bits: available }.into());
    }

    let data = carrier.as_raw();
    Ok((offset..end)
        .map(|i| {
            let loc = BitLocation::of(i, bits_per_channel);
            (data[byte_index(loc, order)] >> loc.bit) & 1
        })
        .collect())
}
