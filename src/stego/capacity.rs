// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Capacity arithmetic and bit-depth / image-size planning.
//!
//! An image of `w x h` pixels at `b` bits per channel holds
//! `floor(w * h * 3 * b / 8)` bytes. The header and any ECC parity come out
//! of that budget; what remains is the payload capacity.

use crate::stego::ecc;
use crate::stego::error::{ConfigurationError, StegoError};
use crate::stego::header::HEADER_SIZE;
use crate::stego::{validate_dimensions, MAX_BITS_PER_CHANNEL, MIN_BITS_PER_CHANNEL};

/// Smallest side produced by [`choose_image_size`].
pub const MIN_PLANNED_DIMENSION: u32 = 10;

/// `width * height * 3 * bits_per_channel`; wide enough for any `u32` sides.
fn total_bits(width: u32, height: u32, bits_per_channel: u8) -> u128 {
    width as u128 * height as u128 * 3 * bits_per_channel as u128
}

/// Maximum payload bytes for the given geometry, clamped to 0 and
/// saturating at `usize::MAX`.
///
/// `floor(width * height * 3 * bits_per_channel / 8) - header_size - extra_overhead`
pub fn max_capacity(
    width: u32,
    height: u32,
    bits_per_channel: u8,
    header_size: usize,
    extra_overhead: usize,
) -> usize {
    let total_bytes = usize::try_from(total_bits(width, height, bits_per_channel) / 8).unwrap_or(usize::MAX);
    total_bytes
        .saturating_sub(header_size)
        .saturating_sub(extra_overhead)
}

/// Smallest bits-per-channel in `1..=3` whose capacity holds `payload_len`.
pub fn choose_min_bits(width: u32, height: u32, payload_len: usize) -> Result<u8, StegoError> {
    choose_min_bits_in(width, height, payload_len, MIN_BITS_PER_CHANNEL, MAX_BITS_PER_CHANNEL)
}

/// Linear search from `min_bits` to `max_bits` inclusive; the first value
/// whose capacity is at least `payload_len` wins, so the least distorting
/// depth is always preferred.
///
/// # Errors
/// - [`ConfigurationError::InvalidBitRange`] if the range is empty or outside `1..=3`.
/// - [`StegoError::InsufficientCapacity`] if nothing fits, reporting the
///   capacity at `max_bits`.
pub fn choose_min_bits_in(
    width: u32,
    height: u32,
    payload_len: usize,
    min_bits: u8,
    max_bits: u8,
) -> Result<u8, StegoError> {
    if min_bits < MIN_BITS_PER_CHANNEL || max_bits > MAX_BITS_PER_CHANNEL || min_bits > max_bits {
        return Err(ConfigurationError::InvalidBitRange { min: min_bits, max: max_bits }.into());
    }

    for bits in min_bits..=max_bits {
        if max_capacity(width, height, bits, HEADER_SIZE, 0) >= payload_len {
            return Ok(bits);
        }
    }

    Err(StegoError::InsufficientCapacity {
        needed: payload_len,
        capacity: max_capacity(width, height, max_bits, HEADER_SIZE, 0),
        width,
        height,
        bits_per_channel: max_bits,
    })
}

/// Capacity summary for one geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityInfo {
    pub width: u32,
    pub height: u32,
    pub bits_per_channel: u8,
    pub total_pixels: u64,
    /// Embeddable bits: `w * h * 3 * bits_per_channel`.
    pub total_bits: u128,
    pub total_bytes: u128,
    pub header_size: usize,
    /// Largest payload that fits without error correction.
    pub max_payload: usize,
}

impl CapacityInfo {
    /// Largest pre-ECC payload when Reed-Solomon with `parity` symbols per
    /// block is applied.
    pub fn with_ecc(&self, parity: usize) -> usize {
        ecc::max_data_len(self.max_payload, parity)
    }
}

/// Capacity summary for a `width x height` image at `bits_per_channel`.
pub fn compute_capacity(width: u32, height: u32, bits_per_channel: u8) -> CapacityInfo {
    let total_pixels = width as u64 * height as u64;
    let total_bits = total_bits(width, height, bits_per_channel);
    CapacityInfo {
        width,
        height,
        bits_per_channel,
        total_pixels,
        total_bits,
        total_bytes: total_bits / 8,
        header_size: HEADER_SIZE,
        max_payload: max_capacity(width, height, bits_per_channel, HEADER_SIZE, 0),
    }
}

/// Smallest roughly 4:3 image that holds `payload_len + extra_overhead`
/// bytes after the header at `bits_per_channel`. Each side is at least
/// [`MIN_PLANNED_DIMENSION`].
///
/// # Errors
/// - [`ConfigurationError::InvalidBitsPerChannel`] for a depth outside `1..=3`.
/// - [`ConfigurationError::InvalidDimensions`] if the required image exceeds
///   the dimension limits.
pub fn choose_image_size(
    payload_len: usize,
    bits_per_channel: u8,
    extra_overhead: usize,
) -> Result<(u32, u32), StegoError> {
    if !(MIN_BITS_PER_CHANNEL..=MAX_BITS_PER_CHANNEL).contains(&bits_per_channel) {
        return Err(ConfigurationError::InvalidBitsPerChannel(bits_per_channel).into());
    }

    let total_bits = (HEADER_SIZE as u128 + payload_len as u128 + extra_overhead as u128) * 8;
    let bits_per_pixel = 3 * bits_per_channel as u128;
    let pixels = total_bits.div_ceil(bits_per_pixel);

    let width = ((pixels as f64 * 4.0 / 3.0).sqrt().ceil() as u128).max(1);
    let height = pixels.div_ceil(width);

    let width = u32::try_from(width.max(MIN_PLANNED_DIMENSION as u128)).unwrap_or(u32::MAX);
    let height = u32::try_from(height.max(MIN_PLANNED_DIMENSION as u128)).unwrap_or(u32::MAX);
    validate_dimensions(width, height)?;

    Ok((width, height))
}
