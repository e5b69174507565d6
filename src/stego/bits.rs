// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Byte <-> bit conversion (MSB first within each byte).
//!
//! Bits are carried as `u8` values of 0 or 1, the same representation the
//! embedding engine reads and writes.

/// Convert bytes to a bit vector (MSB first within each byte).
///
/// The output is always `8 * bytes.len()` long.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Convert a bit vector (MSB first) back to bytes.
///
/// Precondition: `bits.len()` is a multiple of 8. Debug builds assert this;
/// release builds right-pad the final byte with zero bits.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    debug_assert!(
        bits.len() % 8 == 0,
        "bit count {} is not a multiple of 8",
        bits.len()
    );
    let mut bytes = Vec::with_capacity(bits.len().div_ceil(8));
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << (7 - i);
        }
        bytes.push(byte);
    }
    bytes
}
