// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Deterministic pixel permutation for the permuted placement strategy.
//!
//! Pixels are listed in raster order (y outer, x inner) and shuffled with a
//! Fisher-Yates pass driven by ChaCha20. The seed is public and fixed, so the
//! order hides nothing from anyone who knows the format; it only scatters
//! the modified pixels across the image.
//!
//! # Cross-platform portability
//!
//! Each swap index is drawn from a single `u32` keystream word with explicit
//! rejection sampling rather than `Rng::gen_range`, so the shuffle depends on
//! nothing but the ChaCha20 keystream. The same `(width, height, seed)` gives
//! the same order on every target and every `rand` release.

use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Seed used by the permuted strategy.
pub const PERMUTATION_SEED: u64 = 42;

/// Expand a `u64` seed into a ChaCha20 key: little-endian seed, then zeros.
fn chacha_key(seed: u64) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&seed.to_le_bytes());
    key
}

/// Uniform draw in `[0, bound)`.
///
/// Values below `2^32 mod bound` are rejected so every residue has the same
/// number of preimages.
fn uniform_below(rng: &mut ChaCha20Rng, bound: u32) -> u32 {
    debug_assert!(bound > 0);
    let threshold = bound.wrapping_neg() % bound;
    loop {
        let r = rng.next_u32();
        if r >= threshold {
            return r % bound;
        }
    }
}

/// Raster indices (`y * width + x`) of all pixels, in permuted order.
///
/// Swap indices are drawn as `u32`, so images with more than `u32::MAX`
/// pixels have no defined order and yield an empty vector. The dimension
/// limits keep every valid carrier far below that.
pub fn permuted_indices(width: u32, height: u32, seed: u64) -> Vec<usize> {
    let pixels = width as u64 * height as u64;
    if pixels > u32::MAX as u64 {
        return Vec::new();
    }
    let n = pixels as usize;

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha20Rng::from_seed(chacha_key(seed));
    for i in (1..n).rev() {
        let j = uniform_below(&mut rng, (i + 1) as u32) as usize;
        order.swap(i, j);
    }
    order
}

/// Every `(x, y)` coordinate of a `width x height` image exactly once, in
/// pseudo-random order determined by `seed`. Empty when the image has no
/// pixels or more than `u32::MAX` of them.
pub fn permutation(width: u32, height: u32, seed: u64) -> Vec<(u32, u32)> {
    if width == 0 {
        return Vec::new();
    }
    permuted_indices(width, height, seed)
        .into_iter()
        .map(|idx| ((idx % width as usize) as u32, (idx / width as usize) as u32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(permutation(17, 9, 42), permutation(17, 9, 42));
    }

    #[test]
    fn is_a_bijection() {
        let (w, h) = (13u32, 7u32);
        let mut coords = permutation(w, h, PERMUTATION_SEED);
        assert_eq!(coords.len(), (w * h) as usize);
        coords.sort();
        coords.dedup();
        assert_eq!(coords.len(), (w * h) as usize);
        assert!(coords.iter().all(|&(x, y)| x < w && y < h));
    }

    #[test]
    fn different_seeds_differ() {
        assert_ne!(permutation(8, 8, 1), permutation(8, 8, 2));
    }

    #[test]
    fn not_raster_order() {
        let raster: Vec<(u32, u32)> = (0..8u32).flat_map(|y| (0..8u32).map(move |x| (x, y))).collect();
        assert_ne!(permutation(8, 8, PERMUTATION_SEED), raster);
    }

    #[test]
    fn degenerate_sizes() {
        assert!(permutation(0, 5, 42).is_empty());
        assert!(permutation(5, 0, 42).is_empty());
        assert_eq!(permutation(1, 1, 42), vec![(0, 0)]);
    }

    #[test]
    fn oversized_images_have_no_order() {
        // 65536 * 65536 = 2^32 pixels, one past what a u32 draw can index.
        assert!(permuted_indices(65_536, 65_536, 42).is_empty());
        assert!(permutation(u32::MAX, u32::MAX, 42).is_empty());
        assert!(permutation(u32::MAX, 2, PERMUTATION_SEED).is_empty());
    }

    #[test]
    fn indices_match_coordinates() {
        let (w, h) = (6u32, 5u32);
        let idx = permuted_indices(w, h, 7);
        let coords = permutation(w, h, 7);
        for (i, &(x, y)) in idx.iter().zip(&coords) {
            assert_eq!(*i, (y * w + x) as usize);
        }
    }

    #[test]
    fn uniform_below_respects_bound() {
        let mut rng = ChaCha20Rng::from_seed(chacha_key(3));
        for bound in [1u32, 2, 3, 7, 255, 1 << 31, u32::MAX] {
            for _ in 0..64 {
                assert!(uniform_below(&mut rng, bound) < bound);
            }
        }
    }
}
