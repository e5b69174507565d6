// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Round-trip integration tests for encode/decode.

use pixstego_core::stego::permute::{permuted_indices, PERMUTATION_SEED};
use pixstego_core::{
    choose_image_size, decode, encode, encode_into, Algorithm, CarrierImage, Codec, DecodeConfig, EmbedConfig,
    StegoError,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic bytes that zlib cannot shrink.
fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut x = seed.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            (x >> 24) as u8
        })
        .collect()
}

#[test]
fn every_depth_and_algorithm() {
    init_logging();
    for bits in 1..=3u8 {
        for algorithm in [Algorithm::Sequential, Algorithm::Permuted] {
            let payload = noise(500, bits as u32 * 10 + algorithm as u32);
            let config = EmbedConfig::new(40, 40).with_bits_per_channel(bits).with_algorithm(algorithm);
            let (img, enc) = encode(&payload, &config).unwrap();
            assert_eq!(enc.bits_per_channel, bits);
            assert_eq!(enc.algorithm, algorithm);

            let (decoded, meta) = decode(&img, &DecodeConfig::new()).unwrap();
            assert_eq!(decoded, payload, "bits={bits} algorithm={algorithm:?}");
            assert_eq!(meta.bits_per_channel, bits);
            assert_eq!(meta.algorithm, algorithm);
        }
    }
}

#[test]
fn empty_payload() {
    for algorithm in [Algorithm::Sequential, Algorithm::Permuted] {
        let (img, meta) = encode(b"", &EmbedConfig::new(20, 20).with_algorithm(algorithm)).unwrap();
        assert_eq!(meta.payload_len, 0);
        assert_eq!(meta.bits_used, 352);
        let (decoded, _) = decode(&img, &DecodeConfig::new()).unwrap();
        assert!(decoded.is_empty());
    }
}

#[test]
fn single_byte() {
    let (img, _) = encode(&[0xA5], &EmbedConfig::new(16, 16).with_bits_per_channel(1)).unwrap();
    assert_eq!(decode(&img, &DecodeConfig::new()).unwrap().0, vec![0xA5]);
}

#[test]
fn exact_capacity_fits_one_more_does_not() {
    // 50x50 @ 2 bits: 1875 bytes - 44 header = 1831
    let config = EmbedConfig::new(50, 50).with_compression(false);
    let payload = noise(1831, 7);
    let (img, meta) = encode(&payload, &config).unwrap();
    assert_eq!(meta.pixels_used, 2500);
    assert!((meta.efficiency() - 1.0).abs() < 1e-12);
    assert_eq!(decode(&img, &DecodeConfig::new()).unwrap().0, payload);

    match encode(&noise(1832, 7), &config) {
        Err(StegoError::InsufficientCapacity { needed: 1832, capacity: 1831, .. }) => {}
        other => panic!("expected InsufficientCapacity, got {other:?}"),
    }
}

#[test]
fn exact_capacity_permuted() {
    let config = EmbedConfig::new(50, 50).with_compression(false).with_algorithm(Algorithm::Permuted);
    let payload = noise(1831, 8);
    let (img, meta) = encode(&payload, &config).unwrap();
    assert_eq!(meta.pixels_used, 2500);
    assert_eq!(decode(&img, &DecodeConfig::new()).unwrap().0, payload);

    match encode(&noise(1832, 8), &config) {
        Err(StegoError::InsufficientCapacity { needed: 1832, capacity: 1831, .. }) => {}
        other => panic!("expected InsufficientCapacity, got {other:?}"),
    }
}

#[test]
fn exact_capacity_with_ecc() {
    // 1831 B budget: 1751 data + 8 blocks * 10 parity fills it exactly.
    for algorithm in [Algorithm::Sequential, Algorithm::Permuted] {
        let config = EmbedConfig::new(50, 50)
            .with_compression(false)
            .with_error_correction(10)
            .with_algorithm(algorithm);
        let payload = noise(1751, 9);
        let (img, meta) = encode(&payload, &config).unwrap();
        assert_eq!(meta.payload_len, 1831);
        assert_eq!(meta.ecc_overhead, 80);
        assert_eq!(decode(&img, &DecodeConfig::new()).unwrap().0, payload);

        match encode(&noise(1752, 9), &config) {
            Err(StegoError::InsufficientCapacity { needed: 1752, capacity: 1751, .. }) => {}
            other => panic!("expected InsufficientCapacity, got {other:?}"),
        }
    }
}

#[test]
fn auto_bits_picks_smallest_depth() {
    // 100x100: 3706 B at 1 bit, 7456 B at 2 bits
    let config = EmbedConfig::new(100, 100).with_compression(false).with_auto_bits(true).with_bits_per_channel(3);
    let (img, meta) = encode(&noise(5000, 1), &config).unwrap();
    assert_eq!(meta.bits_per_channel, 2);
    assert_eq!(decode(&img, &DecodeConfig::new()).unwrap().1.bits_per_channel, 2);

    let (_, meta) = encode(&noise(100, 2), &config).unwrap();
    assert_eq!(meta.bits_per_channel, 1);
}

#[test]
fn compressible_payload_is_compressed() {
    let text = "All work and no play makes Jack a dull boy. ".repeat(100);
    let (img, meta) = encode(text.as_bytes(), &EmbedConfig::new(40, 40)).unwrap();
    assert!(meta.compressed);
    assert!(meta.payload_len < text.len());
    let (decoded, dmeta) = decode(&img, &DecodeConfig::new()).unwrap();
    assert!(dmeta.compressed);
    assert_eq!(decoded, text.as_bytes());
}

#[test]
fn password_and_ecc_roundtrip() {
    let config = EmbedConfig::new(60, 60).with_password("correct horse").with_error_correction(16);
    let (img, meta) = encode(b"encrypted and protected", &config).unwrap();
    assert!(meta.encrypted);
    assert_eq!(meta.ecc_overhead, 16);

    let (decoded, dmeta) = decode(&img, &DecodeConfig::new().with_password("correct horse")).unwrap();
    assert_eq!(decoded, b"encrypted and protected");
    assert!(dmeta.encrypted);
    assert_eq!(dmeta.ecc_symbols, 16);
    assert_eq!(dmeta.corrected_symbols, 0);
}

#[test]
fn survives_png_persistence() {
    let payload = noise(300, 3);
    let config = EmbedConfig::new(30, 20).with_bits_per_channel(3).with_algorithm(Algorithm::Permuted);
    let (img, _) = encode(&payload, &config).unwrap();

    let png = img.to_png_bytes().unwrap();
    let reloaded = CarrierImage::from_png_bytes(&png).unwrap();
    assert_eq!(decode(&reloaded, &DecodeConfig::new()).unwrap().0, payload);
}

fn gradient(width: u32, height: u32) -> CarrierImage {
    let data = (0..height)
        .flat_map(|y| (0..width).flat_map(move |x| [(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8]))
        .collect();
    CarrierImage::from_raw(width, height, data).unwrap()
}

#[test]
fn carrier_reuse_sequential_leaves_tail_untouched() {
    let original = gradient(64, 64);
    let config = EmbedConfig::new(64, 64).with_bits_per_channel(1);
    let (img, meta) = encode_into(b"tucked into a photo", original.clone(), &config).unwrap();

    let used = meta.pixels_used * 3;
    assert_eq!(&img.as_raw()[used..], &original.as_raw()[used..]);
    // Only the lowest bit of used pixels may differ.
    for (a, b) in img.as_raw()[..used].iter().zip(&original.as_raw()[..used]) {
        assert_eq!(a & 0xFE, b & 0xFE);
    }
    assert_eq!(decode(&img, &DecodeConfig::new()).unwrap().0, b"tucked into a photo");
}

#[test]
fn carrier_reuse_permuted_only_touches_listed_pixels() {
    let original = gradient(48, 32);
    let config = EmbedConfig::new(48, 32).with_algorithm(Algorithm::Permuted);
    let (img, meta) = encode_into(b"scattered", original.clone(), &config).unwrap();

    let order = permuted_indices(48, 32, PERMUTATION_SEED);
    let mut touched = vec![false; 48 * 32];
    for &idx in &order[..meta.pixels_used] {
        touched[idx] = true;
    }
    for (idx, was_touched) in touched.iter().enumerate() {
        if !was_touched {
            let (x, y) = ((idx % 48) as u32, (idx / 48) as u32);
            assert_eq!(img.pixel(x, y), original.pixel(x, y), "pixel ({x},{y}) changed");
        }
    }
    assert_eq!(decode(&img, &DecodeConfig::new()).unwrap().0, b"scattered");
}

#[test]
fn reused_carrier_decodes_newest_payload() {
    init_logging();
    for side in 100u32..120 {
        let (img, _) = encode(b"old secret AAAA", &EmbedConfig::new(side, side)).unwrap();
        let newer = EmbedConfig::new(side, side).with_algorithm(Algorithm::Permuted);
        let (img, _) = encode_into(b"new message BBB", img, &newer).unwrap();
        assert_eq!(decode(&img, &DecodeConfig::new()).unwrap().0, b"new message BBB", "side {side}");
    }
}

#[test]
fn reused_carrier_every_placement_pair() {
    let placements: Vec<(u8, Algorithm)> = (1..=3u8)
        .flat_map(|bits| [Algorithm::Sequential, Algorithm::Permuted].map(|a| (bits, a)))
        .collect();
    for &(old_bits, old_algorithm) in &placements {
        let old = EmbedConfig::new(48, 40).with_bits_per_channel(old_bits).with_algorithm(old_algorithm);
        let (original, _) = encode(&noise(120, 11), &old).unwrap();
        for &(new_bits, new_algorithm) in &placements {
            let new = EmbedConfig::new(48, 40).with_bits_per_channel(new_bits).with_algorithm(new_algorithm);
            let payload = noise(40, 12);
            let (img, _) = encode_into(&payload, original.clone(), &new).unwrap();
            let (decoded, meta) = decode(&img, &DecodeConfig::new()).unwrap();
            assert_eq!(
                decoded, payload,
                "old {old_bits}/{old_algorithm:?} then new {new_bits}/{new_algorithm:?}"
            );
            assert_eq!((meta.bits_per_channel, meta.algorithm), (new_bits, new_algorithm));
        }
    }
}

#[test]
fn planned_image_size_holds_payload() {
    let payload = noise(2000, 9);
    for bits in 1..=3u8 {
        let (w, h) = choose_image_size(payload.len(), bits, 0).unwrap();
        let config = EmbedConfig::new(w, h).with_bits_per_channel(bits).with_compression(false);
        let (img, _) = encode(&payload, &config).unwrap();
        assert_eq!(decode(&img, &DecodeConfig::new()).unwrap().0, payload);
    }
}

#[test]
fn pinned_decode_config() {
    let config = EmbedConfig::new(40, 40).with_bits_per_channel(3).with_algorithm(Algorithm::Permuted);
    let (img, _) = encode(b"pinned", &config).unwrap();
    let pinned = DecodeConfig::new().with_bits_per_channel(3).with_algorithm(Algorithm::Permuted);
    assert_eq!(Codec::plain().decode(&img, &pinned).unwrap().0, b"pinned");
}
