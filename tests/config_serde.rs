// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Configuration deserialization.

use pixstego_core::{decode, encode, Algorithm, DecodeConfig, EmbedConfig};

#[test]
fn minimal_embed_config_uses_defaults() {
    let config: EmbedConfig = serde_json::from_str(r#"{ "image_size": [64, 48] }"#).unwrap();
    assert_eq!(config, EmbedConfig::new(64, 48));
}

#[test]
fn full_embed_config() {
    let json = r#"{
        "image_size": [120, 90],
        "bits_per_channel": 3,
        "algorithm": "permuted",
        "compress": false,
        "password": "s3cret",
        "auto_bits": true,
        "error_correction_symbols": 10
    }"#;
    let config: EmbedConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.image_size, (120, 90));
    assert_eq!(config.bits_per_channel, 3);
    assert_eq!(config.algorithm, Algorithm::Permuted);
    assert!(!config.compress);
    assert_eq!(config.password.as_deref(), Some("s3cret"));
    assert!(config.auto_bits);
    assert_eq!(config.error_correction_symbols, Some(10));
    assert!(config.validate().is_ok());
}

#[test]
fn unknown_fields_rejected() {
    let err = serde_json::from_str::<EmbedConfig>(r#"{ "image_size": [10, 10], "bits_per_chanel": 2 }"#)
        .unwrap_err();
    assert!(err.to_string().contains("bits_per_chanel"), "{err}");

    assert!(serde_json::from_str::<DecodeConfig>(r#"{ "passphrase": "x" }"#).is_err());
}

#[test]
fn unknown_algorithm_rejected() {
    assert!(serde_json::from_str::<EmbedConfig>(r#"{ "image_size": [10, 10], "algorithm": "spiral" }"#).is_err());
}

#[test]
fn out_of_range_values_fail_validation_not_parsing() {
    let config: EmbedConfig = serde_json::from_str(r#"{ "image_size": [10, 10], "bits_per_channel": 5 }"#).unwrap();
    assert!(config.validate().is_err());
    assert!(encode(b"x", &config).is_err());
}

#[test]
fn decode_config_from_json_drives_decode() {
    let (img, _) = encode(b"json", &EmbedConfig::new(30, 30).with_algorithm(Algorithm::Permuted)).unwrap();
    let config: DecodeConfig = serde_json::from_str(r#"{ "algorithm": "permuted", "bits_per_channel": 2 }"#).unwrap();
    assert_eq!(decode(&img, &config).unwrap().0, b"json");

    let empty: DecodeConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, DecodeConfig::default());
}

#[test]
fn serialize_roundtrip_keeps_fields() {
    let config = EmbedConfig::new(32, 32).with_algorithm(Algorithm::Permuted).with_error_correction(8);
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains(r#""algorithm":"permuted""#), "{json}");
    assert_eq!(serde_json::from_str::<EmbedConfig>(&json).unwrap(), config);
}
