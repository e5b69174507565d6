// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Fixed-size header embedded ahead of every payload.
//!
//! ```text
//! [4 bytes ] magic            "STLB" (sequential) / "STLR" (permuted)
//! [1 byte  ] version          2
//! [1 byte  ] algorithm id     1 / 2, must agree with the magic
//! [1 byte  ] flags            bit0 compressed, bit1 encrypted, bit2 ECC
//! [1 byte  ] ECC parity       Reed-Solomon parity symbols per block, 0 if none
//! [4 bytes ] payload length   little-endian u32, bytes following the header
//! [32 bytes] SHA-256          digest of the payload before ECC parity
//! ```
//!
//! Total header size = 44 bytes. Bytes 6 and 7 are zero when no transform is
//! active. The decoder always reads all 44 bytes before it knows the payload
//! length.

use serde::{Deserialize, Serialize};

use crate::stego::error::{IntegrityError, StegoError, UnsupportedAlgorithm};

/// Header size in bytes.
pub const HEADER_SIZE: usize = 44;

/// Header size in embedded bits.
pub const HEADER_BITS: usize = HEADER_SIZE * 8;

/// Current (and only supported) format version.
pub const FORMAT_VERSION: u8 = 2;

const FLAG_COMPRESSED: u8 = 0b001;
const FLAG_ENCRYPTED: u8 = 0b010;
const FLAG_ECC: u8 = 0b100;
const FLAG_MASK: u8 = FLAG_COMPRESSED | FLAG_ENCRYPTED | FLAG_ECC;

/// Placement strategy used to embed a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Algorithm {
    /// Raster order: y outer, x inner.
    #[default]
    Sequential = 1,
    /// Fixed-seed pseudo-random pixel order. Obfuscation only.
    Permuted = 2,
}

impl Algorithm {
    /// Every registered algorithm, in decoder probe order.
    pub const ALL: [Algorithm; 2] = [Algorithm::Sequential, Algorithm::Permuted];

    pub const fn magic(self) -> [u8; 4] {
        match self {
            Self::Sequential => *b"STLB",
            Self::Permuted => *b"STLR",
        }
    }

    pub const fn id(self) -> u8 {
        self as u8
    }

    pub fn from_magic(magic: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.magic() == magic)
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }
}

/// Transform flags recorded in header byte 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderFlags {
    pub compressed: bool,
    pub encrypted: bool,
    pub error_correction: bool,
}

impl HeaderFlags {
    fn to_byte(self) -> u8 {
        let mut b = 0;
        if self.compressed {
            b |= FLAG_COMPRESSED;
        }
        if self.encrypted {
            b |= FLAG_ENCRYPTED;
        }
        if self.error_correction {
            b |= FLAG_ECC;
        }
        b
    }

    fn from_byte(b: u8) -> Result<Self, IntegrityError> {
        if b & !FLAG_MASK != 0 {
            return Err(IntegrityError::MalformedHeader("unknown flag bits set"));
        }
        Ok(Self {
            compressed: b & FLAG_COMPRESSED != 0,
            encrypted: b & FLAG_ENCRYPTED != 0,
            error_correction: b & FLAG_ECC != 0,
        })
    }
}

/// Decoded header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub algorithm: Algorithm,
    pub version: u8,
    pub flags: HeaderFlags,
    /// Reed-Solomon parity symbols per block; 0 unless `flags.error_correction`.
    pub ecc_symbols: u8,
    /// Number of embedded payload bytes following the header.
    pub payload_len: u32,
    pub sha256: [u8; 32],
}

impl Header {
    pub fn new(algorithm: Algorithm, payload_len: u32, sha256: [u8; 32]) -> Self {
        Self {
            algorithm,
            version: FORMAT_VERSION,
            flags: HeaderFlags::default(),
            ecc_symbols: 0,
            payload_len,
            sha256,
        }
    }

    pub fn with_flags(mut self, flags: HeaderFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Record the ECC parity count. Sets the ECC flag when `symbols > 0`.
    pub fn with_ecc_symbols(mut self, symbols: u8) -> Self {
        self.ecc_symbols = symbols;
        self.flags.error_correction = symbols > 0;
        self
    }
}

/// Serialize a header into its fixed 44-byte layout.
pub fn encode_header(header: &Header) -> [u8; HEADER_SIZE] {
    let mut out = [0u8; HEADER_SIZE];
    out[0..4].copy_from_slice(&header.algorithm.magic());
    out[4] = header.version;
    out[5] = header.algorithm.id();
    out[6] = header.flags.to_byte();
    out[7] = header.ecc_symbols;
    out[8..12].copy_from_slice(&header.payload_len.to_le_bytes());
    out[12..44].copy_from_slice(&header.sha256);
    out
}

/// Parse a header from the first [`HEADER_SIZE`] bytes of `bytes`.
///
/// # Errors
/// - [`IntegrityError::IncompleteHeader`] if fewer than 44 bytes are supplied.
/// - [`UnsupportedAlgorithm`] if the magic, version or algorithm id is unknown
///   or inconsistent.
/// - [`IntegrityError::MalformedHeader`] for unknown flag bits or a parity
///   count that disagrees with the ECC flag.
pub fn decode_header(bytes: &[u8]) -> Result<Header, StegoError> {
    if bytes.len() < HEADER_SIZE {
        return Err(IntegrityError::IncompleteHeader {
            available: bytes.len(),
            needed: HEADER_SIZE,
        }
        .into());
    }

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&bytes[0..4]);
    let algorithm = Algorithm::from_magic(magic).ok_or(UnsupportedAlgorithm::UnknownMagic(magic))?;

    let version = bytes[4];
    if version != FORMAT_VERSION {
        return Err(UnsupportedAlgorithm::UnknownVersion(version).into());
    }

    let id = bytes[5];
    if Algorithm::from_id(id) != Some(algorithm) {
        return Err(UnsupportedAlgorithm::AlgorithmMismatch { magic, id }.into());
    }

    let flags = HeaderFlags::from_byte(bytes[6])?;
    let ecc_symbols = bytes[7];
    if flags.error_correction != (ecc_symbols > 0) {
        return Err(IntegrityError::MalformedHeader("ECC flag and parity count disagree").into());
    }

    let payload_len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let mut sha256 = [0u8; 32];
    sha256.copy_from_slice(&bytes[12..44]);

    Ok(Header {
        algorithm,
        version,
        flags,
        ecc_symbols,
        payload_len,
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header::new(Algorithm::Sequential, 1234, [7u8; 32])
    }

    #[test]
    fn layout_is_44_bytes() {
        let bytes = encode_header(&sample());
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[0..4], b"STLB");
        assert_eq!(bytes[4], 2);
        assert_eq!(bytes[5], 1);
        assert_eq!(&bytes[6..8], &[0, 0], "reserved bytes zero without transforms");
        assert_eq!(&bytes[8..12], &1234u32.to_le_bytes());
        assert_eq!(&bytes[12..], &[7u8; 32]);
    }

    #[test]
    fn roundtrip_both_algorithms() {
        for algorithm in Algorithm::ALL {
            let h = Header::new(algorithm, u32::MAX, [0xA5; 32]);
            assert_eq!(decode_header(&encode_header(&h)).unwrap(), h);
        }
    }

    #[test]
    fn roundtrip_with_flags_and_parity() {
        let h = sample()
            .with_flags(HeaderFlags { compressed: true, encrypted: true, error_correction: false })
            .with_ecc_symbols(10);
        assert!(h.flags.error_correction);
        let bytes = encode_header(&h);
        assert_eq!(bytes[6], 0b111);
        assert_eq!(bytes[7], 10);
        assert_eq!(decode_header(&bytes).unwrap(), h);
    }

    #[test]
    fn permuted_magic() {
        let bytes = encode_header(&Header::new(Algorithm::Permuted, 0, [0; 32]));
        assert_eq!(&bytes[0..4], b"STLR");
        assert_eq!(bytes[5], 2);
    }

    #[test]
    fn extra_trailing_bytes_ignored() {
        let mut bytes = encode_header(&sample()).to_vec();
        bytes.extend_from_slice(&[0xFF; 10]);
        assert_eq!(decode_header(&bytes).unwrap(), sample());
    }

    #[test]
    fn incomplete_header() {
        let bytes = encode_header(&sample());
        match decode_header(&bytes[..43]) {
            Err(StegoError::Integrity(IntegrityError::IncompleteHeader { available: 43, needed: 44 })) => {}
            other => panic!("expected IncompleteHeader, got {other:?}"),
        }
    }

    #[test]
    fn unknown_magic() {
        let mut bytes = encode_header(&sample());
        bytes[0..4].copy_from_slice(b"DATA");
        match decode_header(&bytes) {
            Err(StegoError::UnsupportedAlgorithm(UnsupportedAlgorithm::UnknownMagic(m))) => {
                assert_eq!(&m, b"DATA")
            }
            other => panic!("expected UnknownMagic, got {other:?}"),
        }
    }

    #[test]
    fn unknown_version() {
        let mut bytes = encode_header(&sample());
        bytes[4] = 1;
        assert!(matches!(
            decode_header(&bytes),
            Err(StegoError::UnsupportedAlgorithm(UnsupportedAlgorithm::UnknownVersion(1)))
        ));
    }

    #[test]
    fn magic_and_id_must_agree() {
        let mut bytes = encode_header(&sample());
        bytes[5] = Algorithm::Permuted.id();
        assert!(matches!(
            decode_header(&bytes),
            Err(StegoError::UnsupportedAlgorithm(UnsupportedAlgorithm::AlgorithmMismatch { id: 2, .. }))
        ));
    }

    #[test]
    fn unknown_flag_bits_rejected() {
        let mut bytes = encode_header(&sample());
        bytes[6] = 0x80;
        assert!(matches!(
            decode_header(&bytes),
            Err(StegoError::Integrity(IntegrityError::MalformedHeader(_)))
        ));
    }

    #[test]
    fn parity_without_flag_rejected() {
        let mut bytes = encode_header(&sample());
        bytes[7] = 4;
        assert!(matches!(
            decode_header(&bytes),
            Err(StegoError::Integrity(IntegrityError::MalformedHeader(_)))
        ));
    }
}
