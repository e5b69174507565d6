// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Encode/decode facade.
//!
//! Encode:
//! 1. Validate the configuration and check the needed backends exist.
//! 2. Transform the payload (encrypt, compress, hash, RS parity).
//! 3. Pick bits per channel (fixed or smallest that fits) and check capacity.
//! 4. Build the 44-byte header and embed header + payload bits.
//!
//! Decode probes every `(bits_per_channel, algorithm)` pair the config leaves
//! open, bits ascending and sequential before permuted, and takes the first
//! pair whose 44 header bytes parse. The payload is then extracted, verified
//! and untransformed.

use std::fmt;

use log::{debug, trace};

use crate::stego::bits::{bits_to_bytes, bytes_to_bits};
use crate::stego::capacity::{choose_min_bits, max_capacity};
use crate::stego::carrier::{CarrierImage, CHANNELS};
use crate::stego::config::{DecodeConfig, EmbedConfig};
use crate::stego::crypto::{AesCbcCipher, CipherCodec};
use crate::stego::ecc::{ErrorCorrectionCodec, ReedSolomon};
use crate::stego::embed::{bit_capacity, bit_position, embed, extract, PixelOrder};
use crate::stego::error::{ConfigurationError, IntegrityError, StegoError};
use crate::stego::header::{decode_header, encode_header, Algorithm, Header, HEADER_BITS, HEADER_SIZE};
use crate::stego::payload::{self, PreparedPayload, TransformOptions};
use crate::stego::MAX_BITS_PER_CHANNEL;

/// Leading header bits holding the magic.
const MAGIC_BITS: usize = 32;

/// What [`Codec::encode`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeMetadata {
    pub width: u32,
    pub height: u32,
    pub bits_per_channel: u8,
    pub algorithm: Algorithm,
    /// Caller payload length.
    pub original_len: usize,
    /// Bytes embedded after the header (transformed, including parity).
    pub payload_len: usize,
    pub ecc_overhead: usize,
    pub compressed: bool,
    pub encrypted: bool,
    pub header_size: usize,
    /// Header plus payload bits written.
    pub bits_used: usize,
    pub pixels_used: usize,
    pub total_pixels: usize,
    /// Payload bytes the image could hold at this depth.
    pub capacity: usize,
    pub sha256: [u8; 32],
}

impl EncodeMetadata {
    /// Fraction of embeddable bits actually used, in `0.0..=1.0`.
    pub fn efficiency(&self) -> f64 {
        let total = self.total_pixels as f64 * CHANNELS as f64 * self.bits_per_channel as f64;
        if total == 0.0 {
            return 0.0;
        }
        self.bits_used as f64 / total
    }

    pub fn sha256_hex(&self) -> String {
        hex::encode(self.sha256)
    }
}

/// What [`Codec::decode`] found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeMetadata {
    pub width: u32,
    pub height: u32,
    pub bits_per_channel: u8,
    pub algorithm: Algorithm,
    pub version: u8,
    /// Embedded bytes after the header.
    pub payload_len: usize,
    pub compressed: bool,
    pub encrypted: bool,
    pub ecc_symbols: u8,
    pub corrected_symbols: usize,
    pub sha256: [u8; 32],
}

impl DecodeMetadata {
    pub fn sha256_hex(&self) -> String {
        hex::encode(self.sha256)
    }
}

/// Steganography codec with optional cipher and error-correction backends.
///
/// A configuration that needs a backend the codec lacks is rejected with a
/// [`ConfigurationError`] before any pixel is touched.
pub struct Codec {
    cipher: Option<Box<dyn CipherCodec>>,
    ecc: Option<Box<dyn ErrorCorrectionCodec>>,
}

/// Payload ready to embed at a fixed depth.
struct EmbedPlan {
    prepared: PreparedPayload,
    header: Header,
    bits_per_channel: u8,
    original_len: usize,
}

impl Codec {
    /// Codec with AES-256-CBC and Reed-Solomon.
    pub fn new() -> Self {
        Self::with_backends(Some(Box::new(AesCbcCipher)), Some(Box::new(ReedSolomon)))
    }

    /// Codec without encryption or error correction.
    pub fn plain() -> Self {
        Self::with_backends(None, None)
    }

    pub fn with_backends(
        cipher: Option<Box<dyn CipherCodec>>,
        ecc: Option<Box<dyn ErrorCorrectionCodec>>,
    ) -> Self {
        Self { cipher, ecc }
    }

    pub fn has_cipher(&self) -> bool {
        self.cipher.is_some()
    }

    pub fn has_ecc(&self) -> bool {
        self.ecc.is_some()
    }

    fn cipher(&self) -> Option<&dyn CipherCodec> {
        self.cipher.as_deref()
    }

    fn ecc(&self) -> Option<&dyn ErrorCorrectionCodec> {
        self.ecc.as_deref()
    }

    /// Embed `payload` into a freshly generated carrier of `config.image_size`.
    ///
    /// # Errors
    /// - [`StegoError::Configuration`] for invalid parameters or missing backends.
    /// - [`StegoError::InsufficientCapacity`] when the transformed payload does not fit.
    pub fn encode(&self, payload: &[u8], config: &EmbedConfig) -> Result<(CarrierImage, EncodeMetadata), StegoError> {
        let plan = self.plan(payload, config)?;
        let (width, height) = config.image_size;
        let carrier = CarrierImage::filler(width, height)?;
        debug!("generated {width}x{height} filler carrier");
        self.write(plan, carrier, config)
    }

    /// Embed `payload` into a caller-supplied carrier. Pixels beyond the
    /// embedded bits keep their original values, except that a header left
    /// by an earlier encode, which decoding would reach first, gets one of its
    /// magic bits flipped.
    ///
    /// # Errors
    /// As [`encode`](Self::encode), plus [`ConfigurationError::ImageSizeMismatch`]
    /// if the carrier is not `config.image_size`, and
    /// [`ConfigurationError::StaleHeader`] if an older header cannot be cleared.
    pub fn encode_into(
        &self,
        payload: &[u8],
        carrier: CarrierImage,
        config: &EmbedConfig,
    ) -> Result<(CarrierImage, EncodeMetadata), StegoError> {
        if carrier.dimensions() != config.image_size {
            return Err(ConfigurationError::ImageSizeMismatch {
                expected: config.image_size,
                actual: carrier.dimensions(),
            }
            .into());
        }
        let plan = self.plan(payload, config)?;
        self.write(plan, carrier, config)
    }

    fn plan(&self, payload: &[u8], config: &EmbedConfig) -> Result<EmbedPlan, StegoError> {
        config.validate()?;
        let (width, height) = config.image_size;
        debug!("encode configured: {config:?}, payload {} bytes", payload.len());

        let options = TransformOptions {
            password: config.password.as_deref(),
            compress: config.compress,
            ecc_symbols: config.ecc_symbols_u8(),
        };
        let prepared = payload::prepare(payload, &options, self.cipher(), self.ecc())?;
        let needed = prepared.embedded.len() - prepared.ecc_overhead;
        let overhead = match self.ecc() {
            Some(ecc) if prepared.flags.error_correction => ecc.overhead(needed, prepared.ecc_symbols as usize),
            _ => 0,
        };
        debug!("payload prepared: {needed} bytes to embed ({overhead} parity)");

        let bits_per_channel = if config.auto_bits {
            // Nothing fits: fall through to the deepest setting and report it below.
            let bits = match choose_min_bits(width, height, needed + overhead) {
                Ok(bits) => bits,
                Err(StegoError::InsufficientCapacity { .. }) => MAX_BITS_PER_CHANNEL,
                Err(e) => return Err(e),
            };
            debug!("auto-selected {bits} bits per channel");
            bits
        } else {
            config.bits_per_channel
        };

        let capacity = max_capacity(width, height, bits_per_channel, HEADER_SIZE, overhead);
        let insufficient = || StegoError::InsufficientCapacity {
            needed,
            capacity,
            width,
            height,
            bits_per_channel,
        };
        if needed > capacity {
            return Err(insufficient());
        }
        let payload_len = u32::try_from(prepared.embedded.len()).map_err(|_| insufficient())?;

        let header = Header::new(config.algorithm, payload_len, prepared.sha256)
            .with_flags(prepared.flags)
            .with_ecc_symbols(prepared.ecc_symbols);
        debug!("header built: {header:?}");

        Ok(EmbedPlan { prepared, header, bits_per_channel, original_len: payload.len() })
    }

    fn write(
        &self,
        plan: EmbedPlan,
        mut carrier: CarrierImage,
        config: &EmbedConfig,
    ) -> Result<(CarrierImage, EncodeMetadata), StegoError> {
        let EmbedPlan { prepared, header, bits_per_channel, original_len } = plan;
        let (width, height) = carrier.dimensions();

        let mut stream = Vec::with_capacity(HEADER_SIZE + prepared.embedded.len());
        stream.extend_from_slice(&encode_header(&header));
        stream.extend_from_slice(&prepared.embedded);
        let bits = bytes_to_bits(&stream);

        let order = PixelOrder::for_algorithm(config.algorithm, width, height);
        embed(&mut carrier, &bits, bits_per_channel, &order)?;
        debug!(
            "embedded {} bits at {bits_per_channel} bits/channel ({:?})",
            bits.len(),
            config.algorithm
        );
        clear_stale_headers(&mut carrier, bits.len(), bits_per_channel, config.algorithm, &order)?;

        let metadata = EncodeMetadata {
            width,
            height,
            bits_per_channel,
            algorithm: config.algorithm,
            original_len,
            payload_len: prepared.embedded.len(),
            ecc_overhead: prepared.ecc_overhead,
            compressed: prepared.flags.compressed,
            encrypted: prepared.flags.encrypted,
            header_size: HEADER_SIZE,
            bits_used: bits.len(),
            pixels_used: bits.len().div_ceil(CHANNELS * bits_per_channel as usize),
            total_pixels: carrier.total_pixels(),
            capacity: max_capacity(width, height, bits_per_channel, HEADER_SIZE, 0),
            sha256: prepared.sha256,
        };
        Ok((carrier, metadata))
    }

    /// Recover the payload embedded in `carrier`.
    ///
    /// Candidates are tried in probe order. A header whose payload then fails
    /// (truncated, corrupted, undecryptable) does not end the search; its
    /// error is returned only if no later candidate decodes.
    ///
    /// # Errors
    /// - [`IntegrityError::IncompleteHeader`] if no candidate depth holds a header.
    /// - [`StegoError::UnsupportedAlgorithm`] if headers are readable but none parses.
    /// - [`IntegrityError`] for truncation, corruption or failed transforms.
    /// - [`StegoError::Configuration`] for a missing password or backend.
    pub fn decode(&self, carrier: &CarrierImage, config: &DecodeConfig) -> Result<(Vec<u8>, DecodeMetadata), StegoError> {
        config.validate()?;
        let (width, height) = carrier.dimensions();
        let raster = PixelOrder::Raster;
        // The permuted order depends only on the image size; build it once.
        let mut permuted: Option<PixelOrder> = None;
        let mut first_payload_error: Option<StegoError> = None;
        let mut first_parse_error: Option<StegoError> = None;
        let mut best_available_bits = 0usize;

        for (bits_per_channel, algorithm) in config.candidates() {
            let order = match algorithm {
                Algorithm::Sequential => &raster,
                Algorithm::Permuted => &*permuted
                    .get_or_insert_with(|| PixelOrder::for_algorithm(Algorithm::Permuted, width, height)),
            };
            best_available_bits = best_available_bits.max(bit_capacity(carrier, bits_per_channel));

            let header = match probe(carrier, bits_per_channel, algorithm, order) {
                Probe::Found(header) => header,
                Probe::Unreadable => continue,
                Probe::Invalid(e) => {
                    first_parse_error.get_or_insert(e);
                    continue;
                }
            };
            debug!("header extracted at {bits_per_channel} bits/channel: {header:?}");

            match self.read_payload(carrier, config, &header, bits_per_channel, order) {
                Ok(decoded) => return Ok(decoded),
                Err(e) => {
                    debug!("payload behind {bits_per_channel}/{algorithm:?} header rejected: {e}");
                    first_payload_error.get_or_insert(e);
                }
            }
        }

        Err(first_payload_error.or(first_parse_error).unwrap_or_else(|| {
            IntegrityError::IncompleteHeader { available: best_available_bits / 8, needed: HEADER_SIZE }.into()
        }))
    }

    fn read_payload(
        &self,
        carrier: &CarrierImage,
        config: &DecodeConfig,
        header: &Header,
        bits_per_channel: u8,
        order: &PixelOrder,
    ) -> Result<(Vec<u8>, DecodeMetadata), StegoError> {
        let (width, height) = carrier.dimensions();
        payload::check_decode_backends(header, config.password.as_deref(), self.cipher(), self.ecc())?;

        let payload_len = header.payload_len as usize;
        let bits = extract(carrier, payload_len * 8, bits_per_channel, order, HEADER_BITS)?;
        let embedded = bits_to_bytes(&bits);
        debug!("payload extracted: {payload_len} bytes");

        let recovered = payload::recover(&embedded, header, config.password.as_deref(), self.cipher(), self.ecc())?;
        debug!("payload verified and transformed: {} bytes", recovered.data.len());

        let metadata = DecodeMetadata {
            width,
            height,
            bits_per_channel,
            algorithm: header.algorithm,
            version: header.version,
            payload_len,
            compressed: header.flags.compressed,
            encrypted: header.flags.encrypted,
            ecc_symbols: header.ecc_symbols,
            corrected_symbols: recovered.corrected_symbols,
            sha256: header.sha256,
        };
        Ok((recovered.data, metadata))
    }
}

/// Outcome of reading the header slot of one `(bits_per_channel, algorithm)` candidate.
enum Probe {
    Found(Header),
    /// Too small for a header, or the header names the other algorithm.
    Unreadable,
    Invalid(StegoError),
}

fn probe(carrier: &CarrierImage, bits_per_channel: u8, algorithm: Algorithm, order: &PixelOrder) -> Probe {
    let bits = match extract(carrier, HEADER_BITS, bits_per_channel, order, 0) {
        Ok(bits) => bits,
        Err(e) => {
            trace!("probe {bits_per_channel}/{algorithm:?}: {e}");
            return Probe::Unreadable;
        }
    };
    match decode_header(&bits_to_bytes(&bits)) {
        Ok(header) if header.algorithm == algorithm => Probe::Found(header),
        Ok(header) => {
            trace!("probe {bits_per_channel}/{algorithm:?}: header names {:?}", header.algorithm);
            Probe::Unreadable
        }
        Err(e) => {
            trace!("probe {bits_per_channel}/{algorithm:?}: {e}");
            Probe::Invalid(e)
        }
    }
}

/// Break the magic of every older header the decoder would reach before the
/// one just written at `(bits_per_channel, algorithm)`.
///
/// Only bits outside the new stream are flipped, so the new payload stays
/// intact. A reused carrier would otherwise decode to its previous payload.
fn clear_stale_headers(
    carrier: &mut CarrierImage,
    written_bits: usize,
    bits_per_channel: u8,
    algorithm: Algorithm,
    order: &PixelOrder,
) -> Result<(), StegoError> {
    let (width, height) = carrier.dimensions();
    let mut written = vec![0u8; carrier.as_raw().len()];
    for i in 0..written_bits {
        let (byte, bit) = bit_position(i, bits_per_channel, order);
        written[byte] |= 1 << bit;
    }

    let raster = PixelOrder::Raster;
    let mut permuted: Option<PixelOrder> = None;
    let earlier: Vec<(u8, Algorithm)> = DecodeConfig::new()
        .candidates()
        .into_iter()
        .take_while(|&candidate| candidate != (bits_per_channel, algorithm))
        .collect();

    for &(stale_bits, stale_algorithm) in &earlier {
        let stale_order = match (stale_algorithm, order) {
            (Algorithm::Sequential, _) => &raster,
            (Algorithm::Permuted, PixelOrder::Permuted(_)) => order,
            (Algorithm::Permuted, PixelOrder::Raster) => &*permuted
                .get_or_insert_with(|| PixelOrder::for_algorithm(Algorithm::Permuted, width, height)),
        };

        let mut free = (0..MAGIC_BITS)
            .map(|i| bit_position(i, stale_bits, stale_order))
            .filter(|&(byte, bit)| written[byte] & (1 << bit) == 0);
        while matches!(probe(carrier, stale_bits, stale_algorithm, stale_order), Probe::Found(_)) {
            let Some((byte, bit)) = free.next() else {
                return Err(ConfigurationError::StaleHeader {
                    bits_per_channel: stale_bits,
                    algorithm: stale_algorithm,
                }
                .into());
            };
            carrier.as_raw_mut()[byte] ^= 1 << bit;
            debug!("cleared stale {stale_algorithm:?} header at {stale_bits} bits/channel");
        }
    }
    Ok(())
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("cipher", &self.cipher.as_ref().map(|c| c.name()))
            .field("ecc", &self.ecc.as_ref().map(|e| e.name()))
            .finish()
    }
}

/// [`Codec::encode`] with all backends.
pub fn encode(payload: &[u8], config: &EmbedConfig) -> Result<(CarrierImage, EncodeMetadata), StegoError> {
    Codec::new().encode(payload, config)
}

/// [`Codec::encode_into`] with all backends.
pub fn encode_into(
    payload: &[u8],
    carrier: CarrierImage,
    config: &EmbedConfig,
) -> Result<(CarrierImage, EncodeMetadata), StegoError> {
    Codec::new().encode_into(payload, carrier, config)
}

/// [`Codec::decode`] with all backends.
pub fn decode(carrier: &CarrierImage, config: &DecodeConfig) -> Result<(Vec<u8>, DecodeMetadata), StegoError> {
    Codec::new().decode(carrier, config)
}
