// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payload transforms between caller bytes and embedded bytes.
//!
//! Encode: encrypt (password) -> compress (if smaller) -> SHA-256 -> RS parity.
//! Decode: RS correct -> SHA-256 verify -> decompress -> decrypt.
//!
//! The digest is taken before parity is appended, so a corrected payload is
//! verified against exactly what the encoder hashed, and any corruption RS
//! could not repair still surfaces as a checksum mismatch.

use log::{debug, trace};
use sha2::{Digest, Sha256};

use crate::stego::compress;
use crate::stego::crypto::CipherCodec;
use crate::stego::ecc::ErrorCorrectionCodec;
use crate::stego::error::{ConfigurationError, IntegrityError, StegoError};
use crate::stego::header::{Header, HeaderFlags};

/// Which transforms to apply on encode.
#[derive(Clone, Copy, Default)]
pub struct TransformOptions<'a> {
    pub password: Option<&'a str>,
    pub compress: bool,
    /// RS parity symbols per block, 1..=254.
    pub ecc_symbols: Option<u8>,
}

/// Output of [`prepare`]: the bytes to embed plus what the header records.
#[derive(Debug, Clone)]
pub struct PreparedPayload {
    /// Bytes following the header in the image.
    pub embedded: Vec<u8>,
    /// Digest of the payload before ECC parity.
    pub sha256: [u8; 32],
    pub flags: HeaderFlags,
    pub ecc_symbols: u8,
    /// Parity bytes included in `embedded`.
    pub ecc_overhead: usize,
}

/// Output of [`recover`].
#[derive(Debug, Clone)]
pub struct RecoveredPayload {
    pub data: Vec<u8>,
    /// RS symbol errors corrected across all blocks.
    pub corrected_symbols: usize,
}

/// SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Reject options whose backend is missing, before any work is done.
pub fn check_encode_backends(
    options: &TransformOptions<'_>,
    cipher: Option<&dyn CipherCodec>,
    ecc: Option<&dyn ErrorCorrectionCodec>,
) -> Result<(), StegoError> {
    if options.password.is_some() && cipher.is_none() {
        return Err(ConfigurationError::CipherUnavailable.into());
    }
    if options.ecc_symbols.is_some() && ecc.is_none() {
        return Err(ConfigurationError::EccUnavailable.into());
    }
    Ok(())
}

/// Reject a header whose transforms cannot be undone with what is available.
pub fn check_decode_backends(
    header: &Header,
    password: Option<&str>,
    cipher: Option<&dyn CipherCodec>,
    ecc: Option<&dyn ErrorCorrectionCodec>,
) -> Result<(), StegoError> {
    if header.flags.encrypted {
        if cipher.is_none() {
            return Err(ConfigurationError::CipherUnavailable.into());
        }
        if password.is_none() {
            return Err(ConfigurationError::PasswordRequired.into());
        }
    }
    if header.flags.error_correction && ecc.is_none() {
        return Err(ConfigurationError::EccUnavailable.into());
    }
    Ok(())
}

/// Apply the encode-side transforms to `payload`.
pub fn prepare(
    payload: &[u8],
    options: &TransformOptions<'_>,
    cipher: Option<&dyn CipherCodec>,
    ecc: Option<&dyn ErrorCorrectionCodec>,
) -> Result<PreparedPayload, StegoError> {
    check_encode_backends(options, cipher, ecc)?;

    let mut flags = HeaderFlags::default();
    let mut data = payload.to_vec();

    if let (Some(password), Some(cipher)) = (options.password, cipher) {
        data = cipher.encrypt(&data, password)?;
        flags.encrypted = true;
        debug!("encrypted payload with {}: {} -> {} bytes", cipher.name(), payload.len(), data.len());
    }

    if options.compress {
        match compress::try_compress(&data) {
            Some(packed) => {
                debug!("compressed payload {} -> {} bytes", data.len(), packed.len());
                data = packed;
                flags.compressed = true;
            }
            None => trace!("compression did not shrink {} bytes; stored raw", data.len()),
        }
    }

    let digest = sha256(&data);
    let data_len = data.len();

    let (embedded, ecc_symbols) = match (options.ecc_symbols, ecc) {
        (Some(parity), Some(ecc)) => {
            let coded = ecc.encode(&data, parity as usize)?;
            debug!("{} parity {parity}: {} -> {} bytes", ecc.name(), data.len(), coded.len());
            flags.error_correction = true;
            (coded, parity)
        }
        _ => (data, 0),
    };
    let ecc_overhead = embedded.len() - data_len;

    Ok(PreparedPayload { embedded, sha256: digest, flags, ecc_symbols, ecc_overhead })
}

/// Undo the transforms recorded in `header`.
///
/// # Errors
/// - [`ConfigurationError`] when a needed backend or the password is missing.
/// - [`IntegrityError::Uncorrectable`] / [`IntegrityError::ChecksumMismatch`]
///   for corruption, checked before decompression or decryption run.
/// - [`IntegrityError::Decompression`] / [`IntegrityError::DecryptionFailed`].
pub fn recover(
    embedded: &[u8],
    header: &Header,
    password: Option<&str>,
    cipher: Option<&dyn CipherCodec>,
    ecc: Option<&dyn ErrorCorrectionCodec>,
) -> Result<RecoveredPayload, StegoError> {
    check_decode_backends(header, password, cipher, ecc)?;

    let (mut data, corrected_symbols) = match ecc {
        Some(ecc) if header.flags.error_correction => {
            let (data, corrected) = ecc.decode(embedded, header.ecc_symbols as usize)?;
            if corrected > 0 {
                debug!("{} corrected {corrected} symbol errors", ecc.name());
            }
            (data, corrected)
        }
        _ => (embedded.to_vec(), 0),
    };

    let actual = sha256(&data);
    if actual != header.sha256 {
        return Err(IntegrityError::ChecksumMismatch { expected: header.sha256, actual }.into());
    }
    trace!("SHA-256 verified over {} bytes", data.len());

    if header.flags.compressed {
        data = compress::decompress(&data)?;
    }

    if let (true, Some(cipher), Some(password)) = (header.flags.encrypted, cipher, password) {
        data = cipher.decrypt(&data, password)?;
    }

    Ok(RecoveredPayload { data, corrected_symbols })
}
