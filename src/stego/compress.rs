// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! zlib compression of the payload.

use std::io::{self, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::stego::error::{IntegrityError, StegoError};

/// Upper bound on decompressed output. A header cannot describe more than
/// 4 GiB of embedded data, but a tiny zlib stream can expand far beyond any
/// sensible payload.
pub const MAX_DECOMPRESSED_LEN: usize = 256 * 1024 * 1024;

/// Compress with zlib at the best compression level.
pub fn compress_zlib(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), Compression::best());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Compressed form of `data`, or `None` if compression does not make it
/// strictly smaller.
pub fn try_compress(data: &[u8]) -> Option<Vec<u8>> {
    compress_zlib(data).ok().filter(|c| c.len() < data.len())
}

/// Inflate a zlib stream, rejecting output longer than `limit` bytes.
pub fn decompress_zlib(data: &[u8], limit: usize) -> Result<Vec<u8>, StegoError> {
    let mut output = Vec::new();
    ZlibDecoder::new(data)
        .take(limit as u64 + 1)
        .read_to_end(&mut output)
        .map_err(|e| IntegrityError::Decompression(e.to_string()))?;
    if output.len() > limit {
        return Err(IntegrityError::Decompression(format!("output exceeds {limit} bytes")).into());
    }
    Ok(output)
}

/// [`decompress_zlib`] with [`MAX_DECOMPRESSED_LEN`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, StegoError> {
    decompress_zlib(data, MAX_DECOMPRESSED_LEN)
}
