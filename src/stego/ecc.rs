// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Reed-Solomon error correction over GF(2^8).
//!
//! Implements systematic RS(255, 255 - p) with the primitive polynomial 0x11D
//! (x^8+x^4+x^3+x^2+1), generator roots α^0..α^(p-1), and Berlekamp-Massey
//! decoding with Chien search and Forney. The parity count `p` is chosen per
//! payload (1..=254); each block corrects up to `p / 2` symbol errors.
//!
//! Long payloads are split into blocks of `255 - p` data bytes; the last
//! block is a shortened code. The coded length alone determines the block
//! layout, so the decoder only needs `p` from the header.

use std::sync::OnceLock;

use crate::stego::error::{ConfigurationError, IntegrityError, StegoError};

/// Primitive polynomial for GF(2^8): x^8 + x^4 + x^3 + x^2 + 1 = 0x11D.
const PRIM_POLY: u16 = 0x11D;

/// Maximum RS block size (symbols).
pub const N_MAX: usize = 255;

/// Largest parity count that still leaves one data symbol per block.
pub const MAX_PARITY: usize = N_MAX - 1;

/// Error-correction capability offered to the codec facade.
///
/// `parity` is the number of parity symbols per block, taken from the
/// embedding configuration on encode and from the header on decode.
pub trait ErrorCorrectionCodec: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Parity bytes added to a payload of `data_len` bytes.
    fn overhead(&self, data_len: usize, parity: usize) -> usize;

    /// Append parity symbols (systematic encoding).
    fn encode(&self, data: &[u8], parity: usize) -> Result<Vec<u8>, StegoError>;

    /// Correct and strip parity. Returns the data and the number of symbol
    /// errors that were corrected.
    fn decode(&self, coded: &[u8], parity: usize) -> Result<(Vec<u8>, usize), StegoError>;
}

/// Block Reed-Solomon backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReedSolomon;

impl ErrorCorrectionCodec for ReedSolomon {
    fn name(&self) -> &'static str {
        "reed-solomon"
    }

    fn overhead(&self, data_len: usize, parity: usize) -> usize {
        encoded_len(data_len, parity) - data_len
    }

    fn encode(&self, data: &[u8], parity: usize) -> Result<Vec<u8>, StegoError> {
        check_parity(parity)?;
        Ok(rs_encode_blocks(data, parity))
    }

    fn decode(&self, coded: &[u8], parity: usize) -> Result<(Vec<u8>, usize), StegoError> {
        check_parity(parity)?;
        let data_len = data_len_for(coded.len(), parity).ok_or(IntegrityError::MalformedHeader(
            "payload length inconsistent with ECC parity",
        ))?;
        rs_decode_blocks(coded, data_len, parity)
    }
}

fn check_parity(parity: usize) -> Result<(), StegoError> {
    if parity == 0 || parity > MAX_PARITY {
        return Err(ConfigurationError::InvalidEccSymbols(parity as u32).into());
    }
    Ok(())
}

// --- GF(2^8) Arithmetic ---

/// Precomputed log and exp tables for GF(2^8).
struct GfTables {
    exp: [u8; 512],
    log: [u8; 256],
}

fn build_gf_tables() -> GfTables {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];

    let mut x: u16 = 1;
    for i in 0..255u16 {
        exp[i as usize] = x as u8;
        exp[(i + 255) as usize] = x as u8; // wrap-around for easy modular access
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIM_POLY;
        }
    }
    exp[510] = exp[0];
    exp[511] = exp[1];

    GfTables { exp, log }
}

fn gf_tables() -> &'static GfTables {
    static TABLES: OnceLock<GfTables> = OnceLock::new();
    TABLES.get_or_init(build_gf_tables)
}

fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = gf_tables();
    t.exp[t.log[a as usize] as usize + t.log[b as usize] as usize]
}

/// Multiplicative inverse. Callers never pass 0.
fn gf_inv(a: u8) -> u8 {
    debug_assert_ne!(a, 0, "cannot invert zero in GF(2^8)");
    let t = gf_tables();
    t.exp[255 - t.log[a as usize] as usize]
}

/// Evaluate polynomial at x. poly[0] is the highest-degree coefficient.
fn poly_eval(poly: &[u8], x: u8) -> u8 {
    poly.iter().fold(0u8, |acc, &c| gf_mul(acc, x) ^ c)
}

/// Evaluate polynomial in ascending power format at x.
fn eval_asc(poly: &[u8], x: u8) -> u8 {
    let mut result = 0u8;
    let mut x_pow = 1u8;
    for &coeff in poly {
        result ^= gf_mul(coeff, x_pow);
        x_pow = gf_mul(x_pow, x);
    }
    result
}

fn poly_mul(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut result = vec![0u8; a.len() + b.len() - 1];
    for (i, &ac) in a.iter().enumerate() {
        for (j, &bc) in b.iter().enumerate() {
            result[i + j] ^= gf_mul(ac, bc);
        }
    }
    result
}

/// g(x) = prod_{i=0}^{p-1} (x - alpha^i), highest degree first.
fn build_gen_poly(parity: usize) -> Vec<u8> {
    let t = gf_tables();
    let mut gpoly = vec![1u8];
    for i in 0..parity {
        gpoly = poly_mul(&gpoly, &[1, t.exp[i]]);
    }
    gpoly
}

// --- Encoding ---

/// Systematic encoding of one block: `data || remainder(data * x^p / g(x))`.
fn rs_encode_block(data: &[u8], gpoly: &[u8], parity: usize) -> Vec<u8> {
    debug_assert!(data.len() + parity <= N_MAX);
    let mut shift_reg = vec![0u8; parity];

    for &byte in data {
        let feedback = byte ^ shift_reg[0];
        for j in 0..parity - 1 {
            shift_reg[j] = shift_reg[j + 1] ^ gf_mul(feedback, gpoly[j + 1]);
        }
        shift_reg[parity - 1] = gf_mul(feedback, gpoly[parity]);
    }

    let mut encoded = Vec::with_capacity(data.len() + parity);
    encoded.extend_from_slice(data);
    encoded.extend_from_slice(&shift_reg);
    encoded
}

/// RS-encode an arbitrarily long payload, splitting into `255 - parity` byte blocks.
pub fn rs_encode_blocks(payload: &[u8], parity: usize) -> Vec<u8> {
    let gpoly = build_gen_poly(parity);
    let mut encoded = Vec::with_capacity(encoded_len(payload.len(), parity));
    for chunk in payload.chunks(N_MAX - parity) {
        encoded.extend_from_slice(&rs_encode_block(chunk, &gpoly, parity));
    }
    encoded
}

// --- Decoding ---

/// Berlekamp-Massey. Returns sigma(x) in ascending power: sigma[0] = 1.
fn berlekamp_massey(syndromes: &[u8]) -> Vec<u8> {
    let n = syndromes.len();

    let mut c = vec![0u8; n + 1];
    c[0] = 1;
    let mut c_len = 1usize;

    let mut b = vec![0u8; n + 1];
    b[0] = 1;
    let mut b_len = 1usize;

    let mut ell = 0usize;
    let mut bval = 1u8;
    let mut m = 1usize;

    for r in 0..n {
        let mut delta = syndromes[r];
        for i in 1..c_len {
            delta ^= gf_mul(c[i], syndromes[r - i]);
        }

        if delta == 0 {
            m += 1;
            continue;
        }

        let factor = gf_mul(delta, gf_inv(bval));
        let new_len = (b_len + m).max(c_len).min(n + 1);

        if 2 * ell <= r {
            let old_c = c.clone();
            let old_c_len = c_len;

            c_len = new_len;
            for j in 0..b_len {
                if j + m <= n {
                    c[j + m] ^= gf_mul(factor, b[j]);
                }
            }

            b[..old_c_len].copy_from_slice(&old_c[..old_c_len]);
            b[old_c_len..].fill(0);
            b_len = old_c_len;
            ell = r + 1 - ell;
            bval = delta;
            m = 1;
        } else {
            c_len = new_len;
            for j in 0..b_len {
                if j + m <= n {
                    c[j + m] ^= gf_mul(factor, b[j]);
                }
            }
            m += 1;
        }
    }

    // Cancellation can leave zero high-order coefficients.
    while c_len > 1 && c[c_len - 1] == 0 {
        c_len -= 1;
    }
    c.truncate(c_len);
    c
}

/// Chien search over a full 255-symbol block.
///
/// An error at array index k affects the coefficient of x^{n-1-k}; sigma has
/// roots at α^{-p} for GF position p. Returns `(gf_pos, array_pos)` pairs, or
/// `None` if the root count disagrees with the locator degree.
fn chien_search(sigma_asc: &[u8]) -> Option<Vec<(usize, usize)>> {
    let tab = gf_tables();
    let num_errors = sigma_asc.len() - 1;
    let mut found = Vec::with_capacity(num_errors);

    for p in 0..N_MAX {
        let x = tab.exp[(255 - (p % 255)) % 255]; // α^{-p}
        if eval_asc(sigma_asc, x) == 0 {
            found.push((p, N_MAX - 1 - p));
        }
    }

    (found.len() == num_errors).then_some(found)
}

/// Forney with FCR=0: e_l = X_l * Omega(X_l^{-1}) / Sigma'(X_l^{-1}).
fn forney(sigma_asc: &[u8], syndromes: &[u8], found: &[(usize, usize)]) -> Vec<u8> {
    let tab = gf_tables();
    let two_t = syndromes.len();

    // Omega(x) = S(x) * Sigma(x) mod x^{2t}
    let mut omega = vec![0u8; two_t];
    for (i, &s) in sigma_asc.iter().enumerate().take(two_t) {
        for j in 0..two_t - i {
            omega[i + j] ^= gf_mul(s, syndromes[j]);
        }
    }

    // Formal derivative: even powers vanish in characteristic 2.
    let mut sigma_prime = vec![0u8; sigma_asc.len().saturating_sub(1)];
    for i in (1..sigma_asc.len()).step_by(2) {
        sigma_prime[i - 1] = sigma_asc[i];
    }

    found
        .iter()
        .map(|&(gf_pos, _)| {
            let x_val = tab.exp[gf_pos % 255];
            let x_inv = tab.exp[(255 - (gf_pos % 255)) % 255];
            let sp_val = eval_asc(&sigma_prime, x_inv);
            if sp_val == 0 {
                return 0;
            }
            gf_mul(x_val, gf_mul(eval_asc(&omega, x_inv), gf_inv(sp_val)))
        })
        .collect()
}

fn syndromes(full_block: &[u8], parity: usize) -> Vec<u8> {
    let tab = gf_tables();
    (0..parity).map(|i| poly_eval(full_block, tab.exp[i])).collect()
}

/// Decode one (possibly shortened) block. `None` means uncorrectable.
fn rs_decode_block(received: &[u8], data_len: usize, parity: usize) -> Option<(Vec<u8>, usize)> {
    let block_len = data_len + parity;
    debug_assert_eq!(received.len(), block_len);

    // Shortened codes are zero-padded at the front to a full block.
    let padding = N_MAX - block_len;
    let mut full_block = vec![0u8; N_MAX];
    full_block[padding..].copy_from_slice(received);

    let synd = syndromes(&full_block, parity);
    if synd.iter().all(|&s| s == 0) {
        return Some((received[..data_len].to_vec(), 0));
    }

    let sigma_asc = berlekamp_massey(&synd);
    let num_errors = sigma_asc.len() - 1;
    if num_errors == 0 || num_errors > parity / 2 {
        return None;
    }

    let found = chien_search(&sigma_asc)?;
    let magnitudes = forney(&sigma_asc, &synd, &found);

    let mut corrected = full_block;
    for (&(_, array_pos), &mag) in found.iter().zip(&magnitudes) {
        if array_pos < padding {
            // Error located in the virtual zero padding.
            return None;
        }
        corrected[array_pos] ^= mag;
    }

    if syndromes(&corrected, parity).iter().any(|&s| s != 0) {
        return None;
    }

    Some((corrected[padding..padding + data_len].to_vec(), num_errors))
}

/// Decode a payload produced by [`rs_encode_blocks`] whose original length is
/// `total_data_len`. Returns the data and the total symbols corrected.
pub fn rs_decode_blocks(
    encoded: &[u8],
    total_data_len: usize,
    parity: usize,
) -> Result<(Vec<u8>, usize), StegoError> {
    let k_max = N_MAX - parity;
    let mut decoded = Vec::with_capacity(total_data_len);
    let mut remaining = total_data_len;
    let mut offset = 0;
    let mut corrected = 0;
    let mut block = 0;

    while remaining > 0 {
        let chunk_len = remaining.min(k_max);
        let block_len = chunk_len + parity;
        let received = encoded
            .get(offset..offset + block_len)
            .ok_or(IntegrityError::Uncorrectable { block })?;

        let (data, errors) =
            rs_decode_block(received, chunk_len, parity).ok_or(IntegrityError::Uncorrectable { block })?;
        decoded.extend_from_slice(&data);
        corrected += errors;

        offset += block_len;
        remaining -= chunk_len;
        block += 1;
    }

    Ok((decoded, corrected))
}

// --- Length arithmetic ---

/// Coded length for `data_len` bytes at `parity` symbols per block.
pub fn encoded_len(data_len: usize, parity: usize) -> usize {
    if parity == 0 {
        return data_len;
    }
    let k_max = N_MAX - parity;
    let full_blocks = data_len / k_max;
    let remainder = data_len % k_max;
    let mut total = full_blocks * N_MAX;
    if remainder > 0 {
        total += remainder + parity;
    }
    total
}

/// Original data length for a coded length, or `None` if no data length
/// encodes to exactly `coded_len`.
pub fn data_len_for(coded_len: usize, parity: usize) -> Option<usize> {
    if parity == 0 {
        return Some(coded_len);
    }
    let full_blocks = coded_len / N_MAX;
    let remainder = coded_len % N_MAX;
    let tail = match remainder {
        0 => 0,
        r if r > parity => r - parity,
        _ => return None,
    };
    Some(full_blocks * (N_MAX - parity) + tail)
}

/// Largest data length whose coded length fits in `budget` bytes.
pub fn max_data_len(budget: usize, parity: usize) -> usize {
    if parity == 0 {
        return budget;
    }
    let full_blocks = budget / N_MAX;
    let remainder = budget % N_MAX;
    full_blocks * (N_MAX - parity) + remainder.saturating_sub(parity)
}
