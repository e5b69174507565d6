// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Password-based payload encryption.
//!
//! Ciphertext layout:
//!
//! ```text
//! [16 bytes] salt   random, Argon2id salt
//! [16 bytes] IV     random, AES-CBC initialisation vector
//! [N bytes ] AES-256-CBC ciphertext with PKCS#7 padding
//! ```
//!
//! The key is Argon2id(password, salt) with m = 19456 KiB, t = 2, p = 1.
//! CBC without a MAC gives confidentiality only; a wrong password is
//! normally caught by the padding check, but roughly 1 in 256 wrong keys
//! unpad cleanly and yield garbage.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::stego::error::{ConfigurationError, IntegrityError, StegoError};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Argon2 salt length in bytes.
pub const SALT_LEN: usize = 16;
/// AES-CBC IV length in bytes.
pub const IV_LEN: usize = 16;
/// AES block size.
pub const BLOCK_LEN: usize = 16;
/// Derived key length (AES-256).
pub const KEY_LEN: usize = 32;

const ARGON2_M_COST: u32 = 19_456;
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;

/// Encryption capability offered to the codec facade.
pub trait CipherCodec: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    fn encrypt(&self, plaintext: &[u8], password: &str) -> Result<Vec<u8>, StegoError>;

    /// # Errors
    /// [`IntegrityError::DecryptionFailed`] when the ciphertext is malformed or
    /// the password is wrong.
    fn decrypt(&self, ciphertext: &[u8], password: &str) -> Result<Vec<u8>, StegoError>;
}

/// Argon2id + AES-256-CBC backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesCbcCipher;

/// Derive the AES-256 key from password + salt.
pub fn derive_key(password: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, StegoError> {
    // Explicit parameters so a change of crate defaults cannot break old images.
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(KEY_LEN))
        .map_err(|e| ConfigurationError::KeyDerivation(e.to_string()))?;
    let argon2id = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2id
        .hash_password_into(password.as_bytes(), salt, &mut *key)
        .map_err(|e| ConfigurationError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

impl AesCbcCipher {
    /// Encrypt with caller-provided salt and IV.
    pub fn encrypt_with(
        &self,
        plaintext: &[u8],
        password: &str,
        salt: &[u8; SALT_LEN],
        iv: &[u8; IV_LEN],
    ) -> Result<Vec<u8>, StegoError> {
        let key = derive_key(password, salt)?;
        let cipher = Aes256CbcEnc::new_from_slices(&*key, iv)
            .map_err(|e| ConfigurationError::KeyDerivation(e.to_string()))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut out = Vec::with_capacity(SALT_LEN + IV_LEN + ciphertext.len());
        out.extend_from_slice(salt);
        out.extend_from_slice(iv);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }
}

impl CipherCodec for AesCbcCipher {
    fn name(&self) -> &'static str {
        "aes-256-cbc"
    }

    fn encrypt(&self, plaintext: &[u8], password: &str) -> Result<Vec<u8>, StegoError> {
        let mut rng = rand::thread_rng();
        let mut salt = [0u8; SALT_LEN];
        rng.fill_bytes(&mut salt);
        let mut iv = [0u8; IV_LEN];
        rng.fill_bytes(&mut iv);
        self.encrypt_with(plaintext, password, &salt, &iv)
    }

    fn decrypt(&self, ciphertext: &[u8], password: &str) -> Result<Vec<u8>, StegoError> {
        let prefix = SALT_LEN + IV_LEN;
        if ciphertext.len() < prefix + BLOCK_LEN || (ciphertext.len() - prefix) % BLOCK_LEN != 0 {
            return Err(IntegrityError::DecryptionFailed.into());
        }
        let (salt, rest) = ciphertext.split_at(SALT_LEN);
        let (iv, body) = rest.split_at(IV_LEN);

        let key = derive_key(password, salt)?;
        let cipher = Aes256CbcDec::new_from_slices(&*key, iv)
            .map_err(|e| ConfigurationError::KeyDerivation(e.to_string()))?;
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(body)
            .map_err(|_| IntegrityError::DecryptionFailed.into())
    }
}
