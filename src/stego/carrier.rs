// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! RGB carrier image.
//!
//! Pixels are stored row-major with interleaved channels:
//! `data[(y * width + x) * 3 + c]`, c = 0 (R), 1 (G), 2 (B).
//!
//! The payload lives in low-order bits, so a carrier must only ever be stored
//! losslessly (PNG, BMP, raw). JPEG or any resampling destroys it.

use std::fmt;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::stego::error::{ConfigurationError, IntegrityError, StegoError};
use crate::stego::validate_dimensions;

/// Channels per pixel.
pub const CHANNELS: usize = 3;

/// Seed of the noise stream used for synthetic carriers.
const FILLER_SEED: u64 = 0x5354_4C42;

/// Maximum filler noise amplitude, applied symmetrically.
const FILLER_NOISE: i16 = 20;

/// Owned RGB pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct CarrierImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CarrierImage {
    /// All-black carrier.
    pub fn new(width: u32, height: u32) -> Result<Self, StegoError> {
        validate_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * CHANNELS],
        })
    }

    /// Synthetic carrier with a smooth gradient plus deterministic noise.
    ///
    /// Each channel is `clamp(120 + (x * y mod 40) + noise)` with noise in
    /// `[-20, 20]`. The same size always produces the same pixels.
    pub fn filler(width: u32, height: u32) -> Result<Self, StegoError> {
        validate_dimensions(width, height)?;

        let mut key = [0u8; 32];
        key[..8].copy_from_slice(&FILLER_SEED.to_le_bytes());
        let mut rng = ChaCha20Rng::from_seed(key);

        let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                let base = 120 + ((x as u64 * y as u64) % 40) as i16;
                for _ in 0..CHANNELS {
                    let noise = rng.gen_range(-FILLER_NOISE..=FILLER_NOISE);
                    data.push((base + noise).clamp(0, 255) as u8);
                }
            }
        }

        Ok(Self { width, height, data })
    }

    /// Wrap an interleaved RGB buffer.
    ///
    /// # Errors
    /// [`ConfigurationError::BufferLength`] unless `data.len() == width * height * 3`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, StegoError> {
        validate_dimensions(width, height)?;
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(ConfigurationError::BufferLength { expected, actual: data.len() }.into());
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn total_pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Interleaved RGB bytes.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// RGB value at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Convert any decoded image to RGB8, dropping alpha.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self, StegoError> {
        Self::from_rgb_image(image.to_rgb8())
    }

    pub fn from_rgb_image(image: RgbImage) -> Result<Self, StegoError> {
        let (width, height) = image.dimensions();
        Self::from_raw(width, height, image.into_raw())
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
            Rgb([self.data[i], self.data[i + 1], self.data[i + 2]])
        })
    }

    /// Decode a PNG file held in memory.
    pub fn from_png_bytes(bytes: &[u8]) -> Result<Self, StegoError> {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|e| IntegrityError::ImageCodec(e.to_string()))?;
        Self::from_dynamic(&image)
    }

    /// Encode as PNG (lossless).
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, StegoError> {
        let mut bytes = Vec::new();
        self.to_rgb_image()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| IntegrityError::ImageCodec(e.to_string()))?;
        Ok(bytes)
    }
}

impl fmt::Debug for CarrierImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarrierImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl TryFrom<RgbImage> for CarrierImage {
    type Error = StegoError;

    fn try_from(image: RgbImage) -> Result<Self, Self::Error> {
        Self::from_rgb_image(image)
    }
}

impl From<&CarrierImage> for RgbImage {
    fn from(carrier: &CarrierImage) -> Self {
        carrier.to_rgb_image()
    }
}
