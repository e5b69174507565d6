// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Independent encode/decode jobs, run on rayon worker threads when the
//! `parallel` feature is enabled. Results keep the input order.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::stego::carrier::CarrierImage;
use crate::stego::config::{DecodeConfig, EmbedConfig};
use crate::stego::error::StegoError;
use crate::stego::pipeline::{Codec, DecodeMetadata, EncodeMetadata};

/// One payload to embed.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub payload: Vec<u8>,
    pub config: EmbedConfig,
    /// Embed into this image instead of a generated one.
    pub carrier: Option<CarrierImage>,
}

impl BatchJob {
    pub fn new(payload: impl Into<Vec<u8>>, config: EmbedConfig) -> Self {
        Self { payload: payload.into(), config, carrier: None }
    }

    pub fn with_carrier(mut self, carrier: CarrierImage) -> Self {
        self.carrier = Some(carrier);
        self
    }
}

pub type EncodeResult = Result<(CarrierImage, EncodeMetadata), StegoError>;
pub type DecodeResult = Result<(Vec<u8>, DecodeMetadata), StegoError>;

fn run_job(codec: &Codec, job: &BatchJob) -> EncodeResult {
    match &job.carrier {
        Some(carrier) => codec.encode_into(&job.payload, carrier.clone(), &job.config),
        None => codec.encode(&job.payload, &job.config),
    }
}

/// Encode every job. A failing job does not affect the others.
pub fn encode_batch(codec: &Codec, jobs: &[BatchJob]) -> Vec<EncodeResult> {
    #[cfg(feature = "parallel")]
    let results = jobs.par_iter().map(|job| run_job(codec, job)).collect();
    #[cfg(not(feature = "parallel"))]
    let results = jobs.iter().map(|job| run_job(codec, job)).collect();

    results
}

/// Decode every carrier with the same configuration.
pub fn decode_batch(codec: &Codec, carriers: &[CarrierImage], config: &DecodeConfig) -> Vec<DecodeResult> {
    #[cfg(feature = "parallel")]
    let results = carriers.par_iter().map(|c| codec.decode(c, config)).collect();
    #[cfg(not(feature = "parallel"))]
    let results = carriers.iter().map(|c| codec.decode(c, config)).collect();

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_and_isolation() {
        let codec = Codec::new();
        let jobs = vec![
            BatchJob::new(b"first".to_vec(), EmbedConfig::new(30, 30)),
            BatchJob::new(vec![0xAB; 5000], EmbedConfig::new(10, 10).with_compression(false)),
            BatchJob::new(b"third".to_vec(), EmbedConfig::new(30, 30).with_bits_per_channel(1)),
        ];
        let results = encode_batch(&codec, &jobs);
        assert_eq!(results.len(), 3);
        assert!(matches!(results[1], Err(StegoError::InsufficientCapacity { .. })));

        let carriers: Vec<CarrierImage> = results
            .into_iter()
            .filter_map(Result::ok)
            .map(|(img, _)| img)
            .collect();
        let decoded = decode_batch(&codec, &carriers, &DecodeConfig::new());
        assert_eq!(decoded[0].as_ref().unwrap().0, b"first");
        assert_eq!(decoded[1].as_ref().unwrap().0, b"third");
        assert_eq!(decoded[1].as_ref().unwrap().1.bits_per_channel, 1);
    }

    #[test]
    fn job_with_carrier() {
        let carrier = CarrierImage::new(20, 20).unwrap();
        let job = BatchJob::new(b"in place".to_vec(), EmbedConfig::new(20, 20)).with_carrier(carrier);
        let results = encode_batch(&Codec::plain(), &[job]);
        let (img, _) = results.into_iter().next().unwrap().unwrap();
        // The last pixel of a black carrier is never reached by a short payload.
        assert_eq!(img.pixel(19, 19), Some([0, 0, 0]));
    }

    #[test]
    fn empty_batch() {
        assert!(encode_batch(&Codec::plain(), &[]).is_empty());
    }
}
