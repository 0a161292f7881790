use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::error::{ChunkcastError, Result};

use super::resample::resample_mono;
use super::AudioMetadata;

/// Load an audio file as mono `f32` samples at `target_sample_rate`.
///
/// Multi-channel input keeps the first channel. Input at a different rate is
/// resampled.
pub fn load_audio(path: &Path, target_sample_rate: u32) -> Result<Vec<f32>> {
    if !path.exists() {
        return Err(ChunkcastError::FileNotFound(path.display().to_string()));
    }

    let (samples, metadata) = read_first_channel(path)?;
    debug!(
        "Loaded {}: {} Hz, {} channels, {} frames",
        path.display(),
        metadata.sample_rate,
        metadata.channels,
        samples.len()
    );

    if metadata.sample_rate == target_sample_rate {
        return Ok(samples);
    }

    resample_mono(&samples, metadata.sample_rate, target_sample_rate)
}

/// Read basic metadata without decoding samples.
pub fn read_metadata(path: &Path) -> Result<AudioMetadata> {
    if !path.exists() {
        return Err(ChunkcastError::FileNotFound(path.display().to_string()));
    }
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    Ok(AudioMetadata {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        frames: reader.duration() as usize,
    })
}

fn read_first_channel(path: &Path) -> Result<(Vec<f32>, AudioMetadata)> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<f32>, _>>()?
        }
    };

    let samples: Vec<f32> = interleaved.into_iter().step_by(channels).collect();
    let metadata = AudioMetadata {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        frames: samples.len(),
    };
    Ok((samples, metadata))
}

/// Write mono samples as 16-bit PCM, creating parent directories.
pub fn write_audio(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(to_i16(sample))?;
    }
    writer.finalize()?;

    debug!("Wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Duration of `sample_count` samples in whole milliseconds (rounded).
pub fn calculate_duration_ms(sample_count: usize, sample_rate: u32) -> u64 {
    if sample_count == 0 || sample_rate == 0 {
        return 0;
    }
    (sample_count as f64 * 1000.0 / sample_rate as f64).round() as u64
}

/// Number of samples covering `duration_ms` (rounded).
pub fn samples_for_duration(duration_ms: u64, sample_rate: u32) -> usize {
    (duration_ms as f64 * sample_rate as f64 / 1000.0).round() as usize
}
