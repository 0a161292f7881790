use std::f32::consts::PI;

use tracing::debug;

use super::io::{calculate_duration_ms, samples_for_duration};

const MAX_FRAME: usize = 1024;

/// WSOLA (waveform-similarity overlap-add) time stretch.
///
/// `rate > 1` shortens the signal, `rate < 1` lengthens it; the output holds
/// `len / rate` samples. Frames are laid down every half frame; each one is
/// read near its nominal position at the offset whose start best matches the
/// natural continuation of the previous frame, so periodic material overlaps
/// in phase and keeps its level and pitch.
pub fn time_stretch(samples: &[f32], rate: f64) -> Vec<f32> {
    if samples.is_empty() || rate <= 0.0 || (rate - 1.0).abs() < f64::EPSILON {
        return samples.to_vec();
    }

    let frame = MAX_FRAME.min(samples.len());
    let hop = (frame / 2).max(1);
    let overlap = frame - hop;
    let tolerance = hop / 2;
    let analysis_hop = hop as f64 * rate;
    let out_len = (samples.len() as f64 / rate).round() as usize;
    if out_len == 0 {
        return Vec::new();
    }

    // Reads never run past the input, so every frame is full length.
    let last_start = samples.len() - frame;
    let window = hann(frame);
    let mut output = vec![0.0f32; out_len + frame];
    let mut norm = vec![0.0f32; out_len + frame];

    let mut previous = 0;
    for k in 0..=out_len / hop {
        let nominal = ((k as f64 * analysis_hop).round() as usize).min(last_start);
        let read = if k == 0 {
            0
        } else {
            best_alignment(samples, previous + hop, nominal, tolerance, overlap, last_start)
        };

        let write = k * hop;
        for i in 0..frame {
            output[write + i] += samples[read + i] * window[i];
            norm[write + i] += window[i];
        }
        previous = read;
    }

    output.truncate(out_len);
    for (sample, weight) in output.iter_mut().zip(&norm) {
        if *weight > 0.0 {
            *sample /= weight;
        }
    }
    output
}

/// Start offset within `nominal ± tolerance` whose first `overlap` samples
/// correlate best with the samples at `natural`. Ties keep `nominal`.
fn best_alignment(
    samples: &[f32],
    natural: usize,
    nominal: usize,
    tolerance: usize,
    overlap: usize,
    last_start: usize,
) -> usize {
    if overlap == 0 {
        return nominal;
    }

    let template: Vec<f32> = (0..overlap)
        .map(|i| samples.get(natural + i).copied().unwrap_or(0.0))
        .collect();
    let score = |start: usize| -> f32 {
        template
            .iter()
            .zip(&samples[start..start + overlap])
            .map(|(a, b)| a * b)
            .sum()
    };

    let mut best = nominal;
    let mut best_score = score(nominal);
    for candidate in nominal.saturating_sub(tolerance)..=(nominal + tolerance).min(last_start) {
        let candidate_score = score(candidate);
        if candidate_score > best_score {
            best = candidate;
            best_score = candidate_score;
        }
    }
    best
}

/// Stretch `samples` so they last exactly `target_duration_ms`.
///
/// After stretching, the result is truncated or zero-padded to the exact
/// target sample count. A zero target or empty input is returned unchanged.
pub fn time_stretch_to_duration(
    samples: &[f32],
    sample_rate: u32,
    target_duration_ms: u64,
) -> Vec<f32> {
    if target_duration_ms == 0 || samples.is_empty() {
        return samples.to_vec();
    }

    let desired = samples_for_duration(target_duration_ms, sample_rate).max(1);
    let rate = samples.len() as f64 / desired as f64;
    debug!(
        "Stretching {}ms to {}ms (rate {:.3})",
        calculate_duration_ms(samples.len(), sample_rate),
        target_duration_ms,
        rate
    );

    let mut stretched = time_stretch(samples, rate);
    stretched.resize(desired, 0.0);
    stretched
}

fn hann(len: usize) -> Vec<f32> {
    if len == 1 {
        return vec![1.0];
    }
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / len as f32).cos())
        .collect()
}
