/// Level reported for silent or empty input.
pub const SILENCE_FLOOR_LUFS: f64 = -80.0;

const EPSILON: f64 = 1e-12;

/// RMS level in dBFS, used as a stand-in for loudness.
///
/// This is not a gated BS.1770 measurement.
pub fn rms_loudness_lufs(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return SILENCE_FLOOR_LUFS;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum_squares / samples.len() as f64).sqrt();

    if rms <= 0.0 {
        return SILENCE_FLOOR_LUFS;
    }
    20.0 * (rms + EPSILON).log10()
}

/// Linear gain that moves `current_lufs` to `target_lufs`.
pub fn gain_for(current_lufs: f64, target_lufs: f64) -> f64 {
    10f64.powf((target_lufs - current_lufs) / 20.0)
}

/// Scale `samples` towards `target_lufs`, hard-clipping to [-1, 1].
pub fn match_loudness(samples: &[f32], target_lufs: f64) -> Vec<f32> {
    let gain = gain_for(rms_loudness_lufs(samples), target_lufs);
    samples
        .iter()
        .map(|&s| ((s as f64) * gain).clamp(-1.0, 1.0) as f32)
        .collect()
}
