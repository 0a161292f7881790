use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::project::ProjectSettings;

use super::{Renderer, TtsOptions};

/// Deterministic stand-in for the neural renderer.
///
/// Output length scales with word count and the waveform depends only on the
/// seed, so tests can reason about durations without a model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticRenderer;

impl SyntheticRenderer {
    /// Seconds of audio produced for `text`.
    pub fn duration_secs(text: &str) -> f64 {
        let words = text.split_whitespace().count().max(1);
        (0.28 * words as f64).clamp(0.35, 6.0)
    }

    pub fn sample_count(text: &str, sample_rate: u32) -> usize {
        let samples = (Self::duration_secs(text) * sample_rate as f64).round() as usize;
        samples.max(sample_rate as usize / 4)
    }
}

impl Renderer for SyntheticRenderer {
    fn render(
        &self,
        text: &str,
        seed: u64,
        _options: &TtsOptions,
        settings: &ProjectSettings,
    ) -> Result<Vec<f32>> {
        let sample_rate = settings.sample_rate as f64;
        let count = Self::sample_count(text, settings.sample_rate);
        let base_freq = 180.0 + (seed % 7) as f64 * 15.0;
        let mut rng = StdRng::seed_from_u64(seed);

        let samples = (0..count)
            .map(|i| {
                let t = i as f64 / sample_rate;
                let tone = 0.18 * (2.0 * PI * base_freq * t).sin()
                    + 0.08 * (2.0 * PI * base_freq * 0.5 * t).sin();
                let noise = 0.05 * gaussian(&mut rng);
                (tone + noise) as f32
            })
            .collect();

        Ok(samples)
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

/// Standard normal sample via Box-Muller.
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
