use std::f32::consts::FRAC_PI_2;

/// Number of samples spanned by `crossfade_ms` at `sample_rate`.
pub fn crossfade_samples(sample_rate: u32, crossfade_ms: u64) -> usize {
    (sample_rate as f64 * crossfade_ms as f64 / 1000.0).round() as usize
}

/// Equal-power fade curves over `len` points: `(fade_out, fade_in)`.
///
/// `theta` runs over `[0, pi/2)`; `fade_out = cos^2`, `fade_in = sin^2`, so
/// the two gains sum to one at every sample.
pub fn equal_power_curves(len: usize) -> (Vec<f32>, Vec<f32>) {
    let step = if len == 0 { 0.0 } else { FRAC_PI_2 / len as f32 };
    (0..len)
        .map(|i| {
            let theta = i as f32 * step;
            (theta.cos().powi(2), theta.sin().powi(2))
        })
        .unzip()
}

/// Join two signals, overlapping the tail of `first` with the head of
/// `second` by up to `crossfade_samples`.
pub fn cosine_crossfade(first: &[f32], second: &[f32], crossfade_samples: usize) -> Vec<f32> {
    let mut result = Vec::with_capacity(first.len() + second.len());
    result.extend_from_slice(first);
    crossfade_into(&mut result, second, crossfade_samples);
    result
}

/// In-place variant of [`cosine_crossfade`] that appends to `acc`.
fn crossfade_into(acc: &mut Vec<f32>, next: &[f32], crossfade_samples: usize) {
    let overlap = crossfade_samples.min(acc.len()).min(next.len());
    if overlap == 0 {
        acc.extend_from_slice(next);
        return;
    }

    let (fade_out, fade_in) = equal_power_curves(overlap);
    let start = acc.len() - overlap;
    for i in 0..overlap {
        acc[start + i] = acc[start + i] * fade_out[i] + next[i] * fade_in[i];
    }
    acc.extend_from_slice(&next[overlap..]);
}

/// Incremental stitcher: chunks are appended one at a time, each crossfaded
/// into the audio accumulated so far.
#[derive(Debug, Clone)]
pub struct CrossfadeStitcher {
    crossfade_samples: usize,
    buffer: Vec<f32>,
    chunks: usize,
}

impl CrossfadeStitcher {
    pub fn new(sample_rate: u32, crossfade_ms: u64) -> Self {
        Self {
            crossfade_samples: crossfade_samples(sample_rate, crossfade_ms),
            buffer: Vec::new(),
            chunks: 0,
        }
    }

    pub fn push(&mut self, chunk: &[f32]) {
        crossfade_into(&mut self.buffer, chunk, self.crossfade_samples);
        self.chunks += 1;
    }

    /// Number of chunks pushed so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn finish(self) -> Vec<f32> {
        self.buffer
    }
}

/// Crossfade every chunk into the next, left to right.
pub fn stitch_chunks<I, C>(chunks: I, sample_rate: u32, crossfade_ms: u64) -> Vec<f32>
where
    I: IntoIterator<Item = C>,
    C: AsRef<[f32]>,
{
    let mut stitcher = CrossfadeStitcher::new(sample_rate, crossfade_ms);
    for chunk in chunks {
        stitcher.push(chunk.as_ref());
    }
    stitcher.finish()
}
