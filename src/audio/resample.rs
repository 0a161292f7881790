use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::debug;

use crate::error::{ChunkcastError, Result};

/// Resample mono audio from `input_rate` to `output_rate`.
///
/// The whole signal is processed as a single block, so the output length is
/// `len * output_rate / input_rate` up to rounding.
pub fn resample_mono(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == 0 || output_rate == 0 {
        return Err(ChunkcastError::Resample(format!(
            "invalid sample rates {input_rate} -> {output_rate}"
        )));
    }

    if input_rate == output_rate || input.is_empty() {
        return Ok(input.to_vec());
    }

    debug!(
        "Resampling {} samples from {}Hz to {}Hz",
        input.len(),
        input_rate,
        output_rate
    );

    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input.len(),
        1,
    )
    .map_err(|e| ChunkcastError::Resample(format!("Failed to create resampler: {e}")))?;

    let planar_input = vec![input.to_vec()];
    let mut planar_output = resampler
        .process(&planar_input, None)
        .map_err(|e| ChunkcastError::Resample(e.to_string()))?;

    Ok(planar_output.pop().unwrap_or_default())
}
