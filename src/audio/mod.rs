pub mod io;
pub mod loudness;
pub mod resample;
pub mod stitch;
pub mod stretch;

pub use io::{
    calculate_duration_ms, load_audio, read_metadata, samples_for_duration, write_audio,
};
pub use loudness::{match_loudness, rms_loudness_lufs, SILENCE_FLOOR_LUFS};
pub use resample::resample_mono;
pub use stitch::{cosine_crossfade, crossfade_samples, stitch_chunks, CrossfadeStitcher};
pub use stretch::{time_stretch, time_stretch_to_duration};

use std::time::Duration;

/// Metadata about an audio file.
#[derive(Debug, Clone)]
pub struct AudioMetadata {
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: usize,
}

impl AudioMetadata {
    /// Playback length of the file.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames as f64 / self.sample_rate as f64)
    }
}
