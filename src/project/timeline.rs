use super::{ChunkData, ProjectData};

/// Running start position for chunks laid out back to back, each overlapping
/// its predecessor by `crossfade_ms`.
#[derive(Debug, Clone, Copy)]
pub struct TimelineCursor {
    next_start_ms: u64,
    crossfade_ms: u64,
}

impl TimelineCursor {
    pub fn new(crossfade_ms: u64) -> Self {
        Self {
            next_start_ms: 0,
            crossfade_ms,
        }
    }

    /// Start time the next placed chunk will receive.
    pub fn next_start_ms(&self) -> u64 {
        self.next_start_ms
    }

    /// Place a chunk of `duration_ms` and return its start time.
    ///
    /// The following start never goes below zero even when the crossfade is
    /// longer than the chunk.
    pub fn place(&mut self, duration_ms: u64) -> u64 {
        let start = self.next_start_ms;
        self.next_start_ms = (start + duration_ms).saturating_sub(self.crossfade_ms);
        start
    }
}

/// Recompute `t_start_ms` of every chunk from durations and crossfade.
pub fn recalculate_timeline(project: &mut ProjectData) {
    let mut cursor = TimelineCursor::new(project.settings.crossfade_ms);
    for chunk in project.chunks_mut() {
        chunk.t_start_ms = cursor.place(chunk.duration_ms);
    }
}

/// Find the chunk whose `[start, start + duration)` span holds `timestamp_ms`.
///
/// Timestamps past the nominal end of the last chunk still resolve to it.
pub fn find_chunk_by_timestamp(project: &ProjectData, timestamp_ms: u64) -> Option<&ChunkData> {
    if let Some(chunk) = project.chunks().iter().find(|c| c.contains(timestamp_ms)) {
        return Some(chunk);
    }

    project
        .last_chunk()
        .filter(|last| timestamp_ms >= last.t_start_ms)
}
