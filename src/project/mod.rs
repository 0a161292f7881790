pub mod archive;
pub mod store;
pub mod timeline;

pub use archive::archive_chunk;
pub use store::{load_project, save_project, save_project_to};
pub use timeline::{find_chunk_by_timestamp, recalculate_timeline, TimelineCursor};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Opaque render parameters, echoed back to the renderer on re-render.
pub type RenderParams = BTreeMap<String, serde_json::Value>;

pub const PROJECT_FILE_NAME: &str = "project.json";
pub const ARCHIVE_DIR_NAME: &str = "chunks_archive";
pub const CHUNK_EXTENSION: &str = "wav";

/// Project-wide settings stored under the `project` key of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_loudness_lufs")]
    pub loudness_lufs: f64,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_attention_type")]
    pub attention_type: String,
    #[serde(default = "default_global_seed")]
    pub global_seed: u64,
    #[serde(default = "default_crossfade_ms")]
    pub crossfade_ms: u64,
    #[serde(default = "default_chunks_dir")]
    pub chunks_dir: String,
    #[serde(default = "default_final_mix")]
    pub final_mix: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_params: RenderParams,
}

fn default_sample_rate() -> u32 {
    24_000
}

fn default_loudness_lufs() -> f64 {
    -16.0
}

fn default_model_name() -> String {
    "VibeVoice-Large".to_string()
}

fn default_attention_type() -> String {
    "auto".to_string()
}

fn default_global_seed() -> u64 {
    42
}

fn default_crossfade_ms() -> u64 {
    40
}

fn default_chunks_dir() -> String {
    "chunks".to_string()
}

fn default_final_mix() -> String {
    format!("final_mix.{CHUNK_EXTENSION}")
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            loudness_lufs: default_loudness_lufs(),
            model_name: default_model_name(),
            attention_type: default_attention_type(),
            global_seed: default_global_seed(),
            crossfade_ms: default_crossfade_ms(),
            chunks_dir: default_chunks_dir(),
            final_mix: default_final_mix(),
            default_params: RenderParams::new(),
        }
    }
}

/// One text span of the script together with its rendered audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkData {
    /// 1-based, unique within a project.
    pub index: u32,
    pub filename: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub char_start: usize,
    #[serde(default)]
    pub char_end: usize,
    #[serde(default)]
    pub t_start_ms: u64,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub params: RenderParams,
    /// Reserved for multi-voice projects.
    #[serde(default)]
    pub speaker_id: u32,
}

impl ChunkData {
    /// Timeline end of the chunk, ignoring crossfade overlap.
    pub fn t_end_ms(&self) -> u64 {
        self.t_start_ms + self.duration_ms
    }

    pub fn contains(&self, timestamp_ms: u64) -> bool {
        self.t_start_ms <= timestamp_ms && timestamp_ms < self.t_end_ms()
    }
}

/// Canonical chunk file name for a 1-based index.
pub fn chunk_filename(index: u32) -> String {
    format!("chunk_{index:03}.{CHUNK_EXTENSION}")
}

/// A project rooted at a directory on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectData {
    pub root: PathBuf,
    pub settings: ProjectSettings,
    chunks: Vec<ChunkData>,
}

impl ProjectData {
    pub fn new(root: impl Into<PathBuf>, settings: ProjectSettings) -> Self {
        Self {
            root: root.into(),
            settings,
            chunks: Vec::new(),
        }
    }

    pub fn with_chunks(
        root: impl Into<PathBuf>,
        settings: ProjectSettings,
        chunks: Vec<ChunkData>,
    ) -> Self {
        let mut project = Self::new(root, settings);
        for chunk in chunks {
            project.add_chunk(chunk);
        }
        project
    }

    pub fn project_json_path(&self) -> PathBuf {
        self.root.join(PROJECT_FILE_NAME)
    }

    pub fn chunks_directory(&self) -> PathBuf {
        self.root.join(&self.settings.chunks_dir)
    }

    pub fn archive_directory(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR_NAME)
    }

    pub fn final_mix_path(&self) -> PathBuf {
        self.root.join(&self.settings.final_mix)
    }

    pub fn chunk_path(&self, chunk: &ChunkData) -> PathBuf {
        self.chunks_directory().join(&chunk.filename)
    }

    /// Chunks in ascending index order.
    pub fn chunks(&self) -> &[ChunkData] {
        &self.chunks
    }

    /// Mutable access for timeline updates. Indices must not be changed.
    pub fn chunks_mut(&mut self) -> &mut [ChunkData] {
        &mut self.chunks
    }

    pub fn get_chunk(&self, index: u32) -> Option<&ChunkData> {
        self.position(index).map(|pos| &self.chunks[pos])
    }

    pub fn get_chunk_mut(&mut self, index: u32) -> Option<&mut ChunkData> {
        self.position(index).map(move |pos| &mut self.chunks[pos])
    }

    /// Insert a chunk, replacing any existing chunk with the same index.
    pub fn add_chunk(&mut self, chunk: ChunkData) {
        match self.chunks.binary_search_by_key(&chunk.index, |c| c.index) {
            Ok(pos) => self.chunks[pos] = chunk,
            Err(pos) => self.chunks.insert(pos, chunk),
        }
    }

    pub fn last_chunk(&self) -> Option<&ChunkData> {
        self.chunks.last()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn position(&self, index: u32) -> Option<usize> {
        self.chunks.binary_search_by_key(&index, |c| c.index).ok()
    }
}
