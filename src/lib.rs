pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod project;
pub mod render;
pub mod script;

pub use config::Config;
pub use error::{ChunkcastError, ErrorKind, Result};
pub use pipeline::{
    build_final_mix, find_chunk, generate_project, print_summary, replace_chunk, ChunkSummary,
    GenerateOptions, GenerateResult, MixResult, ReplaceMode, ReplaceRequest, ReplaceResult,
    TimelineMode,
};
pub use project::{ChunkData, ProjectData, ProjectSettings};
pub use render::{create_renderer, ParamOverrides, Renderer, SyntheticRenderer, TtsOptions};
