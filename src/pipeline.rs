use crate::audio::{
    calculate_duration_ms, load_audio, match_loudness, rms_loudness_lufs,
    time_stretch_to_duration, write_audio, CrossfadeStitcher,
};
use crate::error::{ChunkcastError, Result};
use crate::project::{
    archive_chunk, chunk_filename, find_chunk_by_timestamp, load_project, recalculate_timeline,
    save_project, ChunkData, ProjectData, ProjectSettings, TimelineCursor,
};
use crate::render::{ParamOverrides, Renderer, TtsOptions};
use crate::script::segment_script;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Options for [`generate_project`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Maximum words per chunk.
    pub max_words_per_chunk: usize,
    /// Remove an existing, non-empty project directory first.
    pub force: bool,
    /// Show a progress bar while rendering.
    pub show_progress: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_words_per_chunk: 80,
            force: false,
            show_progress: true,
        }
    }
}

/// Statistics from a generation run.
#[derive(Debug, Clone)]
pub struct GenerateStats {
    /// Total time taken for the entire run.
    pub total_time: Duration,
    /// Time spent inside the renderer.
    pub render_time: Duration,
    /// Number of chunks rendered and saved.
    pub chunks_rendered: usize,
    /// End of the last chunk on the timeline.
    pub timeline_ms: u64,
    /// Renderer used.
    pub renderer: String,
}

/// Result of [`generate_project`].
#[derive(Debug)]
pub struct GenerateResult {
    pub project: ProjectData,
    pub project_path: PathBuf,
    pub stats: GenerateStats,
}

/// Render a script chunk by chunk into a new project.
///
/// The project document is saved after every chunk, so a failure part way
/// through leaves a loadable project holding every chunk rendered so far.
pub fn generate_project(
    script_text: &str,
    project_root: &Path,
    mut settings: ProjectSettings,
    options: &TtsOptions,
    generate: &GenerateOptions,
    renderer: &dyn Renderer,
) -> Result<GenerateResult> {
    let start_time = Instant::now();

    if settings.sample_rate == 0 {
        return Err(ChunkcastError::Config(
            "Sample rate must be greater than 0".to_string(),
        ));
    }

    let spans = segment_script(script_text, generate.max_words_per_chunk)?;

    let last_offset = spans.len() as u64 - 1;
    if settings.global_seed.checked_add(last_offset).is_none() {
        return Err(ChunkcastError::Config(format!(
            "Global seed {} leaves no room for {} chunk seeds",
            settings.global_seed,
            spans.len()
        )));
    }

    prepare_project_dir(project_root, generate.force)?;

    settings.default_params = options.as_params();
    let mut project = ProjectData::new(project_root, settings);
    fs::create_dir_all(project.chunks_directory())?;
    fs::create_dir_all(project.archive_directory())?;

    info!(
        "Generating {} chunks with {} into {}",
        spans.len(),
        renderer.name(),
        project_root.display()
    );

    let progress_bar = if generate.show_progress {
        let pb = ProgressBar::new(spans.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut cursor = TimelineCursor::new(project.settings.crossfade_ms);
    let mut render_time = Duration::ZERO;

    for (offset, span) in spans.into_iter().enumerate() {
        let index = offset as u32 + 1;
        let seed = project.settings.global_seed + offset as u64;

        let render_start = Instant::now();
        let audio = renderer.render(&span.text, seed, options, &project.settings)?;
        render_time += render_start.elapsed();

        let duration_ms = calculate_duration_ms(audio.len(), project.settings.sample_rate);
        let filename = chunk_filename(index);
        write_audio(
            &project.chunks_directory().join(&filename),
            &audio,
            project.settings.sample_rate,
        )?;

        let chunk = ChunkData {
            index,
            filename,
            text: span.text,
            char_start: span.char_start,
            char_end: span.char_end,
            t_start_ms: cursor.place(duration_ms),
            duration_ms,
            seed,
            params: options.as_params(),
            speaker_id: 0,
        };
        debug!(
            "Chunk {}: seed {}, {}ms at {}ms",
            chunk.index, chunk.seed, chunk.duration_ms, chunk.t_start_ms
        );

        project.add_chunk(chunk);
        save_project(&project)?;

        if let Some(pb) = &progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("done");
    }

    let stats = GenerateStats {
        total_time: start_time.elapsed(),
        render_time,
        chunks_rendered: project.len(),
        timeline_ms: project.last_chunk().map(|c| c.t_end_ms()).unwrap_or(0),
        renderer: renderer.name().to_string(),
    };

    info!(
        "Generated {} chunks ({:.1}s of audio) in {:.2}s",
        stats.chunks_rendered,
        stats.timeline_ms as f64 / 1000.0,
        stats.total_time.as_secs_f64()
    );

    Ok(GenerateResult {
        project_path: project.project_json_path(),
        project,
        stats,
    })
}

fn prepare_project_dir(root: &Path, force: bool) -> Result<()> {
    if root.exists() {
        let non_empty = fs::read_dir(root)?.next().is_some();
        if non_empty && !force {
            return Err(ChunkcastError::Config(format!(
                "Project directory {} already exists. Use --force to overwrite.",
                root.display()
            )));
        }
        if force {
            warn!("Removing existing project directory {}", root.display());
            fs::remove_dir_all(root)?;
        }
    }
    fs::create_dir_all(root)?;
    Ok(())
}

/// Where replacement audio comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceMode {
    /// Re-render the chunk's stored text.
    #[default]
    Tts,
    /// Use an external audio file.
    Import,
}

impl fmt::Display for ReplaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceMode::Tts => write!(f, "tts"),
            ReplaceMode::Import => write!(f, "import"),
        }
    }
}

impl FromStr for ReplaceMode {
    type Err = ChunkcastError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tts" => Ok(ReplaceMode::Tts),
            "import" => Ok(ReplaceMode::Import),
            _ => Err(ChunkcastError::Config(format!(
                "Unsupported mode: {s}. Use 'tts' or 'import'"
            ))),
        }
    }
}

/// How a replacement's duration is reconciled with the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimelineMode {
    /// Accept the new duration and shift every later chunk.
    #[default]
    Free,
    /// Stretch the new audio to the old duration; nothing else moves.
    Locked,
}

impl fmt::Display for TimelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineMode::Free => write!(f, "free"),
            TimelineMode::Locked => write!(f, "locked"),
        }
    }
}

impl FromStr for TimelineMode {
    type Err = ChunkcastError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(TimelineMode::Free),
            "locked" => Ok(TimelineMode::Locked),
            _ => Err(ChunkcastError::Config(format!(
                "Unsupported timeline mode: {s}. Use 'free' or 'locked'"
            ))),
        }
    }
}

/// A request to replace one chunk's audio.
#[derive(Debug, Clone, Default)]
pub struct ReplaceRequest {
    pub index: u32,
    pub mode: ReplaceMode,
    pub timeline: TimelineMode,
    /// Seed override; the chunk keeps its stored seed when `None`.
    pub seed: Option<u64>,
    pub overrides: ParamOverrides,
    /// Required in import mode.
    pub import_path: Option<PathBuf>,
}

/// Result of [`replace_chunk`].
#[derive(Debug, Clone)]
pub struct ReplaceResult {
    pub chunk: ChunkData,
    /// Where the previous audio was archived, if there was any.
    pub archived: Option<PathBuf>,
    pub previous_duration_ms: u64,
    /// Whether later chunks were re-timed.
    pub timeline_recalculated: bool,
}

/// Replace a single chunk's audio and reconcile the timeline.
///
/// Steps run in order: archive the old audio, render or import the new
/// audio, reconcile its duration, write it, re-time later chunks in free
/// mode, then save the document.
pub fn replace_chunk(
    project_path: &Path,
    request: &ReplaceRequest,
    renderer: Option<&dyn Renderer>,
) -> Result<ReplaceResult> {
    let mut project = load_project(project_path)?;
    let chunk = project
        .get_chunk(request.index)
        .cloned()
        .ok_or(ChunkcastError::ChunkNotFound(request.index))?;

    // Validate inputs before anything on disk is touched.
    match request.mode {
        ReplaceMode::Tts if renderer.is_none() => {
            return Err(ChunkcastError::Config(
                "TTS mode requires a renderer".to_string(),
            ));
        }
        ReplaceMode::Import => match &request.import_path {
            None => {
                return Err(ChunkcastError::Config(
                    "Import mode requires an audio file path".to_string(),
                ));
            }
            Some(path) if !path.exists() => {
                return Err(ChunkcastError::FileNotFound(path.display().to_string()));
            }
            Some(_) => {}
        },
        ReplaceMode::Tts => {}
    }

    let archived = archive_chunk(&project, &chunk)?;
    let settings = project.settings.clone();
    let mut updated = chunk.clone();

    let audio = match (request.mode, renderer, &request.import_path) {
        (ReplaceMode::Tts, Some(renderer), _) => {
            // Project defaults only fill keys the chunk does not carry.
            let mut stored = settings.default_params.clone();
            stored.extend(chunk.params.clone());
            let options = TtsOptions::from_params(&stored).with_overrides(&request.overrides);
            let seed = request.seed.unwrap_or(chunk.seed);

            let audio = renderer.render(&chunk.text, seed, &options, &settings)?;
            updated.seed = seed;
            updated.params = options.as_params();
            audio
        }
        (ReplaceMode::Import, _, Some(import_path)) => {
            let audio = load_audio(import_path, settings.sample_rate)?;
            updated.params.insert("mode".to_string(), json!("import"));
            if let Some(seed) = request.seed {
                updated.seed = seed;
            }
            audio
        }
        _ => {
            return Err(ChunkcastError::Config(format!(
                "Unsupported replacement: {}",
                request.mode
            )));
        }
    };

    let previous_duration_ms = chunk.duration_ms;
    let new_duration_ms = calculate_duration_ms(audio.len(), settings.sample_rate);

    let locked = match request.timeline {
        TimelineMode::Locked if previous_duration_ms > 0 => true,
        TimelineMode::Locked => {
            warn!(
                "Chunk {} has no prior duration to lock to; accepting new duration",
                chunk.index
            );
            false
        }
        TimelineMode::Free => false,
    };

    let audio = if locked {
        updated.duration_ms = previous_duration_ms;
        time_stretch_to_duration(&audio, settings.sample_rate, previous_duration_ms)
    } else {
        updated.duration_ms = new_duration_ms;
        audio
    };

    write_audio(&project.chunk_path(&updated), &audio, settings.sample_rate)?;

    let final_index = updated.index;
    project.add_chunk(updated);
    if !locked {
        recalculate_timeline(&mut project);
    }
    save_project(&project)?;

    let chunk = project
        .get_chunk(final_index)
        .cloned()
        .ok_or(ChunkcastError::ChunkNotFound(final_index))?;

    info!(
        "Replaced chunk {} ({} / {}): {}ms -> {}ms",
        chunk.index, request.mode, request.timeline, previous_duration_ms, chunk.duration_ms
    );

    Ok(ReplaceResult {
        chunk,
        archived,
        previous_duration_ms,
        timeline_recalculated: !locked,
    })
}

/// Result of [`build_final_mix`].
#[derive(Debug, Clone)]
pub struct MixResult {
    pub output_path: PathBuf,
    pub chunks: usize,
    pub duration_ms: u64,
    /// RMS level of the stitched audio before normalization.
    pub input_lufs: f64,
    pub output_lufs: f64,
}

/// Stitch every chunk with crossfades, normalize, and write the final mix.
pub fn build_final_mix(project_path: &Path) -> Result<MixResult> {
    let project = load_project(project_path)?;
    let settings = &project.settings;

    let mut stitcher = CrossfadeStitcher::new(settings.sample_rate, settings.crossfade_ms);
    for chunk in project.chunks() {
        let path = project.chunk_path(chunk);
        if !path.exists() {
            return Err(ChunkcastError::FileNotFound(format!(
                "Missing chunk audio: {}",
                path.display()
            )));
        }
        stitcher.push(&load_audio(&path, settings.sample_rate)?);
    }

    let chunks = stitcher.chunk_count();
    let combined = stitcher.finish();
    let input_lufs = rms_loudness_lufs(&combined);
    let normalized = match_loudness(&combined, settings.loudness_lufs);
    let output_lufs = rms_loudness_lufs(&normalized);

    let output_path = project.final_mix_path();
    write_audio(&output_path, &normalized, settings.sample_rate)?;

    let duration_ms = calculate_duration_ms(normalized.len(), settings.sample_rate);
    info!(
        "Final mix: {} chunks, {:.1}s, {:.1} -> {:.1} dB RMS, written to {}",
        chunks,
        duration_ms as f64 / 1000.0,
        input_lufs,
        output_lufs,
        output_path.display()
    );

    Ok(MixResult {
        output_path,
        chunks,
        duration_ms,
        input_lufs,
        output_lufs,
    })
}

/// Load a project and return the chunk playing at `timestamp_ms`.
pub fn find_chunk(project_path: &Path, timestamp_ms: u64) -> Result<Option<ChunkData>> {
    let project = load_project(project_path)?;
    Ok(find_chunk_by_timestamp(&project, timestamp_ms).cloned())
}

const EXCERPT_CHARS: usize = 160;

/// Compact description of a chunk for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkSummary {
    pub index: u32,
    pub filename: String,
    pub t_start_ms: u64,
    pub duration_ms: u64,
    pub text_excerpt: String,
}

impl From<&ChunkData> for ChunkSummary {
    fn from(chunk: &ChunkData) -> Self {
        let text = chunk.text.trim();
        let text_excerpt = if text.chars().count() > EXCERPT_CHARS {
            let head: String = text.chars().take(EXCERPT_CHARS - 3).collect();
            format!("{head}...")
        } else {
            text.to_string()
        };

        Self {
            index: chunk.index,
            filename: chunk.filename.clone(),
            t_start_ms: chunk.t_start_ms,
            duration_ms: chunk.duration_ms,
            text_excerpt,
        }
    }
}

/// Print a summary of a generation run.
pub fn print_summary(result: &GenerateResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                      Project Generation Complete               ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Project:    {}", result.project_path.display());
    println!("  Chunks:     {}", result.stats.chunks_rendered);
    println!("  Renderer:   {}", result.stats.renderer);
    println!(
        "  Timeline:   {:.1}s audio",
        result.stats.timeline_ms as f64 / 1000.0
    );
    println!();
    println!("  Timing:");
    println!(
        "    Render:      {:.2}s",
        result.stats.render_time.as_secs_f64()
    );
    println!(
        "    Total:       {:.2}s",
        result.stats.total_time.as_secs_f64()
    );
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
