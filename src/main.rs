use anyhow::{Context, Result};
use chunkcast::config::Config;
use chunkcast::pipeline::{
    build_final_mix, find_chunk, generate_project, print_summary, replace_chunk, ChunkSummary,
    GenerateOptions, ReplaceMode, ReplaceRequest, TimelineMode,
};
use chunkcast::render::{create_renderer, ParamOverrides, TtsOptions};
use chunkcast::script::load_script_text;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "chunkcast")]
#[command(version, about = "Chunked long-form speech projects")]
#[command(long_about = "Render a script as independently regenerable audio chunks, replace any chunk later, and build a crossfaded final mix.")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a project chunk by chunk from a script
    Generate(GenerateArgs),
    /// Replace a single chunk within a project
    Replace(ReplaceArgs),
    /// Build the final mix for a project
    Build {
        /// Path to project.json
        project_json: PathBuf,
    },
    /// Resolve a timestamp to the owning chunk
    Find {
        /// Path to project.json
        project_json: PathBuf,

        /// Timestamp in milliseconds
        #[arg(long)]
        ts: u64,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Path to the script text file
    #[arg(long)]
    script: PathBuf,

    /// Project directory to create
    #[arg(long)]
    out: PathBuf,

    /// Sample rate for generated audio
    #[arg(long)]
    sr: Option<u32>,

    /// Target loudness in LUFS
    #[arg(long, allow_hyphen_values = true)]
    lufs: Option<f64>,

    /// Crossfade overlap in milliseconds
    #[arg(long)]
    xfade: Option<u64>,

    /// Global seed for the initial render pass
    #[arg(long)]
    seed: Option<u64>,

    /// Model name passed to the renderer
    #[arg(long)]
    model: Option<String>,

    /// Attention implementation passed to the renderer
    #[arg(long)]
    attention: Option<String>,

    /// Diffusion steps
    #[arg(long, default_value = "20")]
    diffusion: u32,

    /// Classifier-free guidance scale
    #[arg(long, default_value = "1.3")]
    cfg: f64,

    /// Enable sampling mode
    #[arg(long)]
    sampling: bool,

    /// Sampling temperature
    #[arg(long, default_value = "0.95")]
    temperature: f64,

    /// Top-p sampling value
    #[arg(long, default_value = "0.95")]
    top_p: f64,

    /// Maximum words per chunk
    #[arg(long)]
    max_words: Option<usize>,

    /// Overwrite an existing project directory
    #[arg(long)]
    force: bool,

    /// Use synthetic audio instead of the neural renderer
    #[arg(long)]
    mock: bool,
}

#[derive(Args)]
struct ReplaceArgs {
    /// Path to project.json
    project_json: PathBuf,

    /// 1-based chunk index to replace
    #[arg(long)]
    index: u32,

    /// Replacement mode: tts, import
    #[arg(long, default_value = "tts")]
    mode: String,

    /// Timeline handling: free, locked
    #[arg(long, default_value = "free")]
    timeline: String,

    /// Override seed for the replacement
    #[arg(long)]
    seed: Option<u64>,

    /// Override cfg_scale
    #[arg(long)]
    cfg: Option<f64>,

    /// Override diffusion steps
    #[arg(long)]
    diffusion: Option<u32>,

    /// Override temperature
    #[arg(long)]
    temperature: Option<f64>,

    /// Override top-p
    #[arg(long)]
    top_p: Option<f64>,

    /// Force sampling on
    #[arg(long, conflicts_with = "no_sampling")]
    sampling: bool,

    /// Force sampling off
    #[arg(long)]
    no_sampling: bool,

    /// Audio file to import when mode=import
    #[arg(long = "import")]
    import_path: Option<PathBuf>,

    /// Use synthetic audio instead of the neural renderer
    #[arg(long)]
    mock: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Project file not found: {}", path.display());
    }
    Ok(())
}

fn run_generate(args: GenerateArgs, mut config: Config) -> Result<()> {
    config.mock_tts |= args.mock;
    if let Some(max_words) = args.max_words {
        config.max_words_per_chunk = max_words;
    }
    config
        .validate()
        .context("Configuration validation failed")?;
    config.ensure_dirs().context("Failed to create working directories")?;

    let script = load_script_text(&config, Some(&args.script), None)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;

    let mut settings = config.defaults.to_settings();
    if let Some(sr) = args.sr {
        settings.sample_rate = sr;
    }
    if let Some(lufs) = args.lufs {
        settings.loudness_lufs = lufs;
    }
    if let Some(xfade) = args.xfade {
        settings.crossfade_ms = xfade;
    }
    if let Some(seed) = args.seed {
        settings.global_seed = seed;
    }
    if let Some(model) = args.model {
        settings.model_name = model;
    }
    if let Some(attention) = args.attention {
        settings.attention_type = attention;
    }

    let options = TtsOptions {
        cfg_scale: args.cfg,
        diffusion_steps: args.diffusion,
        use_sampling: args.sampling,
        temperature: args.temperature,
        top_p: args.top_p,
    };

    let generate = GenerateOptions {
        max_words_per_chunk: config.max_words_per_chunk,
        force: args.force,
        show_progress: true,
    };

    info!("Script:   {}", args.script.display());
    info!("Project:  {}", args.out.display());
    info!("Model:    {} ({})", settings.model_name, settings.attention_type);

    let renderer = create_renderer(&config)?;
    let result = generate_project(
        &script,
        &args.out,
        settings,
        &options,
        &generate,
        renderer.as_ref(),
    )
    .context("Generation failed")?;

    print_summary(&result);
    Ok(())
}

fn run_replace(args: ReplaceArgs, mut config: Config) -> Result<()> {
    require_file(&args.project_json)?;
    config.mock_tts |= args.mock;

    let mode: ReplaceMode = args.mode.parse()?;
    let timeline: TimelineMode = args.timeline.parse()?;

    let use_sampling = match (args.sampling, args.no_sampling) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };

    let request = ReplaceRequest {
        index: args.index,
        mode,
        timeline,
        seed: args.seed,
        overrides: ParamOverrides {
            cfg_scale: args.cfg,
            diffusion_steps: args.diffusion,
            use_sampling,
            temperature: args.temperature,
            top_p: args.top_p,
        },
        import_path: args.import_path,
    };

    let renderer = match mode {
        ReplaceMode::Tts => Some(create_renderer(&config)?),
        ReplaceMode::Import => None,
    };

    let result = replace_chunk(&args.project_json, &request, renderer.as_deref())
        .with_context(|| format!("Failed to replace chunk {}", args.index))?;

    if let Some(archived) = &result.archived {
        info!("Archived previous audio to {}", archived.display());
    }
    println!(
        "Updated chunk {} ({})",
        result.chunk.index, result.chunk.filename
    );
    println!(
        "Seed: {} | Duration: {} ms | Mode: {}",
        result.chunk.seed, result.chunk.duration_ms, mode
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;

    match cli.command {
        Command::Generate(args) => run_generate(args, config),
        Command::Replace(args) => run_replace(args, config),
        Command::Build { project_json } => {
            require_file(&project_json)?;
            let mix = build_final_mix(&project_json).context("Failed to build final mix")?;
            println!("{}", mix.output_path.display());
            Ok(())
        }
        Command::Find { project_json, ts } => {
            require_file(&project_json)?;
            let chunk = find_chunk(&project_json, ts)?
                .ok_or_else(|| anyhow::anyhow!("No chunk covers the requested timestamp"))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&ChunkSummary::from(&chunk))?
            );
            Ok(())
        }
    }
}
