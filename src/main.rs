use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use promptreel::caption::CaptionPainter;
use promptreel::compositor::FrameCompositor;
use promptreel::config::{load_and_validate_config, SessionConfig, StageConfig};
use promptreel::error_codes::{
    envelope_for, find_coded_error, CodedError, EMPTY_PROMPT, FONT_UNAVAILABLE, GENERATION_FAILED, INVALID_ARGUMENT,
    UNKNOWN_STYLE,
};
use promptreel::export::{export_run, save_rgba_png, ExportOptions, RunSummary};
use promptreel::grain::{frame_seed, XorShift64};
use promptreel::orchestrator::{GenerationOrchestrator, GenerationOutcome, NoDelay, Session, SleepTimer, StageTimer};
use promptreel::prompt::TemplateEnhancer;
use promptreel::schema::Style;
use promptreel::segment::{scene_table, TemplateSegmenter};

#[derive(Debug, Parser)]
#[command(name = "promptreel")]
#[command(about = "Prompt to procedural scene playback, rendered headless")]
#[command(version = env!("PROMPTREEL_VERSION"))]
struct Cli {
    /// Print machine-readable JSON on stdout, including errors.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Debug-level logging on stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Enhance a prompt, segment it into scenes and play the sequence headless.
    Generate {
        #[arg(short, long)]
        prompt: String,
        #[arg(short, long, default_value = "cinematic")]
        style: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory for PNG frames and run.json.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Write every n-th frame as PNG.
        #[arg(long, default_value_t = 1)]
        every: u32,
        /// Skip the artificial stage delays.
        #[arg(long, default_value_t = false)]
        no_delay: bool,
        #[arg(long)]
        font: Option<PathBuf>,
    },
    /// Render a single frame of a style's scene table to PNG.
    Frame {
        #[arg(short, long)]
        style: String,
        #[arg(long, default_value_t = 0)]
        scene: usize,
        #[arg(long, default_value_t = 0.0)]
        progress: f32,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        font: Option<PathBuf>,
    },
    /// List the available styles.
    Styles,
    /// Print a style's scene table.
    Scenes {
        #[arg(short, long)]
        style: String,
    },
    /// Parse and validate a session config file.
    CheckConfig { config: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if cli.json {
                let envelope = envelope_for(&error);
                match serde_json::to_string(&envelope) {
                    Ok(json) => println!("{json}"),
                    Err(_) => eprintln!("error: {error:#}"),
                }
            } else {
                eprintln!("error: {error:#}");
            }
            ExitCode::from(find_coded_error(&error).map_or(1, CodedError::exit_code))
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Generate {
            prompt,
            style,
            config,
            out,
            every,
            no_delay,
            font,
        } => run_generate(
            cli.json,
            GenerateArgs {
                prompt,
                style,
                config: config.as_deref(),
                out: out.as_deref(),
                every: *every,
                no_delay: *no_delay,
                font: font.as_deref(),
            },
        ),
        Commands::Frame {
            style,
            scene,
            progress,
            output,
            config,
            font,
        } => run_frame(cli.json, style, *scene, *progress, output, config.as_deref(), font.as_deref()),
        Commands::Styles => run_styles(cli.json),
        Commands::Scenes { style } => run_scenes(style),
        Commands::CheckConfig { config } => run_check_config(cli.json, config),
    }
}

struct GenerateArgs<'a> {
    prompt: &'a str,
    style: &'a str,
    config: Option<&'a Path>,
    out: Option<&'a Path>,
    every: u32,
    no_delay: bool,
    font: Option<&'a Path>,
}

fn run_generate(json: bool, args: GenerateArgs<'_>) -> Result<()> {
    if args.prompt.trim().is_empty() {
        return Err(CodedError::usage(EMPTY_PROMPT, "prompt must not be blank").into());
    }
    let style = parse_style(args.style)?;
    let config = load_config(args.config)?;

    let mut session = Session::new(args.prompt, style.id(), &config.playback);
    let mut on_status = |status: &str| {
        if !json {
            eprintln!("{status}");
        }
    };
    let outcome = if args.no_delay {
        orchestrate(NoDelay, StageConfig::none(), &mut session, &mut on_status)
    } else {
        orchestrate(SleepTimer, config.stages, &mut session, &mut on_status)
    };
    let (handle, started_at) = match outcome {
        GenerationOutcome::Completed {
            handle, started_at, ..
        } => (handle, started_at),
        GenerationOutcome::Skipped => {
            return Err(CodedError::usage(EMPTY_PROMPT, "prompt must not be blank").into());
        }
        GenerationOutcome::Failed(error) => {
            let status = session.status().unwrap_or_default();
            return Err(CodedError::runtime(GENERATION_FAILED, format!("{status} ({error:#})")).into());
        }
    };

    let mut compositor = build_compositor(&config, args.font)?;
    let options = ExportOptions {
        frame_interval: config.playback.frame_interval(),
        grain_seed: config.grain.seed,
        out_dir: args.out.map(Path::to_path_buf),
        every_nth: args.every.max(1),
    };
    let summary = export_run(&mut session, handle, started_at, &mut compositor, &options)?;
    print_summary(json, &summary, args.out)
}

fn orchestrate<T: StageTimer>(
    timer: T,
    stages: StageConfig,
    session: &mut Session,
    on_status: &mut dyn FnMut(&str),
) -> GenerationOutcome {
    GenerationOrchestrator::new(TemplateEnhancer, TemplateSegmenter, timer, stages).generate(session, on_status)
}

fn print_summary(json: bool, summary: &RunSummary, out: Option<&Path>) -> Result<()> {
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    if json {
        #[derive(Serialize)]
        struct GenerateOutput<'a> {
            ok: bool,
            #[serde(flatten)]
            summary: &'a RunSummary,
        }
        serde_json::to_writer(&mut stdout, &GenerateOutput { ok: true, summary })?;
        writeln!(stdout)?;
        return Ok(());
    }

    if let Some(enhanced) = &summary.enhanced_prompt {
        writeln!(stdout, "Enhanced prompt: {enhanced}")?;
    }
    for scene in &summary.scenes {
        writeln!(
            stdout,
            "Scene {} of {}: {} ({} frames)",
            scene.index + 1,
            summary.scenes.len(),
            scene.description,
            scene.frame_count
        )?;
    }
    writeln!(
        stdout,
        "{} frames at {}x{}, sequence sha256 {}",
        summary.frame_count, summary.width, summary.height, summary.sequence_digest
    )?;
    if let Some(out) = out {
        writeln!(stdout, "Wrote {}", out.display())?;
    }
    Ok(())
}

fn run_frame(
    json: bool,
    style: &str,
    scene_index: usize,
    progress: f32,
    output: &Path,
    config: Option<&Path>,
    font: Option<&Path>,
) -> Result<()> {
    let style = parse_style(style)?;
    let config = load_config(config)?;
    let scenes = scene_table(style);
    let scene = scenes.get(scene_index).ok_or_else(|| {
        CodedError::usage(
            INVALID_ARGUMENT,
            format!("--scene {scene_index} is out of bounds for {} scene(s)", scenes.len()),
        )
    })?;

    let mut compositor = build_compositor(&config, font)?;
    let mut noise = XorShift64::from_seed(frame_seed(config.grain.seed, 0));
    compositor.compose(style.id(), scene, progress, &mut noise)?;
    let digest = compositor.digest();
    save_rgba_png(output, compositor.width(), compositor.height(), compositor.rgba())?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "ok": true, "path": output.display().to_string(), "digest": digest })
        );
    } else {
        println!("Wrote {} (sha256 {digest})", output.display());
    }
    Ok(())
}

fn run_styles(json: bool) -> Result<()> {
    if json {
        let styles = Style::ALL
            .iter()
            .map(|style| serde_json::json!({ "id": style.id(), "name": style.name(), "description": style.description() }))
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&styles)?);
        return Ok(());
    }
    for style in Style::ALL {
        println!("{:<10} {:<10} {}", style.id(), style.name(), style.description());
    }
    Ok(())
}

fn run_scenes(style: &str) -> Result<()> {
    let style = parse_style(style)?;
    println!("{}", serde_json::to_string_pretty(&scene_table(style))?);
    Ok(())
}

fn run_check_config(json: bool, path: &Path) -> Result<()> {
    let config = load_and_validate_config(path)?;
    if json {
        println!("{}", serde_json::json!({ "ok": true, "config": config }));
    } else {
        println!(
            "OK: {} ({}x{}, {} fps, {} ms per scene, resume {:?})",
            path.display(),
            config.canvas.width,
            config.canvas.height,
            config.playback.fps,
            config.playback.scene_duration_ms,
            config.playback.resume
        );
    }
    Ok(())
}

fn parse_style(raw: &str) -> Result<Style> {
    raw.parse::<Style>()
        .map_err(|error| {
            CodedError::usage(UNKNOWN_STYLE, format!("{error:#}"))
                .with_details(serde_json::json!({ "valid": Style::ALL.map(Style::id) }))
                .into()
        })
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    match path {
        Some(path) => load_and_validate_config(path),
        None => Ok(SessionConfig::default()),
    }
}

/// An explicitly requested font must load; otherwise captions are best effort.
fn build_compositor(config: &SessionConfig, font_override: Option<&Path>) -> Result<FrameCompositor> {
    let requested = font_override.or(config.caption.font.as_deref());
    let font_size = config.caption.font_size;
    let caption = match requested {
        Some(path) => Some(
            CaptionPainter::from_path(path, font_size)
                .map_err(|error| CodedError::usage(FONT_UNAVAILABLE, format!("{error:#}")))?,
        ),
        None => match CaptionPainter::discover(None, font_size) {
            Ok(painter) => Some(painter),
            Err(error) => {
                tracing::warn!(error = %format!("{error:#}"), "captions will render without text");
                None
            }
        },
    };
    FrameCompositor::new(
        config.canvas.width,
        config.canvas.height,
        caption,
        config.grain.settings(),
    )
    .context("failed to allocate frame surface")
}
