use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use reelsmith::{
    BatchOptions, CaptionMode, EngineConfig, FontResolver, GlyphRenderer, GlyphStyle, JobContext,
    Locale, ProjectInputs, discover_projects, init_tracing, plan_project, run_batch,
};

#[derive(Parser, Debug)]
#[command(name = "reelsmith", version)]
struct Cli {
    /// Engine config (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "reelsmith.toml")]
    config: PathBuf,

    /// Log level when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Skip the system font stage of the font fallback chain.
    #[arg(long, global = true, default_value_t = false)]
    no_system_fonts: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one project (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
    /// Render every project under the videos root in parallel.
    Batch(BatchArgs),
    /// Render one caption word as a PNG.
    Glyph(GlyphArgs),
    /// Print the clip plan and caption timeline as JSON without encoding.
    Plan(PlanArgs),
}

#[derive(clap::Args, Debug)]
struct OverlayArgs {
    /// Slow zoom on background clips.
    #[arg(long, default_value_t = false)]
    zoom: bool,

    /// Disable the word pop-in animation.
    #[arg(long, default_value_t = false)]
    no_pop_in: bool,

    /// Draw this watermark instead of captions (no narration).
    #[arg(long)]
    watermark: Option<String>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Project directory with clips and captions.
    project_dir: PathBuf,

    /// Only this language (name or code).
    #[arg(long)]
    lang: Option<String>,

    #[command(flatten)]
    overlay: OverlayArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Override the configured videos root.
    #[arg(long)]
    videos: Option<PathBuf>,

    /// Parallel jobs (defaults to the number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,

    /// Only this language (name or code).
    #[arg(long)]
    lang: Option<String>,

    #[command(flatten)]
    overlay: OverlayArgs,
}

#[derive(Parser, Debug)]
struct GlyphArgs {
    /// Word to render.
    text: String,

    /// Locale code selecting the script rules.
    #[arg(long, default_value = "en")]
    lang: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Use the watermark style.
    #[arg(long, default_value_t = false)]
    watermark: bool,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Project directory with clips and captions.
    project_dir: PathBuf,

    /// Only this language (name or code).
    #[arg(long)]
    lang: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut config = EngineConfig::load(&cli.config)?;
    if cli.no_system_fonts {
        config.system_fonts = false;
    }
    match cli.cmd {
        Command::Render(args) => cmd_render(config, &cli.log_level, args),
        Command::Batch(args) => cmd_batch(config, &cli.log_level, args),
        Command::Glyph(args) => cmd_glyph(config, args),
        Command::Plan(args) => cmd_plan(config, args),
    }
}

fn apply_overlay(config: &mut EngineConfig, args: &OverlayArgs) {
    if args.zoom {
        config.render.zoom = true;
    }
    if args.no_pop_in {
        config.render.pop_in = false;
    }
    if let Some(text) = &args.watermark {
        config.render.caption_mode = CaptionMode::Watermark { text: text.clone() };
    }
}

fn cmd_render(mut config: EngineConfig, log_level: &str, args: RenderArgs) -> anyhow::Result<()> {
    apply_overlay(&mut config, &args.overlay);
    config.validate()?;
    let project = ProjectInputs::scan(&args.project_dir)?;
    anyhow::ensure!(
        !project.videos.is_empty(),
        "no background clips in '{}'",
        args.project_dir.display()
    );
    let ctx = JobContext::new(config)?;
    let opts = BatchOptions {
        jobs: Some(1),
        language: args.lang,
        log_level: log_level.to_string(),
    };
    finish(run_batch(&ctx, std::slice::from_ref(&project), &opts)?)
}

fn cmd_batch(mut config: EngineConfig, log_level: &str, args: BatchArgs) -> anyhow::Result<()> {
    apply_overlay(&mut config, &args.overlay);
    if let Some(videos) = args.videos {
        config.paths.videos = videos;
    }
    config.validate()?;
    let projects = discover_projects(&config.paths.videos)?;
    let ctx = JobContext::new(config)?;
    let opts = BatchOptions {
        jobs: args.jobs,
        language: args.lang,
        log_level: log_level.to_string(),
    };
    finish(run_batch(&ctx, &projects, &opts)?)
}

fn finish(report: reelsmith::BatchReport) -> anyhow::Result<()> {
    for done in &report.succeeded {
        eprintln!(
            "wrote {} ({:.2}s, {} frames, {} loops)",
            done.output.display(),
            done.duration_s,
            done.stats.frames,
            done.loops
        );
    }
    for failed in &report.failed {
        eprintln!("failed {}/{}: {}", failed.project, failed.variant, failed.error);
    }
    anyhow::ensure!(
        report.failed.is_empty(),
        "{} of {} jobs failed",
        report.failed.len(),
        report.total()
    );
    Ok(())
}

fn cmd_glyph(config: EngineConfig, args: GlyphArgs) -> anyhow::Result<()> {
    let locale = Locale::new(&args.lang)?;
    let mut resolver = FontResolver::new(config.fonts.clone());
    if !config.system_fonts {
        resolver = resolver.without_system_fonts();
    }
    let style = if args.watermark {
        GlyphStyle::watermark()
    } else {
        GlyphStyle::caption()
    };
    let mut glyphs = GlyphRenderer::new(config.canvas, resolver, style)?;
    let font = glyphs.font_label(locale.family());
    let bitmap = glyphs.render(&args.text.to_uppercase(), &locale)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    bitmap.save_png(&args.out)?;
    eprintln!("wrote {} ({font})", args.out.display());
    Ok(())
}

fn cmd_plan(config: EngineConfig, args: PlanArgs) -> anyhow::Result<()> {
    let project = ProjectInputs::scan(&args.project_dir)?;
    let ctx = JobContext::new(config)?;
    let variants = ctx.variants(args.lang.as_deref())?;
    let report = plan_project(&ctx, &project, &variants);
    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &report.plans).context("write plan json")?;
    println!();
    for failed in &report.failed {
        eprintln!("failed {}/{}: {}", failed.project, failed.variant, failed.error);
    }
    anyhow::ensure!(
        report.failed.is_empty(),
        "{} of {} plans failed",
        report.failed.len(),
        variants.len()
    );
    Ok(())
}
