//! One render job: a project rendered in one language.
//!
//! Stages run in order: captions, translation, narration, clip normalization,
//! reconciliation, caption timing, then compositing into the encoder.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::fonts::FontResolver;
use crate::assets::media::{FfmpegProbe, MediaProbe, NARRATION_SAMPLE_RATE};
use crate::config::{CaptionMode, EngineConfig};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{ReelError, ReelResult};
use crate::normalize::canvas::{MediaClip, normalize_clips_with};
use crate::project::collab::{
    CommandNarration, LocalizedCaptionFiles, NarrationChain, NarrationRequest, NarrationSource,
    PrerecordedNarration, Translator, narration_text, translate_or_fallback,
};
use crate::project::layout::{OutputLayout, ProjectInputs};
use crate::render::compositor::{
    Compositor, FfmpegBackground, OverlayPlan, RenderJob, RenderStats,
};
use crate::session::telemetry::StageTimer;
use crate::text::glyph::{GlyphRenderer, GlyphStyle};
use crate::text::locale::{LanguageEntry, Locale};
use crate::timeline::captions::{CaptionSentence, WordEvent, build_word_events};
use crate::timeline::reconcile::{ReconciledTrack, reconcile, without_narration};
use crate::timeline::track::AudioAsset;

/// Which output of a project a job produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobVariant {
    /// Translated captions and narration, written to `Output_{name}.mp4`.
    Language {
        /// Language name from the locale table.
        name: String,
        /// Code and voice.
        entry: LanguageEntry,
    },
    /// Untranslated or watermark output, written to `{project}_final.mp4`.
    Single,
}

impl JobVariant {
    /// Short label for logs and reports.
    pub fn label(&self) -> &str {
        match self {
            JobVariant::Language { name, .. } => name,
            JobVariant::Single => "single",
        }
    }

    /// Directory component for the job's scratch space.
    pub fn scratch_key(&self) -> &str {
        match self {
            JobVariant::Language { entry, .. } => &entry.code,
            JobVariant::Single => "single",
        }
    }

    /// Locale whose script rules apply.
    pub fn locale(&self) -> ReelResult<Locale> {
        match self {
            JobVariant::Language { entry, .. } => Locale::new(&entry.code),
            JobVariant::Single => Ok(Locale::english()),
        }
    }
}

/// Shared state for every job of a run.
pub struct JobContext {
    /// Engine configuration.
    pub config: EngineConfig,
    /// Caption translator.
    pub translator: Box<dyn Translator>,
    /// Narration provider.
    pub narration: Box<dyn NarrationSource>,
    /// Clip probing and narration decoding.
    pub media: Box<dyn MediaProbe>,
    /// Cancels every job of the run.
    pub cancel: CancelToken,
}

impl JobContext {
    /// Context with the default collaborators: pre-localized caption files, then
    /// pre-recorded narration followed by the configured synthesis command.
    pub fn new(config: EngineConfig) -> ReelResult<Self> {
        let mut chain = NarrationChain::new().with(PrerecordedNarration);
        if !config.narration.command.is_empty() {
            chain = chain.with(CommandNarration::new(
                config.narration.command.clone(),
                config.narration.min_bytes,
            )?);
        }
        Ok(Self {
            config,
            translator: Box::new(LocalizedCaptionFiles),
            narration: Box::new(chain),
            media: Box::new(FfmpegProbe),
            cancel: CancelToken::new(),
        })
    }

    /// Replace the translator.
    pub fn with_translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Box::new(translator);
        self
    }

    /// Replace the narration provider.
    pub fn with_narration(mut self, narration: impl NarrationSource + 'static) -> Self {
        self.narration = Box::new(narration);
        self
    }

    /// Replace clip probing and narration decoding.
    pub fn with_media(mut self, media: impl MediaProbe + 'static) -> Self {
        self.media = Box::new(media);
        self
    }

    /// Output, temp and log locations.
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.config.paths)
    }

    /// Jobs to run per project. `only` selects one language by name or code.
    pub fn variants(&self, only: Option<&str>) -> ReelResult<Vec<JobVariant>> {
        let single = matches!(self.config.render.caption_mode, CaptionMode::Watermark { .. })
            || self.config.languages.is_empty();
        if single {
            return Ok(vec![JobVariant::Single]);
        }
        let all = self.config.languages.iter().map(|(name, entry)| JobVariant::Language {
            name: name.to_string(),
            entry: entry.clone(),
        });
        let Some(only) = only else {
            return Ok(all.collect());
        };
        let (name, entry) = self
            .config
            .languages
            .find(only)
            .ok_or_else(|| ReelError::validation(format!("unknown language '{only}'")))?;
        Ok(vec![JobVariant::Language {
            name: name.to_string(),
            entry: entry.clone(),
        }])
    }

    /// Output file for `variant` of `project`.
    pub fn output_path(&self, project: &ProjectInputs, variant: &JobVariant) -> PathBuf {
        let layout = self.layout();
        match variant {
            JobVariant::Language { name, .. } => layout.language_output(&project.name, name),
            JobVariant::Single => layout.single_output(&project.name),
        }
    }

    fn voice<'a>(&'a self, variant: &'a JobVariant) -> &'a str {
        match variant {
            JobVariant::Language { entry, .. } => &entry.voice,
            JobVariant::Single => &self.config.narration.default_voice,
        }
    }
}

/// Outcome of a finished job.
#[derive(Clone, Debug)]
pub struct JobReport {
    /// Project name.
    pub project: String,
    /// Variant label.
    pub variant: String,
    /// Written MP4.
    pub output: PathBuf,
    /// Output duration in seconds.
    pub duration_s: f64,
    /// Background repetitions.
    pub loops: u32,
    /// Clips that made it into the background.
    pub clips_used: usize,
    /// Clips that failed to load.
    pub clips_skipped: usize,
    /// Caption words shown.
    pub words: usize,
    /// Compositor statistics.
    pub stats: RenderStats,
}

/// Everything a job would render, without encoding.
#[derive(Clone, Debug, serde::Serialize)]
pub struct JobPlan {
    /// Project name.
    pub project: String,
    /// Variant label.
    pub variant: String,
    /// Output the job would write.
    pub output: PathBuf,
    /// Narration audio, when the job has one.
    pub narration: Option<PathBuf>,
    /// Normalized background clips.
    pub clips: Vec<Arc<MediaClip>>,
    /// Clips that failed to load, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Background reconciled to the job duration.
    pub track: ReconciledTrack,
    /// Caption timeline.
    pub words: Vec<WordEvent>,
    /// Watermark text, in watermark mode.
    pub watermark: Option<String>,
}

struct PreparedJob {
    job: RenderJob,
    plan: JobPlan,
}

/// Removes a job scratch directory when dropped.
struct ScratchDir(PathBuf);

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.0.exists()
            && let Err(e) = std::fs::remove_dir_all(&self.0)
        {
            tracing::warn!(dir = %self.0.display(), error = %e, "failed to remove job scratch directory");
        }
    }
}

fn load_sentences(
    ctx: &JobContext,
    project: &ProjectInputs,
    variant: &JobVariant,
    locale: &Locale,
) -> ReelResult<Vec<CaptionSentence>> {
    let mode = &ctx.config.render.caption_mode;
    let source = match project.read_captions() {
        Ok(s) => s,
        Err(e) if mode.needs_captions() => return Err(e),
        Err(e) => {
            tracing::debug!(error = %e, "no captions, continuing without");
            Vec::new()
        }
    };
    if source.is_empty() || matches!(variant, JobVariant::Single) {
        return Ok(source);
    }
    Ok(translate_or_fallback(
        ctx.translator.as_ref(),
        project,
        &source,
        locale,
    ))
}

fn prepare(
    ctx: &JobContext,
    project: &ProjectInputs,
    variant: &JobVariant,
    scratch: &Path,
) -> ReelResult<PreparedJob> {
    let cfg = &ctx.config;
    ctx.cancel.check()?;
    let locale = variant.locale()?;
    let canvas = cfg.canvas.validate()?;
    let fps = cfg.fps()?;

    let timer = StageTimer::start("captions");
    let sentences = load_sentences(ctx, project, variant, &locale)?;
    timer.done();

    let audio = if cfg.render.caption_mode.needs_narration() {
        let timer = StageTimer::start("narration");
        let text = narration_text(&sentences);
        let path = ctx.narration.narrate(&NarrationRequest {
            project,
            locale: &locale,
            voice: ctx.voice(variant),
            text: &text,
            work_dir: scratch,
        })?;
        let pcm = ctx.media.decode_narration(&path, NARRATION_SAMPLE_RATE)?;
        let audio = AudioAsset::from_pcm(&path, pcm)?;
        timer.done();
        Some(audio)
    } else {
        None
    };

    ctx.cancel.check()?;
    let timer = StageTimer::start("normalize");
    let clips = normalize_clips_with(
        &project.videos,
        canvas,
        &cfg.normalize,
        &ctx.cancel,
        |p| ctx.media.probe_video(p),
    )?;
    timer.done();
    let used = clips.clips.clone();
    let skipped = clips.skipped.clone();
    let background = clips.into_track()?;

    let track = match audio.as_ref() {
        Some(audio) => reconcile(background, audio)?,
        None => without_narration(background),
    };

    let (overlay, words, watermark) = match &cfg.render.caption_mode {
        CaptionMode::Words => {
            let words = build_word_events(&sentences, track.duration_s(), &locale)?;
            (OverlayPlan::Words(words.clone()), words, None)
        }
        CaptionMode::Watermark { text } => (
            OverlayPlan::Watermark {
                text: text.clone(),
                locale: locale.clone(),
            },
            Vec::new(),
            Some(text.clone()),
        ),
        CaptionMode::Off => (OverlayPlan::None, Vec::new(), None),
    };

    let plan = JobPlan {
        project: project.name.clone(),
        variant: variant.label().to_string(),
        output: ctx.output_path(project, variant),
        narration: audio.as_ref().map(|a| a.path.clone()),
        clips: used,
        skipped,
        track: track.clone(),
        words,
        watermark,
    };
    let job = RenderJob {
        label: format!("{}/{}", project.name, variant.label()),
        canvas,
        fps,
        track,
        audio,
        overlay,
        zoom: cfg.render.zoom_curve(),
        pop_in: cfg.render.pop_in_curve(),
        temp_dir: scratch.to_path_buf(),
    };
    Ok(PreparedJob { job, plan })
}

fn glyph_renderer(cfg: &EngineConfig) -> ReelResult<GlyphRenderer> {
    let mut resolver = FontResolver::new(cfg.fonts.clone());
    if !cfg.system_fonts {
        resolver = resolver.without_system_fonts();
    }
    let style = match cfg.render.caption_mode {
        CaptionMode::Watermark { .. } => GlyphStyle::watermark(),
        _ => GlyphStyle::caption(),
    };
    GlyphRenderer::new(cfg.canvas, resolver, style)
}

/// Resolve inputs and timing for one job without encoding.
#[tracing::instrument(skip_all, fields(project = %project.name, variant = variant.label()))]
pub fn plan_job(
    ctx: &JobContext,
    project: &ProjectInputs,
    variant: &JobVariant,
) -> ReelResult<JobPlan> {
    let scratch = ScratchDir(ctx.layout().temp_dir(&project.name, variant.scratch_key()));
    Ok(prepare(ctx, project, variant, &scratch.0)?.plan)
}

/// Run one job end to end and write its MP4.
///
/// Job-fatal errors leave no output file behind; the scratch directory is always removed.
#[tracing::instrument(skip_all, fields(project = %project.name, variant = variant.label()))]
pub fn run_job(
    ctx: &JobContext,
    project: &ProjectInputs,
    variant: &JobVariant,
) -> ReelResult<JobReport> {
    let cfg = &ctx.config;
    let scratch = ScratchDir(ctx.layout().temp_dir(&project.name, variant.scratch_key()));
    let PreparedJob { job, plan } = prepare(ctx, project, variant, &scratch.0)?;

    let timer = StageTimer::start("render");
    let mut compositor = Compositor::new(glyph_renderer(cfg)?);
    let mut background = FfmpegBackground::new(job.canvas, job.fps);
    let mut opts = FfmpegSinkOpts::new(&plan.output);
    opts.preset = match cfg.render.caption_mode {
        CaptionMode::Watermark { .. } => cfg.encoder.watermark_preset.clone(),
        _ => cfg.encoder.preset.clone(),
    };
    let mut sink = FfmpegSink::new(opts);
    let stats = compositor.render(&job, &mut background, &mut sink, &ctx.cancel)?;
    timer.done();

    tracing::info!(
        output = %plan.output.display(),
        frames = stats.frames,
        secs = stats.elapsed.as_secs_f64(),
        "job finished"
    );
    Ok(JobReport {
        project: project.name.clone(),
        variant: variant.label().to_string(),
        output: plan.output,
        duration_s: job.duration_s(),
        loops: job.track.loops(),
        clips_used: plan.clips.len(),
        clips_skipped: plan.skipped.len(),
        words: plan.words.len(),
        stats,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/session/job.rs"]
mod tests;
