//! Reelsmith assembles narrated vertical short videos.
//!
//! A job takes a project's background clips, narration audio and caption sentences and
//! produces one MP4:
//!
//! - Clips are probed and mapped onto the portrait canvas ([`normalize_clips`])
//! - The background loops or trims to the narration length ([`reconcile`])
//! - Captions become word events over even time slices ([`build_word_events`])
//! - Each word is rasterized with script-aware layout ([`GlyphRenderer`])
//! - Frames are composited and streamed to `ffmpeg` ([`Compositor`])
//!
//! [`run_job`] and [`run_batch`] drive the whole pipeline from an [`EngineConfig`].
#![forbid(unsafe_code)]

mod assets;
mod foundation;

/// Engine configuration.
pub mod config;
/// Encoding sinks.
pub mod encode;
pub(crate) mod normalize;
/// Project inputs and collaborators.
pub mod project;
/// Frame compositing.
pub mod render;
/// Job and batch orchestration.
pub mod session;
pub(crate) mod text;
pub(crate) mod timeline;

pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Rgba8};
pub use crate::foundation::error::{
    AudioSyncError, ClipLoadError, FontLoadError, ReelError, ReelResult,
};

pub use crate::assets::fonts::{FontOrigin, FontResolver, FontSet, OutlineFont, ResolvedFont};
pub use crate::assets::media::{AudioPcm, FfmpegProbe, MediaProbe, VideoSourceInfo, probe_video};
pub use crate::config::{CaptionMode, EngineConfig, RenderOptions};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::normalize::canvas::{
    CropGeometry, MediaClip, NormalizeOptions, NormalizedClips, normalize_clips,
    normalize_clips_with,
};
pub use crate::project::collab::{
    CommandNarration, IdentityTranslator, LocalizedCaptionFiles, NarrationChain, NarrationRequest,
    NarrationSource, PrerecordedNarration, Translator,
};
pub use crate::project::layout::{OutputLayout, ProjectInputs, discover_projects};
pub use crate::render::compositor::{
    BackgroundSource, Compositor, FfmpegBackground, OverlayPlan, RenderJob, RenderStats,
    SolidBackground,
};
pub use crate::render::frame::FrameRGBA;
pub use crate::render::motion::ScaleCurve;
pub use crate::session::batch::{
    BatchOptions, BatchReport, JobFailure, PlanReport, plan_project, run_batch,
};
pub use crate::session::job::{JobContext, JobPlan, JobReport, JobVariant, plan_job, run_job};
pub use crate::session::telemetry::{JobTelemetry, StageTimer, init_tracing};
pub use crate::text::glyph::{GlyphBitmap, GlyphRenderer, GlyphStyle};
pub use crate::text::locale::{LanguageEntry, Locale, LocaleTable, ScriptFamily};
pub use crate::text::reshape::{DisplayText, prepare_display_text};
pub use crate::timeline::captions::{
    CaptionSentence, TimingPolicy, WordEvent, active_event, active_event_index,
    build_word_events, build_word_events_with,
};
pub use crate::timeline::reconcile::{ReconciledTrack, loop_count, reconcile, without_narration};
pub use crate::timeline::track::{AudioAsset, BackgroundTrack, TrackSegment};
