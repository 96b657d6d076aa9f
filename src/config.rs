//! Engine configuration loaded from TOML.
//!
//! Every field has a default, so an empty or missing file yields a working setup.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::fonts::FontSet;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::normalize::canvas::NormalizeOptions;
use crate::render::motion::ScaleCurve;
use crate::text::locale::LocaleTable;

/// Root directories used by batch and single-project runs.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// One subdirectory per project.
    pub videos: PathBuf,
    /// Rendered outputs, `{result}/{project}/...`.
    pub result: PathBuf,
    /// Job scratch space, `{temp}/{project}/{code}/...`.
    pub temp: PathBuf,
    /// Per-project log files.
    pub logs: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            videos: PathBuf::from("videos"),
            result: PathBuf::from("result"),
            temp: PathBuf::from("temp"),
            logs: PathBuf::from("logs"),
        }
    }
}

/// What is drawn over the background.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CaptionMode {
    /// Word-by-word captions timed to the narration.
    #[default]
    Words,
    /// One static line for the whole video; no narration, background at natural length.
    Watermark {
        /// Watermark text.
        text: String,
    },
    /// Background only.
    Off,
}

impl CaptionMode {
    /// Whether jobs in this mode need narration audio.
    pub fn needs_narration(&self) -> bool {
        !matches!(self, CaptionMode::Watermark { .. })
    }

    /// Whether jobs in this mode need a caption file.
    pub fn needs_captions(&self) -> bool {
        matches!(self, CaptionMode::Words)
    }
}

/// Per-render toggles.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Slow zoom on the background, reset at each clip boundary.
    pub zoom: bool,
    /// Scale-in animation on each word.
    pub pop_in: bool,
    /// Overlay mode.
    pub caption_mode: CaptionMode,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            zoom: false,
            pop_in: true,
            caption_mode: CaptionMode::Words,
        }
    }
}

impl RenderOptions {
    /// Background zoom curve.
    pub fn zoom_curve(&self) -> ScaleCurve {
        ScaleCurve::zoom_if(self.zoom)
    }

    /// Word pop-in curve.
    pub fn pop_in_curve(&self) -> ScaleCurve {
        ScaleCurve::pop_in_if(self.pop_in)
    }
}

/// External speech synthesis command.
///
/// `command` is a program followed by its arguments; `{text}`, `{voice}` and `{out}` are
/// substituted per job. An empty command disables synthesis.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Program and argument template.
    pub command: Vec<String>,
    /// Outputs at or below this size are treated as failed synthesis.
    pub min_bytes: u64,
    /// Voice for untranslated single-variant jobs.
    pub default_voice: String,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        let command = [
            "edge-tts",
            "--text",
            "{text}",
            "--voice",
            "{voice}",
            "--write-media",
            "{out}",
        ];
        Self {
            command: command.iter().map(|s| s.to_string()).collect(),
            min_bytes: 1000,
            default_voice: "en-US-ChristopherNeural".to_string(),
        }
    }
}

/// x264 settings.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Preset for narrated jobs.
    pub preset: String,
    /// Preset for watermark jobs.
    pub watermark_preset: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            preset: "medium".to_string(),
            watermark_preset: "ultrafast".to_string(),
        }
    }
}

/// Full engine configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory roots.
    pub paths: PathsConfig,
    /// Output canvas.
    pub canvas: Canvas,
    /// Output frame rate (integer fps).
    pub fps: u32,
    /// Overlay and motion toggles.
    pub render: RenderOptions,
    /// Clip normalization tunables.
    pub normalize: NormalizeOptions,
    /// Script font assets.
    pub fonts: FontSet,
    /// Allow the system font stage of the fallback chain.
    pub system_fonts: bool,
    /// Speech synthesis command.
    pub narration: NarrationConfig,
    /// Encoder settings.
    pub encoder: EncoderConfig,
    /// Target languages.
    pub languages: LocaleTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            canvas: Canvas::PORTRAIT_1080,
            fps: 30,
            render: RenderOptions::default(),
            normalize: NormalizeOptions::default(),
            fonts: FontSet::in_dir(Path::new("content")),
            system_fonts: true,
            narration: NarrationConfig::default(),
            encoder: EncoderConfig::default(),
            languages: LocaleTable::default(),
        }
    }
}

impl EngineConfig {
    /// Load `path`, or defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("failed to parse config '{}'", path.display()))
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let cfg: Self = toml::from_str(content).context("invalid engine config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Output frame rate.
    pub fn fps(&self) -> ReelResult<Fps> {
        Fps::integer(self.fps)
    }

    /// Reject values no job could render with.
    pub fn validate(&self) -> ReelResult<()> {
        self.canvas.validate()?;
        self.fps()?;
        self.languages.validate()?;
        let n = &self.normalize;
        if !n.overscale.is_finite() || n.overscale < 1.0 {
            return Err(ReelError::validation(format!(
                "normalize.overscale must be >= 1, got {}",
                n.overscale
            )));
        }
        // A trimmed clip must keep a positive duration.
        let trim_ok =
            n.tail_trim_s == 0.0 || (n.tail_trim_s > 0.0 && n.tail_trim_s < n.tail_trim_min_s);
        if !trim_ok {
            return Err(ReelError::validation(format!(
                "normalize.tail_trim_s must be >= 0 and below tail_trim_min_s, got {}",
                n.tail_trim_s
            )));
        }
        if let CaptionMode::Watermark { text } = &self.render.caption_mode
            && text.trim().is_empty()
        {
            return Err(ReelError::validation("watermark text must not be empty"));
        }
        if let Some(program) = self.narration.command.first()
            && program.trim().is_empty()
        {
            return Err(ReelError::validation("narration command program is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
