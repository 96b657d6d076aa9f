//! Probe background clips and map each onto the output canvas.
//!
//! Every clip is scaled uniformly to cover the canvas with a small overscan, then center-cropped
//! to the exact canvas size. The geometry is computed here; `ffmpeg` applies it while decoding.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::media::{VideoSourceInfo, probe_video};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ClipLoadError, ReelError, ReelResult};
use crate::timeline::track::BackgroundTrack;

/// Scale/crop that maps a source frame onto the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CropGeometry {
    /// Width after uniform scaling.
    pub scaled_w: u32,
    /// Height after uniform scaling.
    pub scaled_h: u32,
    /// Left edge of the crop window in the scaled frame.
    pub crop_x: u32,
    /// Top edge of the crop window in the scaled frame.
    pub crop_y: u32,
    /// Crop width (canvas width).
    pub width: u32,
    /// Crop height (canvas height).
    pub height: u32,
}

impl CropGeometry {
    /// Cover `canvas` with a `src_w`x`src_h` frame scaled by `max(W/w, H/h) * overscale`.
    pub fn cover(src_w: u32, src_h: u32, canvas: Canvas, overscale: f64) -> ReelResult<Self> {
        if src_w == 0 || src_h == 0 {
            return Err(ReelError::validation("source dimensions must be non-zero"));
        }
        if !overscale.is_finite() || overscale < 1.0 {
            return Err(ReelError::validation("overscale must be finite and >= 1"));
        }
        let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
        let scale = (cw / f64::from(src_w)).max(ch / f64::from(src_h)) * overscale;

        let scaled_w = even_at_least(f64::from(src_w) * scale, canvas.width);
        let scaled_h = even_at_least(f64::from(src_h) * scale, canvas.height);
        Ok(Self {
            scaled_w,
            scaled_h,
            crop_x: (scaled_w - canvas.width) / 2,
            crop_y: (scaled_h - canvas.height) / 2,
            width: canvas.width,
            height: canvas.height,
        })
    }

    /// `ffmpeg` filter chain that applies this geometry.
    pub fn ffmpeg_filter(&self) -> String {
        format!(
            "scale={}:{}:flags=bicubic,crop={}:{}:{}:{},setsar=1",
            self.scaled_w, self.scaled_h, self.width, self.height, self.crop_x, self.crop_y
        )
    }
}

fn even_at_least(v: f64, min: u32) -> u32 {
    let rounded = ((v / 2.0).round() * 2.0) as u32;
    rounded.max(min)
}

/// Tunables for clip normalization.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Extra scale applied on top of the cover scale.
    pub overscale: f64,
    /// Seconds cut from the end of each clip.
    pub tail_trim_s: f64,
    /// Clips at or below this duration are not trimmed.
    pub tail_trim_min_s: f64,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            overscale: 1.05,
            tail_trim_s: 0.15,
            tail_trim_min_s: 0.2,
        }
    }
}

impl NormalizeOptions {
    /// Usable duration of a clip whose container reports `duration_s`.
    pub fn usable_duration(&self, duration_s: f64) -> f64 {
        if duration_s > self.tail_trim_min_s {
            duration_s - self.tail_trim_s
        } else {
            duration_s
        }
    }
}

/// A probed background clip mapped onto the canvas.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MediaClip {
    /// Source file.
    pub path: PathBuf,
    /// Natural width in pixels.
    pub source_width: u32,
    /// Natural height in pixels.
    pub source_height: u32,
    /// Average source frame rate, when reported.
    pub frame_rate: Option<f64>,
    /// Container duration in seconds.
    pub source_duration_s: f64,
    /// Duration available to the timeline (after tail trim).
    pub duration_s: f64,
    /// Scale/crop onto the canvas.
    pub geometry: CropGeometry,
}

impl MediaClip {
    /// Build a clip from probe output.
    pub fn from_probe(
        info: &VideoSourceInfo,
        canvas: Canvas,
        opts: &NormalizeOptions,
    ) -> Result<Self, ClipLoadError> {
        let bad = |reason: String| ClipLoadError::BadGeometry {
            path: info.source_path.clone(),
            reason,
        };
        if !info.duration_s.is_finite() || info.duration_s <= 0.0 {
            return Err(bad(format!("duration {}", info.duration_s)));
        }
        let geometry = CropGeometry::cover(info.width, info.height, canvas, opts.overscale)
            .map_err(|e| bad(e.to_string()))?;
        Ok(Self {
            path: info.source_path.clone(),
            source_width: info.width,
            source_height: info.height,
            frame_rate: info.frame_rate,
            source_duration_s: info.duration_s,
            duration_s: opts.usable_duration(info.duration_s),
            geometry,
        })
    }
}

/// Clips that survived normalization, in input order.
#[derive(Clone, Debug)]
pub struct NormalizedClips {
    /// Usable clips.
    pub clips: Vec<Arc<MediaClip>>,
    /// Clips that were skipped, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

impl NormalizedClips {
    /// Total usable duration in seconds.
    pub fn total_duration_s(&self) -> f64 {
        self.clips.iter().map(|c| c.duration_s).sum()
    }

    /// Concatenate the clips into one background track.
    pub fn into_track(self) -> ReelResult<BackgroundTrack> {
        BackgroundTrack::concat(self.clips)
    }
}

/// Probe `paths` with `ffprobe` and map each clip onto `canvas`.
///
/// Unloadable clips are logged and skipped. Fails with [`ReelError::NoUsableClips`] when none
/// survive, and with [`ReelError::Cancelled`] when `cancel` fires between clips.
pub fn normalize_clips(
    paths: &[PathBuf],
    canvas: Canvas,
    opts: &NormalizeOptions,
    cancel: &CancelToken,
) -> ReelResult<NormalizedClips> {
    normalize_clips_with(paths, canvas, opts, cancel, probe_video)
}

/// [`normalize_clips`] with a caller-supplied prober.
#[tracing::instrument(skip_all, fields(clips = paths.len()))]
pub fn normalize_clips_with<P>(
    paths: &[PathBuf],
    canvas: Canvas,
    opts: &NormalizeOptions,
    cancel: &CancelToken,
    mut probe: P,
) -> ReelResult<NormalizedClips>
where
    P: FnMut(&Path) -> Result<VideoSourceInfo, ClipLoadError>,
{
    canvas.validate()?;
    let mut clips = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();

    for path in paths {
        cancel.check()?;
        let loaded = probe(path).and_then(|info| {
            if info.width == 0 || info.height == 0 {
                return Err(ClipLoadError::NoVideoStream { path: path.clone() });
            }
            MediaClip::from_probe(&info, canvas, opts)
        });
        match loaded {
            Ok(clip) => {
                tracing::debug!(
                    path = %clip.path.display(),
                    duration_s = clip.duration_s,
                    scaled_w = clip.geometry.scaled_w,
                    scaled_h = clip.geometry.scaled_h,
                    "clip normalized"
                );
                clips.push(Arc::new(clip));
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping background clip");
                skipped.push((path.clone(), e.to_string()));
            }
        }
    }

    if clips.is_empty() {
        return Err(ReelError::NoUsableClips {
            attempted: paths.len(),
        });
    }
    tracing::info!(
        usable = clips.len(),
        skipped = skipped.len(),
        "background clips normalized"
    );
    Ok(NormalizedClips { clips, skipped })
}

#[cfg(test)]
#[path = "../../tests/unit/normalize/canvas.rs"]
mod tests;
