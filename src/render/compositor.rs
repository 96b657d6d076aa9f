//! Frame-by-frame composition of background, word overlays and narration.
//!
//! Frames are produced on the calling thread and handed to an encoder thread over a bounded
//! channel, so decoding/compositing and `ffmpeg` encoding overlap.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::assets::media::{VideoFrameStream, write_pcm_f32le};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::frame::{FrameRGBA, image_paint, premultiply_decoded};
use crate::render::motion::{ScaleCurve, scale_about};
use crate::text::glyph::GlyphRenderer;
use crate::text::locale::Locale;
use crate::timeline::captions::{WordEvent, active_event_index};
use crate::timeline::reconcile::ReconciledTrack;
use crate::timeline::track::{AudioAsset, TrackSegment};

const ENCODER_CHANNEL_CAPACITY: usize = 4;
const CANCEL_CHECK_INTERVAL: u64 = 15;

/// What is drawn over the background.
#[derive(Clone, Debug)]
pub enum OverlayPlan {
    /// One word at a time, following the caption timeline.
    Words(Vec<WordEvent>),
    /// A single text shown for the whole video.
    Watermark {
        /// Text to draw.
        text: String,
        /// Script rules for the text.
        locale: Locale,
    },
    /// Background only.
    None,
}

/// Everything needed to render one output video.
///
/// The background is a [`ReconciledTrack`], so a job always matches its narration length.
#[derive(Clone, Debug)]
pub struct RenderJob {
    /// Label used in logs and temp paths (e.g. `project/es`).
    pub label: String,
    /// Output frame size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Background cut to the job duration.
    pub track: ReconciledTrack,
    /// Narration muxed into the output.
    pub audio: Option<AudioAsset>,
    /// Overlays.
    pub overlay: OverlayPlan,
    /// Background scale over clip-local time.
    pub zoom: ScaleCurve,
    /// Word scale over word-local time.
    pub pop_in: ScaleCurve,
    /// Job-private scratch directory.
    pub temp_dir: PathBuf,
}

impl RenderJob {
    /// Output duration in seconds.
    pub fn duration_s(&self) -> f64 {
        self.track.duration_s()
    }

    /// Number of output frames, `ceil(duration * fps)`.
    pub fn total_frames(&self) -> u64 {
        self.fps.secs_to_frames_ceil(self.duration_s())
    }
}

/// Summary of one render.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderStats {
    /// Frames delivered to the sink.
    pub frames: u64,
    /// Output duration in seconds.
    pub duration_s: f64,
    /// Overlay bitmaps rasterized.
    pub overlays_rendered: u64,
    /// Background segments opened for decoding.
    pub segments_opened: u64,
    /// Wall-clock render time.
    pub elapsed: Duration,
}

/// Supplies background frames in timeline order.
pub trait BackgroundSource {
    /// Write the frame of `segment` (index `seg_idx`) at `offset_s` into `dst` as premultiplied
    /// RGBA8.
    ///
    /// `dst` holds the previous frame on entry; leaving it untouched repeats that frame.
    fn frame(
        &mut self,
        seg_idx: usize,
        segment: &TrackSegment,
        offset_s: f64,
        dst: &mut Vec<u8>,
    ) -> ReelResult<()>;

    /// Segments opened so far.
    fn segments_opened(&self) -> u64 {
        0
    }
}

/// Decodes segments through `ffmpeg`, one stream per segment.
pub struct FfmpegBackground {
    canvas: Canvas,
    fps: Fps,
    current: Option<(usize, VideoFrameStream)>,
    scratch: Vec<u8>,
    opened: u64,
}

impl FfmpegBackground {
    /// Background decoder for `canvas` at `fps`.
    pub fn new(canvas: Canvas, fps: Fps) -> Self {
        Self {
            canvas,
            fps,
            current: None,
            scratch: Vec::new(),
            opened: 0,
        }
    }
}

impl BackgroundSource for FfmpegBackground {
    fn frame(
        &mut self,
        seg_idx: usize,
        segment: &TrackSegment,
        offset_s: f64,
        dst: &mut Vec<u8>,
    ) -> ReelResult<()> {
        let needs_open = !matches!(&self.current, Some((idx, _)) if *idx == seg_idx);
        if needs_open {
            // Drop the previous decoder before spawning the next one.
            self.current = None;
            let stream = VideoFrameStream::open(
                &segment.clip.path,
                segment.source_start_s + offset_s,
                (segment.duration_s - offset_s).max(0.0) + self.fps.frame_duration_secs(),
                &segment.clip.geometry.ffmpeg_filter(),
                self.canvas,
                self.fps,
            )?;
            tracing::debug!(
                segment = seg_idx,
                clip = %segment.clip.path.display(),
                start_s = segment.source_start_s + offset_s,
                "decoding background segment"
            );
            self.opened += 1;
            self.current = Some((seg_idx, stream));
        }

        let Some((_, stream)) = self.current.as_mut() else {
            return Ok(());
        };
        if stream.next_frame(&mut self.scratch)? {
            premultiply_decoded(&mut self.scratch);
            std::mem::swap(dst, &mut self.scratch);
        } else {
            tracing::trace!(segment = seg_idx, "decoder ran dry, holding last frame");
        }
        Ok(())
    }

    fn segments_opened(&self) -> u64 {
        self.opened
    }
}

/// Flat color background for previews and tests.
#[derive(Clone, Copy, Debug)]
pub struct SolidBackground {
    /// Opaque RGB fill.
    pub rgb: [u8; 3],
}

impl BackgroundSource for SolidBackground {
    fn frame(
        &mut self,
        _seg_idx: usize,
        _segment: &TrackSegment,
        _offset_s: f64,
        dst: &mut Vec<u8>,
    ) -> ReelResult<()> {
        let [r, g, b] = self.rgb;
        for px in dst.chunks_exact_mut(4) {
            px.copy_from_slice(&[r, g, b, 255]);
        }
        Ok(())
    }
}

/// Removes a temporary file when dropped.
struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

struct ActiveOverlay {
    key: usize,
    image: vello_cpu::Image,
    start_s: f64,
}

/// Composites jobs into a [`FrameSink`].
pub struct Compositor {
    glyphs: GlyphRenderer,
}

impl Compositor {
    /// Compositor drawing overlays with `glyphs`.
    pub fn new(glyphs: GlyphRenderer) -> Self {
        Self { glyphs }
    }

    /// Render `job` into `sink`.
    ///
    /// On any failure, including cancellation, the sink is aborted so no partial output remains.
    #[tracing::instrument(skip_all, fields(job = %job.label))]
    pub fn render(
        &mut self,
        job: &RenderJob,
        background: &mut dyn BackgroundSource,
        sink: &mut dyn FrameSink,
        cancel: &CancelToken,
    ) -> ReelResult<RenderStats> {
        if job.canvas != self.glyphs.canvas() {
            return Err(ReelError::validation(
                "glyph renderer canvas does not match job canvas",
            ));
        }
        let started = Instant::now();
        let total_frames = job.total_frames();
        if total_frames == 0 {
            return Err(ReelError::validation("render job has zero duration"));
        }

        cancel.check()?;
        let mut audio_tmp = TempFileGuard(None);
        let audio = match job.audio.as_ref() {
            Some(audio) => {
                let path = job.temp_dir.join("narration.f32le");
                let cfg = stage_audio(audio, job.duration_s(), &path)?;
                audio_tmp.0 = Some(path);
                Some(cfg)
            }
            None => None,
        };

        let cfg = SinkConfig {
            canvas: job.canvas,
            fps: job.fps,
            total_frames,
            audio,
        };
        tracing::info!(
            frames = total_frames,
            duration_s = job.duration_s(),
            segments = job.track.track().segments().len(),
            "render started"
        );

        let mut overlays_rendered = 0u64;
        let outcome = std::thread::scope(|scope| {
            let (tx, rx) = mpsc::sync_channel::<(FrameIndex, FrameRGBA)>(ENCODER_CHANNEL_CAPACITY);
            let sink_ref = &mut *sink;
            let dispatch = tracing::dispatcher::get_default(|d| d.clone());

            let enc = scope.spawn(move || -> ReelResult<u64> {
                tracing::dispatcher::with_default(&dispatch, || {
                    sink_ref.begin(cfg)?;
                    let mut pushed = 0u64;
                    for (idx, frame) in rx {
                        sink_ref.push_frame(idx, &frame)?;
                        pushed += 1;
                    }
                    Ok(pushed)
                })
            });

            let produced = self.produce_frames(
                job,
                total_frames,
                background,
                cancel,
                &tx,
                &mut overlays_rendered,
            );
            drop(tx);

            let pushed = enc
                .join()
                .map_err(|_| ReelError::encode("encoder thread panicked"))?;
            match (produced, pushed) {
                (Err(ReelError::Cancelled), _) => Err(ReelError::Cancelled),
                (_, Err(e)) => Err(e),
                (Err(e), Ok(_)) => Err(e),
                (Ok(()), Ok(n)) => Ok(n),
            }
        });

        let frames = match outcome.and_then(|n| sink.end().map(|()| n)) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "render failed, discarding output");
                sink.abort();
                return Err(e);
            }
        };

        let stats = RenderStats {
            frames,
            duration_s: job.duration_s(),
            overlays_rendered,
            segments_opened: background.segments_opened(),
            elapsed: started.elapsed(),
        };
        tracing::info!(
            frames = stats.frames,
            overlays = stats.overlays_rendered,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "render finished"
        );
        Ok(stats)
    }

    fn produce_frames(
        &mut self,
        job: &RenderJob,
        total_frames: u64,
        background: &mut dyn BackgroundSource,
        cancel: &CancelToken,
        tx: &mpsc::SyncSender<(FrameIndex, FrameRGBA)>,
        overlays_rendered: &mut u64,
    ) -> ReelResult<()> {
        let canvas = job.canvas;
        let segments = job.track.track().segments();
        let mut bg = opaque_black(canvas);
        let mut overlay: Option<ActiveOverlay> = None;

        if let OverlayPlan::Watermark { text, locale } = &job.overlay {
            let bmp = self.glyphs.render(text, locale)?;
            *overlays_rendered += 1;
            overlay = Some(ActiveOverlay {
                key: 0,
                image: image_paint(&bmp.rgba8_premul, bmp.width, bmp.height)?,
                start_s: 0.0,
            });
        }

        for i in 0..total_frames {
            if i % CANCEL_CHECK_INTERVAL == 0 {
                cancel.check()?;
            }
            let t = job.fps.frames_to_secs(i);

            let (seg_idx, offset_s) = job
                .track
                .track()
                .locate(t)
                .ok_or_else(|| ReelError::validation("background track has no segments"))?;
            let segment = &segments[seg_idx];
            background.frame(seg_idx, segment, offset_s, &mut bg)?;
            let zoom = job.zoom.factor(segment.source_start_s + offset_s);

            if let OverlayPlan::Words(events) = &job.overlay {
                let active = active_event_index(events, t);
                let stale = match (&overlay, active) {
                    (Some(o), Some(k)) => o.key != k,
                    (None, Some(_)) => true,
                    (_, None) => false,
                };
                if active.is_none() {
                    overlay = None;
                } else if stale && let Some(k) = active {
                    let event = &events[k];
                    let bmp = self.glyphs.render(&event.text, &event.locale)?;
                    *overlays_rendered += 1;
                    overlay = Some(ActiveOverlay {
                        key: k,
                        image: image_paint(&bmp.rgba8_premul, bmp.width, bmp.height)?,
                        start_s: event.start_s,
                    });
                }
            }

            let frame = match &overlay {
                Some(o) => {
                    let pop = match job.overlay {
                        OverlayPlan::Words(_) => job.pop_in.factor(t - o.start_s),
                        _ => 1.0,
                    };
                    compose_frame(canvas, &bg, zoom, Some((&o.image, pop)))?
                }
                None => compose_frame(canvas, &bg, zoom, None)?,
            };

            tx.send((FrameIndex(i), frame))
                .map_err(|_| ReelError::encode("encoder stopped before all frames were sent"))?;

            if total_frames >= 10 && (i + 1) % (total_frames / 10) == 0 {
                tracing::debug!(frame = i + 1, total = total_frames, "render progress");
            }
        }
        Ok(())
    }
}

fn opaque_black(canvas: Canvas) -> Vec<u8> {
    let mut v = vec![0u8; canvas.frame_len()];
    for px in v.chunks_exact_mut(4) {
        px[3] = 255;
    }
    v
}

fn compose_frame(
    canvas: Canvas,
    bg: &[u8],
    zoom: f64,
    overlay: Option<(&vello_cpu::Image, f64)>,
) -> ReelResult<FrameRGBA> {
    if overlay.is_none() && (zoom - 1.0).abs() < 1e-9 {
        return Ok(FrameRGBA {
            width: canvas.width,
            height: canvas.height,
            data: bg.to_vec(),
            premultiplied: true,
        });
    }

    let (w16, h16) = canvas.as_u16()?;
    let (cx, cy) = canvas.center();
    let full = vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(canvas.width), f64::from(canvas.height));

    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(scale_about(zoom, cx, cy));
    ctx.set_paint(image_paint(bg, canvas.width, canvas.height)?);
    ctx.fill_rect(&full);

    if let Some((image, scale)) = overlay {
        ctx.set_transform(scale_about(scale, cx, cy));
        ctx.set_paint(image.clone());
        ctx.fill_rect(&full);
    }
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
    ctx.render_to_pixmap(&mut pixmap);
    Ok(FrameRGBA {
        width: canvas.width,
        height: canvas.height,
        data: pixmap.data_as_u8_slice().to_vec(),
        premultiplied: true,
    })
}

fn stage_audio(audio: &AudioAsset, duration_s: f64, path: &Path) -> ReelResult<AudioInputConfig> {
    let mut pcm = audio.pcm.as_ref().clone();
    pcm.truncate_to_secs(duration_s);
    write_pcm_f32le(&pcm.interleaved_f32, path)?;
    tracing::debug!(path = %path.display(), seconds = pcm.duration_s(), "narration staged");
    Ok(AudioInputConfig {
        path: path.to_path_buf(),
        sample_rate: pcm.sample_rate,
        channels: pcm.channels,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
