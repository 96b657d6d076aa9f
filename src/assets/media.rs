use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{AudioSyncError, ClipLoadError, ReelError, ReelResult};

/// Sample rate narration audio is decoded to before muxing.
pub const NARRATION_SAMPLE_RATE: u32 = 48_000;

#[derive(Clone, Debug, PartialEq)]
/// Basic metadata about a source video file.
pub struct VideoSourceInfo {
    /// Source path used for probing/decoding.
    pub source_path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Container duration in seconds.
    pub duration_s: f64,
    /// Average frame rate of the video stream, when reported.
    pub frame_rate: Option<f64>,
    /// Whether ffprobe detected at least one audio stream.
    pub has_audio: bool,
}

#[derive(Clone, Debug)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.interleaved_f32.len() / usize::from(self.channels)
    }

    /// Duration in seconds derived from the decoded sample count.
    pub fn duration_s(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Cut the PCM to at most `secs` seconds.
    pub fn truncate_to_secs(&mut self, secs: f64) {
        let frames = (secs.max(0.0) * f64::from(self.sample_rate)).round() as usize;
        let len = frames.saturating_mul(usize::from(self.channels));
        self.interleaved_f32.truncate(len);
    }
}

/// Probe source video metadata through `ffprobe`.
pub fn probe_video(source_path: &Path) -> Result<VideoSourceInfo, ClipLoadError> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        duration: Option<String>,
        avg_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    if !source_path.is_file() {
        return Err(ClipLoadError::Missing {
            path: source_path.to_path_buf(),
        });
    }
    let probe_err = |reason: String| ClipLoadError::Probe {
        path: source_path.to_path_buf(),
        reason,
    };

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| probe_err(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(probe_err(
            String::from_utf8_lossy(&out.stderr).trim().to_string(),
        ));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| probe_err(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ClipLoadError::NoVideoStream {
            path: source_path.to_path_buf(),
        })?;
    let bad = |reason: &str| ClipLoadError::BadGeometry {
        path: source_path.to_path_buf(),
        reason: reason.to_string(),
    };
    let width = video_stream
        .width
        .filter(|&w| w > 0)
        .ok_or_else(|| bad("missing or zero video width"))?;
    let height = video_stream
        .height
        .filter(|&h| h > 0)
        .ok_or_else(|| bad("missing or zero video height"))?;

    // Container duration is authoritative; some muxers only report it per stream.
    let duration_s = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            video_stream
                .duration
                .as_deref()
                .and_then(|d| d.parse::<f64>().ok())
        })
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| bad("missing or non-positive duration"))?;

    let frame_rate = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rational);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_s,
        frame_rate,
        has_audio,
    })
}

/// Parse an ffprobe rational such as `30000/1001`. `0/0` yields `None`.
pub(crate) fn parse_rational(s: &str) -> Option<f64> {
    let (num, den) = match s.split_once('/') {
        Some((n, d)) => (n.trim().parse::<f64>().ok()?, d.trim().parse::<f64>().ok()?),
        None => (s.trim().parse::<f64>().ok()?, 1.0),
    };
    if den == 0.0 {
        return None;
    }
    let v = num / den;
    (v.is_finite() && v > 0.0).then_some(v)
}

/// Decode audio from a media source to stereo interleaved `f32` PCM.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> Result<AudioPcm, AudioSyncError> {
    if !path.is_file() {
        return Err(AudioSyncError::Missing {
            path: path.to_path_buf(),
        });
    }
    let unreadable = |reason: String| AudioSyncError::Unreadable {
        path: path.to_path_buf(),
        reason,
    };

    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| unreadable(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(unreadable(
            String::from_utf8_lossy(&out.stderr).trim().to_string(),
        ));
    }
    if !out.stdout.len().is_multiple_of(4) {
        return Err(unreadable(
            "decoded audio byte length is not aligned to f32 samples".to_string(),
        ));
    }

    let mut pcm = Vec::<f32>::with_capacity(out.stdout.len() / 4);
    for chunk in out.stdout.chunks_exact(4) {
        pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: pcm,
    })
}

/// Write interleaved samples as raw little-endian `f32` for the encoder's audio input.
pub(crate) fn write_pcm_f32le(samples_interleaved: &[f32], out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::encode(format!(
                "failed to create audio temp directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        ReelError::encode(format!(
            "failed to write narration pcm '{}': {e}",
            out_path.display()
        ))
    })
}

/// Probing and decoding of a job's input files.
pub trait MediaProbe: Send + Sync {
    /// Metadata of a background clip.
    fn probe_video(&self, path: &Path) -> Result<VideoSourceInfo, ClipLoadError>;

    /// Narration audio as interleaved stereo `f32` at `sample_rate`.
    fn decode_narration(&self, path: &Path, sample_rate: u32) -> Result<AudioPcm, AudioSyncError>;
}

/// [`MediaProbe`] backed by the `ffprobe` and `ffmpeg` executables.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegProbe;

impl MediaProbe for FfmpegProbe {
    fn probe_video(&self, path: &Path) -> Result<VideoSourceInfo, ClipLoadError> {
        probe_video(path)
    }

    fn decode_narration(&self, path: &Path, sample_rate: u32) -> Result<AudioPcm, AudioSyncError> {
        decode_audio_f32_stereo(path, sample_rate)
    }
}

/// Sequential decoder for one source window of a clip.
///
/// Spawns `ffmpeg` once, seeks to `start_s`, applies `filter` (scale/crop), resamples to the
/// output frame rate and yields raw straight-alpha RGBA8 frames of exactly `canvas` size.
/// Embedded audio is always dropped.
pub struct VideoFrameStream {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    frame_len: usize,
    source: PathBuf,
    frames_read: u64,
}

impl VideoFrameStream {
    /// Start decoding `source` from `start_s` for `duration_s` seconds.
    pub fn open(
        source: &Path,
        start_s: f64,
        duration_s: f64,
        filter: &str,
        canvas: Canvas,
        fps: Fps,
    ) -> ReelResult<Self> {
        let vf = format!("{filter},fps={}/{}", fps.num, fps.den);
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-ss", &format!("{:.6}", start_s.max(0.0))])
            .arg("-i")
            .arg(source)
            .args([
                "-t",
                &format!("{:.6}", duration_s.max(0.0)),
                "-an",
                "-vf",
                &vf,
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelError::encode(format!(
                    "failed to spawn ffmpeg decoder for '{}': {e}",
                    source.display()
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        Ok(Self {
            child: Some(child),
            stdout: Some(stdout),
            stderr_drain: Some(stderr_drain),
            frame_len: canvas.frame_len(),
            source: source.to_path_buf(),
            frames_read: 0,
        })
    }

    /// Read the next frame into `dst`. Returns `Ok(false)` at end of stream.
    pub fn next_frame(&mut self, dst: &mut Vec<u8>) -> ReelResult<bool> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(false);
        };
        dst.resize(self.frame_len, 0);
        match stdout.read_exact(dst) {
            Ok(()) => {
                self.frames_read += 1;
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.finish()?;
                Ok(false)
            }
            Err(e) => Err(ReelError::encode(format!(
                "failed reading decoded frames from '{}': {e}",
                self.source.display()
            ))),
        }
    }

    /// Frames successfully read so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    fn finish(&mut self) -> ReelResult<()> {
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| ReelError::encode(format!("failed to wait for ffmpeg decoder: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::encode("ffmpeg stderr drain thread panicked"))?
                .unwrap_or_default(),
            None => Vec::new(),
        };
        if !status.success() && self.frames_read == 0 {
            return Err(ReelError::encode(format!(
                "ffmpeg decode of '{}' exited with status {}: {}",
                self.source.display(),
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }
}

impl Drop for VideoFrameStream {
    fn drop(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

/// Return `true` when `tool -version` runs successfully from `PATH`.
pub fn is_tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
