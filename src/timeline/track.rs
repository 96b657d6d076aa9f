use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::media::{AudioPcm, NARRATION_SAMPLE_RATE, decode_audio_f32_stereo};
use crate::foundation::error::{AudioSyncError, ReelError, ReelResult};
use crate::normalize::canvas::MediaClip;

/// A span of one clip placed on the background timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TrackSegment {
    /// Source clip.
    pub clip: Arc<MediaClip>,
    /// Offset into the clip in seconds.
    pub source_start_s: f64,
    /// Seconds of the clip used.
    pub duration_s: f64,
}

/// Contiguous background built from normalized clips.
///
/// Never empty: constructing a track from zero clips fails with `NoUsableClips`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct BackgroundTrack {
    segments: Vec<TrackSegment>,
}

impl BackgroundTrack {
    /// Concatenate whole clips in order.
    pub fn concat(clips: Vec<Arc<MediaClip>>) -> ReelResult<Self> {
        if clips.is_empty() {
            return Err(ReelError::NoUsableClips { attempted: 0 });
        }
        let segments = clips
            .into_iter()
            .map(|clip| TrackSegment {
                source_start_s: 0.0,
                duration_s: clip.duration_s,
                clip,
            })
            .collect();
        Ok(Self { segments })
    }

    pub(crate) fn from_segments(segments: Vec<TrackSegment>) -> Self {
        Self { segments }
    }

    /// Segments in playback order.
    pub fn segments(&self) -> &[TrackSegment] {
        &self.segments
    }

    /// Sum of segment durations.
    pub fn duration_s(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_s).sum()
    }

    /// Timeline start of every segment.
    pub fn segment_starts(&self) -> Vec<f64> {
        let mut t = 0.0;
        self.segments
            .iter()
            .map(|s| {
                let start = t;
                t += s.duration_s;
                start
            })
            .collect()
    }

    /// Index of the segment playing at `t` and the offset into it.
    ///
    /// Times past the end map to the last segment.
    pub fn locate(&self, t: f64) -> Option<(usize, f64)> {
        let mut start = 0.0;
        for (i, seg) in self.segments.iter().enumerate() {
            if t < start + seg.duration_s {
                return Some((i, (t - start).max(0.0)));
            }
            start += seg.duration_s;
        }
        let last = self.segments.len().checked_sub(1)?;
        let last_start = start - self.segments[last].duration_s;
        Some((last, (t - last_start).max(0.0)))
    }
}

/// Narration audio with a known duration.
#[derive(Clone, Debug)]
pub struct AudioAsset {
    /// Source file.
    pub path: PathBuf,
    /// Duration in seconds.
    pub duration_s: f64,
    /// Decoded PCM.
    pub pcm: Arc<AudioPcm>,
}

impl AudioAsset {
    /// Decode `path` and measure its duration.
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, AudioSyncError> {
        let pcm = decode_audio_f32_stereo(path, NARRATION_SAMPLE_RATE)?;
        Self::from_pcm(path, pcm)
    }

    /// Wrap already decoded PCM.
    pub fn from_pcm(path: &Path, pcm: AudioPcm) -> Result<Self, AudioSyncError> {
        let duration_s = pcm.duration_s();
        if !duration_s.is_finite() || duration_s <= 0.0 {
            return Err(AudioSyncError::BadDuration {
                path: path.to_path_buf(),
                duration_s,
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            duration_s,
            pcm: Arc::new(pcm),
        })
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.pcm.sample_rate
    }

    /// Channel count.
    pub fn channels(&self) -> u16 {
        self.pcm.channels
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/track.rs"]
mod tests;
