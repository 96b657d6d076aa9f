use crate::foundation::error::AudioSyncError;
use crate::timeline::track::{AudioAsset, BackgroundTrack, TrackSegment};

/// Background track cut to exactly the narration length.
///
/// Only [`reconcile`] builds one, so a render job can never hold an unreconciled track.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ReconciledTrack {
    track: BackgroundTrack,
    duration_s: f64,
    loops: u32,
}

impl ReconciledTrack {
    /// The looped and trimmed track.
    pub fn track(&self) -> &BackgroundTrack {
        &self.track
    }

    /// Final duration; equals the audio duration.
    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    /// How many times the source track was repeated.
    pub fn loops(&self) -> u32 {
        self.loops
    }
}

/// Number of whole repetitions of a `track_s` long track needed to cover `audio_s`.
pub fn loop_count(track_s: f64, audio_s: f64) -> Result<u32, AudioSyncError> {
    if !track_s.is_finite() || track_s <= 0.0 {
        return Err(AudioSyncError::EmptyTrack);
    }
    if audio_s <= track_s {
        return Ok(1);
    }
    let loops = (audio_s / track_s).ceil();
    if !loops.is_finite() || loops > f64::from(u32::MAX) {
        return Err(AudioSyncError::EmptyTrack);
    }
    Ok(loops as u32)
}

/// Loop `track` until it covers the narration, then cut the tail to the narration length.
#[tracing::instrument(skip_all, fields(audio = %audio.path.display()))]
pub fn reconcile(
    track: BackgroundTrack,
    audio: &AudioAsset,
) -> Result<ReconciledTrack, AudioSyncError> {
    let target = audio.duration_s;
    if !target.is_finite() || target <= 0.0 {
        return Err(AudioSyncError::BadDuration {
            path: audio.path.clone(),
            duration_s: target,
        });
    }
    let source_s = track.duration_s();
    let loops = loop_count(source_s, target)?;

    let mut segments: Vec<TrackSegment> = Vec::new();
    let mut covered = 0.0;
    'outer: for _ in 0..loops {
        for seg in track.segments() {
            let remaining = target - covered;
            if remaining <= 0.0 {
                break 'outer;
            }
            if seg.duration_s >= remaining {
                segments.push(TrackSegment {
                    duration_s: remaining,
                    ..seg.clone()
                });
                covered = target;
                break 'outer;
            }
            segments.push(seg.clone());
            covered += seg.duration_s;
        }
    }

    tracing::info!(
        source_s,
        audio_s = target,
        loops,
        looped_s = source_s * f64::from(loops),
        segments = segments.len(),
        "background reconciled to narration"
    );
    Ok(ReconciledTrack {
        track: BackgroundTrack::from_segments(segments),
        duration_s: target,
        loops,
    })
}

/// Keep `track` at its natural length, for jobs without narration.
pub fn without_narration(track: BackgroundTrack) -> ReconciledTrack {
    let duration_s = track.duration_s();
    ReconciledTrack {
        track,
        duration_s,
        loops: 1,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/reconcile.rs"]
mod tests;
