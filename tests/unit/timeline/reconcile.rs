use super::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::media::AudioPcm;
use crate::foundation::core::Canvas;
use crate::normalize::canvas::{CropGeometry, MediaClip};

fn clip(name: &str, duration_s: f64) -> Arc<MediaClip> {
    Arc::new(MediaClip {
        path: PathBuf::from(name),
        source_width: 1920,
        source_height: 1080,
        frame_rate: None,
        source_duration_s: duration_s,
        duration_s,
        geometry: CropGeometry::cover(1920, 1080, Canvas::PORTRAIT_1080, 1.05).unwrap(),
    })
}

fn audio(duration_s: f64) -> AudioAsset {
    let rate = 1000;
    let frames = (duration_s * f64::from(rate)).round() as usize;
    AudioAsset::from_pcm(
        Path::new("narration.mp3"),
        AudioPcm {
            sample_rate: rate,
            channels: 2,
            interleaved_f32: vec![0.0; frames * 2],
        },
    )
    .unwrap()
}

#[test]
fn ten_seconds_over_four_loops_three_times_then_trims() {
    assert_eq!(loop_count(4.0, 10.0).unwrap(), 3);
    assert_eq!(4.0 * f64::from(loop_count(4.0, 10.0).unwrap()), 12.0);

    let track = BackgroundTrack::concat(vec![clip("a", 4.0)]).unwrap();
    let out = reconcile(track, &audio(10.0)).unwrap();
    assert_eq!(out.loops(), 3);
    assert_eq!(out.duration_s(), 10.0);
    assert!((out.track().duration_s() - 10.0).abs() < 1e-9);

    let segs = out.track().segments();
    assert_eq!(segs.len(), 3);
    assert!((segs[2].duration_s - 2.0).abs() < 1e-9);
    assert_eq!(segs[2].source_start_s, 0.0);
}

#[test]
fn longer_track_is_cut_never_extended() {
    let track = BackgroundTrack::concat(vec![clip("a", 3.0), clip("b", 5.0)]).unwrap();
    let out = reconcile(track, &audio(4.0)).unwrap();
    assert_eq!(out.loops(), 1);
    let segs = out.track().segments();
    assert_eq!(segs.len(), 2);
    assert_eq!(segs[0].duration_s, 3.0);
    assert!((segs[1].duration_s - 1.0).abs() < 1e-9);
}

#[test]
fn exact_multiple_needs_no_partial_segment() {
    assert_eq!(loop_count(4.0, 8.0).unwrap(), 2);
    let track = BackgroundTrack::concat(vec![clip("a", 4.0)]).unwrap();
    let out = reconcile(track, &audio(8.0)).unwrap();
    assert_eq!(out.track().segments().len(), 2);
    assert!((out.track().duration_s() - 8.0).abs() < 1e-9);
}

#[test]
fn loops_preserve_clip_order() {
    let track = BackgroundTrack::concat(vec![clip("a", 1.0), clip("b", 1.0)]).unwrap();
    let out = reconcile(track, &audio(3.5)).unwrap();
    let names: Vec<_> = out
        .track()
        .segments()
        .iter()
        .map(|s| s.clip.path.to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a", "b", "a", "b"]);
}

#[test]
fn zero_length_track_is_an_audio_sync_error() {
    assert!(matches!(loop_count(0.0, 5.0), Err(AudioSyncError::EmptyTrack)));
    assert!(matches!(
        loop_count(f64::NAN, 5.0),
        Err(AudioSyncError::EmptyTrack)
    ));
}

#[test]
fn reconciliation_is_deterministic() {
    let make = || {
        let track = BackgroundTrack::concat(vec![clip("a", 2.5), clip("b", 1.25)]).unwrap();
        reconcile(track, &audio(9.0)).unwrap()
    };
    assert_eq!(make().track(), make().track());
}

#[test]
fn silent_jobs_keep_the_natural_length() {
    let track = BackgroundTrack::concat(vec![clip("a", 2.5), clip("b", 1.5)]).unwrap();
    let out = without_narration(track);
    assert_eq!(out.loops(), 1);
    assert_eq!(out.duration_s(), 4.0);
    assert_eq!(out.track().segments().len(), 2);
}
