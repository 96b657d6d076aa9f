use super::*;
use std::path::Path;

use crate::assets::media::{AudioPcm, MediaProbe, VideoSourceInfo};
use crate::config::{CaptionMode, EngineConfig, PathsConfig};
use crate::foundation::error::{AudioSyncError, ClipLoadError};
use crate::project::collab::PrerecordedNarration;

struct ShortClips;

impl MediaProbe for ShortClips {
    fn probe_video(&self, path: &Path) -> Result<VideoSourceInfo, ClipLoadError> {
        Ok(VideoSourceInfo {
            source_path: path.to_path_buf(),
            width: 1080,
            height: 1920,
            duration_s: 2.0,
            frame_rate: Some(30.0),
            has_audio: false,
        })
    }

    fn decode_narration(&self, _path: &Path, sample_rate: u32) -> Result<AudioPcm, AudioSyncError> {
        Ok(AudioPcm {
            sample_rate,
            channels: 2,
            interleaved_f32: vec![0.0; sample_rate as usize * 2 * 3],
        })
    }
}

fn watermark_config(root: &Path) -> EngineConfig {
    let mut cfg = EngineConfig {
        paths: PathsConfig {
            videos: root.join("videos"),
            result: root.join("result"),
            temp: root.join("temp"),
            logs: root.join("logs"),
        },
        system_fonts: false,
        ..EngineConfig::default()
    };
    cfg.render.caption_mode = CaptionMode::Watermark {
        text: "@reels".to_string(),
    };
    cfg
}

fn project(root: &Path, name: &str) -> ProjectInputs {
    let dir = root.join("videos").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("clip.mp4"), "not a video").unwrap();
    ProjectInputs::scan(&dir).unwrap()
}

#[test]
fn failing_jobs_are_reported_not_raised() {
    let root = tempfile::tempdir().unwrap();
    let ctx = JobContext::new(watermark_config(root.path())).unwrap();
    let projects = vec![project(root.path(), "one"), project(root.path(), "two")];

    let report = run_batch(
        &ctx,
        &projects,
        &BatchOptions {
            jobs: Some(2),
            ..BatchOptions::default()
        },
    )
    .unwrap();
    assert_eq!(report.total(), 2);
    assert!(report.succeeded.is_empty());
    let names: Vec<_> = report.failed.iter().map(|f| f.project.as_str()).collect();
    assert_eq!(names, ["one", "two"]);
    assert!(report.failed.iter().all(|f| !f.cancelled));
    assert!(report.failed[0].error.contains("no usable background clips"));

    for name in ["one", "two"] {
        let logs: Vec<_> = std::fs::read_dir(root.path().join("logs").join(name))
            .unwrap()
            .collect();
        assert_eq!(logs.len(), 1);
    }
}

#[test]
fn unknown_language_is_a_setup_error() {
    let root = tempfile::tempdir().unwrap();
    let mut cfg = watermark_config(root.path());
    cfg.render.caption_mode = CaptionMode::Words;
    let ctx = JobContext::new(cfg).unwrap();
    let opts = BatchOptions {
        language: Some("Klingon".to_string()),
        ..BatchOptions::default()
    };
    assert!(run_batch(&ctx, &[], &opts).is_err());
}

#[test]
fn cancelled_batch_marks_jobs_cancelled() {
    let root = tempfile::tempdir().unwrap();
    let ctx = JobContext::new(watermark_config(root.path())).unwrap();
    ctx.cancel.cancel();
    let projects = vec![project(root.path(), "one")];
    let report = run_batch(&ctx, &projects, &BatchOptions::default()).unwrap();
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].cancelled);
}

#[test]
fn plan_project_keeps_going_after_a_failing_language() {
    let root = tempfile::tempdir().unwrap();
    let mut cfg = watermark_config(root.path());
    cfg.render.caption_mode = CaptionMode::Words;
    let ctx = JobContext::new(cfg)
        .unwrap()
        .with_narration(PrerecordedNarration)
        .with_media(ShortClips);
    let cats = project(root.path(), "cats");
    std::fs::write(cats.dir.join("captions.txt"), "one two three\n").unwrap();
    std::fs::write(cats.dir.join("narration.fr.mp3"), "audio").unwrap();

    // Spanish has no narration file; French does.
    let variants = vec![
        ctx.variants(Some("es")).unwrap().remove(0),
        ctx.variants(Some("fr")).unwrap().remove(0),
    ];
    let report = plan_project(&ctx, &cats, &variants);

    assert_eq!(report.plans.len(), 1);
    assert_eq!(report.plans[0].variant, "French");
    assert_eq!(report.plans[0].words.len(), 3);
    assert_eq!(report.plans[0].track.loops(), 2);

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].project, "cats");
    assert_eq!(report.failed[0].variant, "Spanish");
    assert!(!report.failed[0].cancelled);
}
