use super::*;

fn info(path: &str, w: u32, h: u32, d: f64) -> VideoSourceInfo {
    VideoSourceInfo {
        source_path: PathBuf::from(path),
        width: w,
        height: h,
        duration_s: d,
        frame_rate: Some(30.0),
        has_audio: true,
    }
}

fn fake_probe(path: &Path) -> Result<VideoSourceInfo, ClipLoadError> {
    match path.to_str().unwrap_or_default() {
        "landscape.mp4" => Ok(info("landscape.mp4", 1920, 1080, 8.0)),
        "portrait.mov" => Ok(info("portrait.mov", 720, 1280, 4.15)),
        "tiny.mp4" => Ok(info("tiny.mp4", 640, 480, 0.2)),
        "audio_only.mp4" => Ok(info("audio_only.mp4", 0, 0, 3.0)),
        _ => Err(ClipLoadError::Missing {
            path: path.to_path_buf(),
        }),
    }
}

fn paths(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

#[test]
fn landscape_cover_scales_by_height_with_overscan() {
    let g = CropGeometry::cover(1920, 1080, Canvas::PORTRAIT_1080, 1.05).unwrap();
    // 1920/1080 * 1.05 = 1.866..; height 1080 -> 2016, width 1920 -> 3584
    assert_eq!((g.scaled_w, g.scaled_h), (3584, 2016));
    assert_eq!((g.width, g.height), (1080, 1920));
    assert_eq!(g.crop_x, (3584 - 1080) / 2);
    assert_eq!(g.crop_y, (2016 - 1920) / 2);
}

#[test]
fn geometry_always_produces_the_canvas() {
    for (w, h) in [(1920, 1080), (1080, 1920), (720, 1280), (641, 479), (1, 1)] {
        let g = CropGeometry::cover(w, h, Canvas::PORTRAIT_1080, 1.05).unwrap();
        assert!(g.scaled_w >= g.width && g.scaled_h >= g.height, "{w}x{h}");
        assert!(g.crop_x + g.width <= g.scaled_w);
        assert!(g.crop_y + g.height <= g.scaled_h);
        assert_eq!(g.scaled_w % 2, 0);
        assert_eq!(g.scaled_h % 2, 0);
    }
}

#[test]
fn geometry_rejects_degenerate_input() {
    assert!(CropGeometry::cover(0, 1080, Canvas::PORTRAIT_1080, 1.05).is_err());
    assert!(CropGeometry::cover(1920, 1080, Canvas::PORTRAIT_1080, 0.5).is_err());
}

#[test]
fn filter_string_encodes_scale_and_crop() {
    let g = CropGeometry::cover(1080, 1920, Canvas::PORTRAIT_1080, 1.05).unwrap();
    assert_eq!(
        g.ffmpeg_filter(),
        format!(
            "scale={}:{}:flags=bicubic,crop=1080:1920:{}:{},setsar=1",
            g.scaled_w, g.scaled_h, g.crop_x, g.crop_y
        )
    );
}

#[test]
fn tail_trim_only_applies_to_longer_clips() {
    let opts = NormalizeOptions::default();
    assert!((opts.usable_duration(8.0) - 7.85).abs() < 1e-9);
    assert_eq!(opts.usable_duration(0.2), 0.2);
    assert_eq!(opts.usable_duration(0.1), 0.1);
}

#[test]
fn bad_clips_are_skipped_and_order_kept() {
    let out = normalize_clips_with(
        &paths(&["landscape.mp4", "missing.mp4", "audio_only.mp4", "portrait.mov"]),
        Canvas::PORTRAIT_1080,
        &NormalizeOptions::default(),
        &CancelToken::new(),
        fake_probe,
    )
    .unwrap();

    let names: Vec<_> = out.clips.iter().map(|c| c.path.clone()).collect();
    assert_eq!(names, paths(&["landscape.mp4", "portrait.mov"]));
    assert_eq!(out.skipped.len(), 2);
    assert!((out.total_duration_s() - 11.85).abs() < 1e-9);
}

#[test]
fn zero_usable_clips_is_fatal() {
    let err = normalize_clips_with(
        &paths(&["missing.mp4", "audio_only.mp4"]),
        Canvas::PORTRAIT_1080,
        &NormalizeOptions::default(),
        &CancelToken::new(),
        fake_probe,
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::NoUsableClips { attempted: 2 }));
    assert!(err.is_job_fatal());
}

#[test]
fn normalization_is_idempotent() {
    let input = paths(&["landscape.mp4", "tiny.mp4", "portrait.mov"]);
    let run = || {
        normalize_clips_with(
            &input,
            Canvas::PORTRAIT_1080,
            &NormalizeOptions::default(),
            &CancelToken::new(),
            fake_probe,
        )
        .unwrap()
    };
    let (a, b) = (run(), run());
    assert_eq!(a.clips, b.clips);
    for clip in &a.clips {
        assert_eq!(
            (clip.geometry.width, clip.geometry.height),
            (1080, 1920)
        );
    }
}

#[test]
fn cancellation_stops_between_clips() {
    let cancel = CancelToken::new();
    let mut seen = 0;
    let err = normalize_clips_with(
        &paths(&["landscape.mp4", "portrait.mov"]),
        Canvas::PORTRAIT_1080,
        &NormalizeOptions::default(),
        &cancel,
        |p: &Path| {
            seen += 1;
            cancel.cancel();
            fake_probe(p)
        },
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Cancelled));
    assert_eq!(seen, 1);
}
