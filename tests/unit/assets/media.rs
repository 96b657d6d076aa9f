use super::*;

#[test]
fn rationals_parse_like_ffprobe_reports_them() {
    assert_eq!(parse_rational("30/1"), Some(30.0));
    assert!((parse_rational("30000/1001").unwrap() - 29.97).abs() < 1e-2);
    assert_eq!(parse_rational("25"), Some(25.0));
    assert_eq!(parse_rational("0/0"), None);
    assert_eq!(parse_rational("abc"), None);
}

#[test]
fn pcm_duration_and_truncation() {
    let mut pcm = AudioPcm {
        sample_rate: 10,
        channels: 2,
        interleaved_f32: vec![0.0; 2 * 25],
    };
    assert_eq!(pcm.frames(), 25);
    assert!((pcm.duration_s() - 2.5).abs() < 1e-9);

    pcm.truncate_to_secs(1.0);
    assert_eq!(pcm.interleaved_f32.len(), 20);
    assert!((pcm.duration_s() - 1.0).abs() < 1e-9);

    // Truncating to a longer duration is a no-op.
    pcm.truncate_to_secs(5.0);
    assert_eq!(pcm.frames(), 10);
}

#[test]
fn missing_files_are_typed_errors() {
    let missing = Path::new("definitely/not/here.mp4");
    assert!(matches!(
        probe_video(missing),
        Err(ClipLoadError::Missing { .. })
    ));
    assert!(matches!(
        decode_audio_f32_stereo(missing, NARRATION_SAMPLE_RATE),
        Err(AudioSyncError::Missing { .. })
    ));
}

#[test]
fn pcm_f32le_file_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("a.f32le");
    write_pcm_f32le(&[1.0, -0.5], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(f32::from_le_bytes(bytes[4..8].try_into().unwrap()), -0.5);
}
